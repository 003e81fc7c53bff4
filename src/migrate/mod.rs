//! Migration of legacy `.marginBox` geometry to page margin variables.
//!
//! Books used to position their margin box absolutely with `left`, `top`,
//! `width` and `height`. The page layout now exposes margins as custom
//! properties (`--page-margin-*`, `--cover-margin-*`) set on the page. This
//! module rewrites the old rules into the new form:
//!
//! 1. parse, applying one repair for known corruption ([`recovery`]);
//! 2. classify each rule and split margin-box rules into geometry and the
//!    rest ([`classify`]);
//! 3. compute and rename the margins ([`geometry`]).
//!
//! The output is a draft for a person to review. Anything that could not be
//! migrated is marked with a `NOT MIGRATED` comment.

pub mod classify;
pub mod config;
pub mod geometry;
pub mod recovery;

use log::{debug, warn};

use crate::css::{ParseError, Rule, StyleRule, Stylesheet, ToCss};

use classify::{Classification, annotate, classify, hides_secondary_cover_title, split};
pub use config::{MigrationConfig, PageSize, PropertyMap};
pub use recovery::Repair;

/// The result of migrating one stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    /// The rewritten stylesheet, or the input unchanged if it could not be
    /// parsed.
    pub css: String,
    /// The stylesheet hides the cover title in a secondary language, a
    /// setting the new layout controls elsewhere.
    pub hide_secondary_cover_title: bool,
    pub report: MigrationReport,
}

/// What happened during a migration, for logs and change notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub repair: Option<Repair>,
    /// Set when the input could not be parsed even after repair.
    pub parse_error: Option<ParseError>,
    /// Margin-box rules rewritten to margin variables.
    pub migrated_rules: usize,
    /// Migrated rules whose non-geometry declarations were split off.
    pub split_rules: usize,
    /// Margin-box rules left in place for lack of a page size, `left` or `top`.
    pub unmigrated_rules: usize,
    /// Properties marked NOT MIGRATED, in output order.
    pub not_migrated: Vec<String>,
    /// Geometry values replaced by an error placeholder.
    pub value_errors: usize,
}

impl MigrationReport {
    /// Whether the stylesheet was parsed and rewritten.
    pub fn is_migrated(&self) -> bool {
        self.parse_error.is_none()
    }

    /// Whether the output needs more than a glance: anything left
    /// unmigrated, flagged or uncomputable.
    pub fn needs_review(&self) -> bool {
        self.parse_error.is_some()
            || self.unmigrated_rules > 0
            || !self.not_migrated.is_empty()
            || self.value_errors > 0
    }
}

/// Migrate one stylesheet.
///
/// Never fails: input that cannot be parsed comes back unchanged, with the
/// error in [`MigrationReport::parse_error`].
pub fn migrate(css: &str, config: &MigrationConfig) -> Migration {
    let recovered = match recovery::parse_with_recovery(css) {
        Ok(recovered) => recovered,
        Err(error) => {
            warn!("leaving stylesheet unchanged, cannot parse: {error}");
            return Migration {
                css: css.to_string(),
                hide_secondary_cover_title: false,
                report: MigrationReport {
                    parse_error: Some(error),
                    ..Default::default()
                },
            };
        }
    };

    let mut report = MigrationReport {
        repair: recovered.repair,
        ..Default::default()
    };
    let (stylesheet, hide_secondary_cover_title) =
        migrate_stylesheet(recovered.stylesheet, config, &mut report);

    Migration {
        css: stylesheet.to_css_string(),
        hide_secondary_cover_title,
        report,
    }
}

/// Migrate an already parsed stylesheet. Returns the new stylesheet and
/// whether it hides the secondary cover title.
pub fn migrate_stylesheet(
    stylesheet: Stylesheet,
    config: &MigrationConfig,
    report: &mut MigrationReport,
) -> (Stylesheet, bool) {
    let mut hide_secondary_cover_title = false;
    let mut rules = Vec::with_capacity(stylesheet.rules.len());

    for rule in stylesheet.rules {
        let Rule::Style(rule) = rule else {
            rules.push(rule);
            continue;
        };
        hide_secondary_cover_title |= hides_secondary_cover_title(&rule);

        match classify(&rule, config) {
            Classification::Unrelated => rules.push(Rule::Style(rule)),
            Classification::MissingContext(missing) => {
                debug!("not migrating {}: {}", rule.selectors.join(", "), missing.describe());
                report.unmigrated_rules += 1;
                let declarations = annotate(rule.declarations, &mut report.not_migrated);
                rules.push(Rule::Style(StyleRule::new(rule.selectors, declarations)));
            }
            Classification::Migratable { page_size } => {
                let (positioning, other) = split(rule);
                rules.push(Rule::Style(geometry::rewrite(
                    positioning,
                    page_size,
                    config,
                    report,
                )));
                report.migrated_rules += 1;

                if let Some(other) = other {
                    let selectors = classify::normalize_selectors(&other.selectors);
                    debug!("split off {} properties for {}", other.property_count(), selectors.join(", "));
                    let declarations = annotate(other.declarations, &mut report.not_migrated);
                    rules.push(Rule::Style(StyleRule::new(selectors, declarations)));
                    report.split_rules += 1;
                }
            }
        }
    }

    (Stylesheet { rules }, hide_secondary_cover_title)
}
