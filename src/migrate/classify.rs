//! Deciding what to do with each style rule, and splitting margin-box rules
//! into their geometry and everything else.

use crate::css::{ComplexSelector, Declaration, StyleRule, selector};

use super::config::{Geometry, MigrationConfig, PageSize};

/// The legacy class whose absolute geometry is being migrated.
pub const MARGIN_BOX: &str = "marginBox";

const COVER_TITLE_CLASS: &str = "Title-On-Cover-style";

/// How a style rule takes part in the migration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'c> {
    /// No `.marginBox` in any selector; left exactly as is.
    Unrelated,
    /// A `.marginBox` rule that lacks what the new margins are computed from.
    MissingContext(Missing),
    /// A `.marginBox` rule with a known page size and both `left` and `top`.
    Migratable { page_size: &'c PageSize },
}

/// What a margin-box rule was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    PageSize,
    Left,
    Top,
}

impl Missing {
    pub fn describe(self) -> &'static str {
        match self {
            Missing::PageSize => "no known page size class",
            Missing::Left => "no left value",
            Missing::Top => "no top value",
        }
    }
}

pub fn classify<'c>(rule: &StyleRule, config: &'c MigrationConfig) -> Classification<'c> {
    let selectors = rule.parsed_selectors();
    if !selectors.iter().any(|s| s.has_class(MARGIN_BOX)) {
        return Classification::Unrelated;
    }

    let page_size = config
        .page_sizes
        .iter()
        .find(|size| selectors.iter().any(|s| s.has_class(&size.name)));
    let Some(page_size) = page_size else {
        return Classification::MissingContext(Missing::PageSize);
    };

    let present = |name: &str| rule.value_of(name).is_some_and(|v| !v.is_empty());
    if !present("left") {
        return Classification::MissingContext(Missing::Left);
    }
    if !present("top") {
        return Classification::MissingContext(Missing::Top);
    }

    Classification::Migratable { page_size }
}

/// Whether the rule hides the secondary-language title on the cover:
/// `.Title-On-Cover-style[lang=...] { display: none }`.
pub fn hides_secondary_cover_title(rule: &StyleRule) -> bool {
    let hides = rule
        .declarations
        .iter()
        .any(|d| d.name() == Some("display") && d.value() == Some("none"));
    hides
        && rule
            .parsed_selectors()
            .iter()
            .any(|s| s.has_class_with_attribute(COVER_TITLE_CLASS, "lang"))
}

/// Properties on a margin box that the variable system does not take over
/// and that will likely fight with it.
pub fn needs_review(name: &str) -> bool {
    matches!(name, "bottom" | "right" | "margin" | "padding")
        || name.contains("margin-")
        || name.contains("padding-")
}

/// The comment placed before a property left for a person to migrate.
pub fn not_migrated_comment(name: &str) -> Declaration {
    Declaration::comment(format!(" {name}: NOT MIGRATED "))
}

/// Insert a NOT MIGRATED comment before every property that needs review,
/// recording the property names in `notes`. A property already preceded by
/// its comment is not annotated again.
pub fn annotate(declarations: Vec<Declaration>, notes: &mut Vec<String>) -> Vec<Declaration> {
    let mut out: Vec<Declaration> = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        if let Some(name) = declaration.name()
            && needs_review(name)
        {
            let comment = not_migrated_comment(name);
            if out.last() != Some(&comment) {
                notes.push(name.to_string());
                out.push(comment);
            }
        }
        out.push(declaration);
    }
    out
}

/// Split a margin-box rule into its geometry declarations and the rest.
///
/// Both parts keep the original selectors and relative order; the second is
/// `None` when there is nothing besides geometry.
pub fn split(rule: StyleRule) -> (StyleRule, Option<StyleRule>) {
    let StyleRule {
        selectors,
        declarations,
    } = rule;
    let (geometry, other): (Vec<_>, Vec<_>) = declarations
        .into_iter()
        .partition(|d| d.name().and_then(Geometry::from_property).is_some());

    let other = (!other.is_empty()).then(|| StyleRule::new(selectors.clone(), other));
    (StyleRule::new(selectors, geometry), other)
}

/// Sort the classes of every pure class-list selector alternative.
pub fn normalize_selectors(selectors: &[String]) -> Vec<String> {
    selectors.iter().map(|s| selector::normalize(s)).collect()
}

/// Remove `.marginBox` from every alternative, dropping alternatives that
/// consisted of nothing else.
pub fn strip_margin_box(selectors: &[String]) -> Vec<String> {
    selectors
        .iter()
        .filter_map(|s| ComplexSelector::parse(s).without_class(MARGIN_BOX))
        .map(|s| s.to_string())
        .collect()
}
