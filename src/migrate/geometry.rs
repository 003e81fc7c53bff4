//! Turning absolute box geometry into margin variables.
//!
//! With the page size known, `left` and `top` already are the left and top
//! margins. Width and height become the remaining space on the right and at
//! the bottom:
//!
//! ```text
//! right  = page width  - width  - left
//! bottom = page height - height - top
//! ```

use cssparser::{Parser, ParserInput, Token};
use log::{debug, warn};

use crate::css::{Declaration, StyleRule};

use super::MigrationReport;
use super::classify::{normalize_selectors, strip_margin_box};
use super::config::{Geometry, MigrationConfig, PageSize, variable_rank};

/// Computed margins smaller than this (in mm) are written as zero.
pub const SNAP_MM: f64 = 0.05;

/// The leading number of a CSS value, ignoring any unit: `10mm` → 10,
/// `-2.5px` → -2.5. `None` when the value does not start with a number.
pub fn leading_number(value: &str) -> Option<f64> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let token = parser.next().ok()?.clone();

    let (fallback, unit_len) = match &token {
        Token::Number { value: v, .. } => (*v, 0),
        Token::Dimension { value: v, unit, .. } => (*v, unit.len()),
        Token::Percentage { unit_value, .. } => (*unit_value * 100.0, 1),
        _ => return None,
    };

    // Re-read the digits from the source so values keep full f64 precision.
    let raw = value.trim_start();
    let end = raw
        .find(|c: char| c.is_whitespace() || c == '!' || c == ',' || c == '/')
        .unwrap_or(raw.len());
    let digits = raw[..end].get(..end.saturating_sub(unit_len));
    Some(
        digits
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(f64::from(fallback)),
    )
}

/// Format a margin in millimetres with one decimal, snapping values that
/// are too small to matter to zero.
///
/// The value is rounded once, from its exact binary expansion, so `0.15`
/// (stored as 0.1499…) gives `0.1mm`. Exact ties (`x.25`, `x.75`) round away
/// from zero, where `{:.1}` alone would round them to even.
pub fn format_mm(value: f64) -> String {
    let value = if value.abs() < SNAP_MM { 0.0 } else { value };
    let quarters = value * 4.0;
    let value = if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        (value * 10.0).round() / 10.0
    } else {
        value
    };
    format!("{value:.1}mm")
}

/// Remove the first `!important` from a value.
fn strip_important(value: &str) -> String {
    value.replacen("!important", "", 1).trim().to_string()
}

/// The value written when a margin cannot be computed: `ignore` (invalid for
/// a length, so the variable falls back to its default) followed by the
/// original geometry for whoever picks this up.
fn error_placeholder(original: &[Declaration]) -> String {
    let listed = original
        .iter()
        .filter_map(|d| Some(format!("{}: {}", d.name()?, d.value()?)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("ignore /* error: {} */", listed.replace("*/", "* /"))
}

/// Rewrite the geometry half of a split margin-box rule.
///
/// Selectors lose `.marginBox` and get their classes sorted. Properties are
/// renamed to the page or cover variables and ordered top, bottom, left,
/// right.
pub fn rewrite(
    rule: StyleRule,
    page_size: &PageSize,
    config: &MigrationConfig,
    report: &mut MigrationReport,
) -> StyleRule {
    let selectors = normalize_selectors(&strip_margin_box(&rule.selectors));
    let cover = rule
        .parsed_selectors()
        .iter()
        .any(|s| s.classes().any(|class| class.contains("Cover")));
    let map = config.property_map(cover);

    let left = rule.value_of("left").and_then(leading_number);
    let top = rule.value_of("top").and_then(leading_number);

    let mut declarations: Vec<Declaration> = rule
        .declarations
        .iter()
        .map(|declaration| {
            let Declaration::Property { name, value } = declaration else {
                return declaration.clone();
            };
            let Some(geometry) = Geometry::from_property(name) else {
                return declaration.clone();
            };

            let value = match compute(geometry, value, left, top, page_size) {
                Some(value) => value,
                None => {
                    warn!(
                        "cannot compute {name} for {}: {name}: {value}",
                        rule.selectors.join(", ")
                    );
                    report.value_errors += 1;
                    error_placeholder(&rule.declarations)
                }
            };
            Declaration::property(map.get(geometry), strip_important(&value))
        })
        .collect();

    declarations.sort_by_key(|d| d.name().map_or(usize::MAX, variable_rank));
    debug!(
        "migrated {} on {} ({})",
        selectors.join(", "),
        page_size.name,
        if cover { "cover" } else { "page" }
    );

    StyleRule::new(selectors, declarations)
}

/// The new value for one geometry property, or `None` when one of the
/// numbers it depends on is missing.
fn compute(
    geometry: Geometry,
    value: &str,
    left: Option<f64>,
    top: Option<f64>,
    page_size: &PageSize,
) -> Option<String> {
    let number = leading_number(value)?;
    let (left, top) = (left?, top?);
    Some(match geometry {
        Geometry::Left | Geometry::Top => value.to_string(),
        Geometry::Width => format_mm(page_size.width_mm - number - left),
        Geometry::Height => format_mm(page_size.height_mm - number - top),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;

    fn a5() -> PageSize {
        PageSize::new("A5Portrait", 210.0, 148.0)
    }

    fn rewrite_css(css: &str) -> (StyleRule, MigrationReport) {
        let rule = Stylesheet::parse(css)
            .unwrap()
            .style_rules()
            .next()
            .cloned()
            .unwrap();
        let mut report = MigrationReport::default();
        let rule = rewrite(rule, &a5(), &MigrationConfig::default(), &mut report);
        (rule, report)
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("10mm"), Some(10.0));
        assert_eq!(leading_number(" -2.5px !important"), Some(-2.5));
        assert_eq!(leading_number("12"), Some(12.0));
        assert_eq!(leading_number("+.5mm"), Some(0.5));
        assert_eq!(leading_number("50%"), Some(50.0));
        assert_eq!(leading_number("177.77777778mm"), Some(177.777_777_78));
        assert_eq!(leading_number("auto"), None);
        assert_eq!(leading_number("calc(1mm + 2mm)"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_format_mm() {
        assert_eq!(format_mm(18.0), "18.0mm");
        assert_eq!(format_mm(15.04), "15.0mm");
        assert_eq!(format_mm(0.03), "0.0mm");
        assert_eq!(format_mm(-0.03), "0.0mm");
        assert_eq!(format_mm(-0.049_999), "0.0mm");
        assert_eq!(format_mm(-0.05), "-0.1mm");
        assert_eq!(format_mm(2.25), "2.3mm");
        assert_eq!(format_mm(-2.25), "-2.3mm");
        assert_eq!(format_mm(1.75), "1.8mm");
    }

    #[test]
    fn test_format_mm_rounds_once() {
        assert_eq!(format_mm(0.15), "0.1mm");
        assert_eq!(format_mm(1.45), "1.4mm");
        assert_eq!(format_mm(2.35), "2.4mm");
        assert_eq!(format_mm(-0.15), "-0.1mm");
    }

    #[test]
    fn test_rewrite_a5_page() {
        let (rule, report) = rewrite_css(
            ".marginBox.A5Portrait { left: 15mm; top: 10mm; width: 115mm; height: 182mm }",
        );
        assert_eq!(rule.selectors, vec![".A5Portrait"]);
        assert_eq!(
            rule.declarations,
            vec![
                Declaration::property("--page-margin-top", "10mm"),
                Declaration::property("--page-margin-bottom", "18.0mm"),
                Declaration::property("--page-margin-left", "15mm"),
                Declaration::property("--page-margin-right", "18.0mm"),
            ]
        );
        assert_eq!(report.value_errors, 0);
    }

    #[test]
    fn test_rewrite_cover_uses_cover_variables() {
        let (rule, _) = rewrite_css(
            ".outsideFrontCover.A5Portrait .marginBox { left: 15mm; top: 10mm !important; height: 185mm }",
        );
        assert_eq!(rule.selectors, vec![".outsideFrontCover.A5Portrait"]);
        assert_eq!(
            rule.declarations,
            vec![
                Declaration::property("--cover-margin-top", "10mm"),
                Declaration::property("--cover-margin-bottom", "15.0mm"),
                Declaration::property("--page-margin-left", "15mm"),
            ]
        );
    }

    #[test]
    fn test_rewrite_sorts_classes() {
        let (rule, _) = rewrite_css(".marginBox.bloom-page.A5Portrait { left: 1mm; top: 1mm }");
        assert_eq!(rule.selectors, vec![".A5Portrait.bloom-page"]);
    }

    #[test]
    fn test_rewrite_snaps_tiny_margins() {
        let (rule, _) = rewrite_css(".marginBox.A5Portrait { left: 10mm; top: 0mm; width: 138.03mm }");
        assert_eq!(rule.value_of("--page-margin-right"), Some("0.0mm"));
    }

    #[test]
    fn test_rewrite_unparseable_value_gets_placeholder() {
        let (rule, report) =
            rewrite_css(".marginBox.A5Portrait { left: 10mm; top: 5mm; width: auto }");
        assert_eq!(
            rule.value_of("--page-margin-right"),
            Some("ignore /* error: left: 10mm, top: 5mm, width: auto */")
        );
        assert_eq!(report.value_errors, 1);
    }

    #[test]
    fn test_rewrite_non_numeric_left_spoils_every_value() {
        let (rule, report) =
            rewrite_css(".marginBox.A5Portrait { left: auto; top: 5mm; height: 100mm }");
        assert!(rule.value_of("--page-margin-left").unwrap().starts_with("ignore /* error: left: auto"));
        assert!(rule.value_of("--page-margin-top").unwrap().starts_with("ignore"));
        assert!(rule.value_of("--page-margin-bottom").unwrap().starts_with("ignore"));
        assert_eq!(report.value_errors, 3);
    }
}
