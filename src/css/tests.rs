//! CSS parsing and serialization tests.

use super::{Declaration, ParseError, ParseErrorKind, Rule, StyleRule, Stylesheet, ToCss};

fn parse_err(css: &str) -> ParseError {
    Stylesheet::parse(css).expect_err("expected a parse error")
}

fn only_rule(sheet: &Stylesheet) -> &StyleRule {
    let rules: Vec<_> = sheet.style_rules().collect();
    assert_eq!(rules.len(), 1, "expected exactly one style rule");
    rules[0]
}

#[test]
fn test_parse_simple_stylesheet() {
    let css = r#"
        .marginBox.A5Portrait { left: 10mm; top: 5mm !important; }
        p { text-align: justify }
    "#;

    let sheet = Stylesheet::parse(css).unwrap();
    assert_eq!(sheet.rules.len(), 2);

    let rules: Vec<_> = sheet.style_rules().collect();
    assert_eq!(rules[0].selectors, vec![".marginBox.A5Portrait"]);
    assert_eq!(rules[0].value_of("left"), Some("10mm"));
    assert_eq!(rules[0].value_of("top"), Some("5mm !important"));
    assert_eq!(rules[1].value_of("text-align"), Some("justify"));
}

#[test]
fn test_selector_alternatives_are_split_and_trimmed() {
    let sheet = Stylesheet::parse(".a ,\r\n .b.c , div > p { color: red; }").unwrap();
    assert_eq!(only_rule(&sheet).selectors, vec![".a", ".b.c", "div > p"]);
}

#[test]
fn test_comments_are_kept_in_place() {
    let css = "/* head */\n.a { /* first */ color: red; /* after */ }\n/* tail */";
    let sheet = Stylesheet::parse(css).unwrap();

    assert_eq!(sheet.rules[0], Rule::Comment(" head ".to_string()));
    assert_eq!(sheet.rules[2], Rule::Comment(" tail ".to_string()));

    let rule = only_rule(&sheet);
    assert_eq!(
        rule.declarations,
        vec![
            Declaration::comment(" first "),
            Declaration::property("color", "red"),
            Declaration::comment(" after "),
        ]
    );
}

#[test]
fn test_comments_in_selectors_are_dropped() {
    let sheet = Stylesheet::parse(".a /* x */ .b { color: red }").unwrap();
    assert_eq!(only_rule(&sheet).selectors, vec![".a  .b"]);
}

#[test]
fn test_comment_markers_inside_selector_strings_are_kept() {
    let css = "a[title=\"/*\"] { color: red }";
    let sheet = Stylesheet::parse(css).unwrap();
    assert_eq!(only_rule(&sheet).selectors, vec!["a[title=\"/*\"]"]);

    let out = sheet.to_css_string();
    assert_eq!(out, "a[title=\"/*\"] {\n  color: red;\n}");
    assert_eq!(Stylesheet::parse(&out).unwrap(), sheet);
}

#[test]
fn test_at_rules_pass_through() {
    let css = "@import url(\"x.css\");\n@media print { .a { color: red; } }\n.b { color: blue }";
    let sheet = Stylesheet::parse(css).unwrap();
    assert_eq!(sheet.rules[0], Rule::AtRule("@import url(\"x.css\");".to_string()));
    assert_eq!(
        sheet.rules[1],
        Rule::AtRule("@media print { .a { color: red; } }".to_string())
    );
    assert_eq!(sheet.style_rules().count(), 1);
}

#[test]
fn test_value_with_url_and_semicolons() {
    let sheet =
        Stylesheet::parse(".a { background: url(data:image/png;base64,AAA); content: \"a;b\" }")
            .unwrap();
    let rule = only_rule(&sheet);
    assert_eq!(rule.value_of("background"), Some("url(data:image/png;base64,AAA)"));
    assert_eq!(rule.value_of("content"), Some("\"a;b\""));
}

#[test]
fn test_empty_input() {
    let sheet = Stylesheet::parse("  \r\n ").unwrap();
    assert!(sheet.rules.is_empty());
    assert_eq!(sheet.to_css_string(), "");
}

#[test]
fn test_error_selector_missing() {
    let err = parse_err(".a { color: red; }\n.b { x: 1 } { y: 2 }");
    assert_eq!(err.kind, ParseErrorKind::SelectorMissing);
    assert_eq!(err.line, 2);
    assert_eq!(err.to_string(), "2:13: selector missing");
}

#[test]
fn test_error_missing_close_brace() {
    let err = parse_err(".a { color: red;\n.b { color: blue; }");
    assert_eq!(err.kind, ParseErrorKind::MissingCloseBrace);
    assert_eq!((err.line, err.column), (2, 1));
    assert_eq!(err.to_string(), "2:1: missing '}'");
}

#[test]
fn test_error_missing_open_brace() {
    let err = parse_err(".a { color: red; }\r\n.");
    assert_eq!(err.kind, ParseErrorKind::MissingOpenBrace);
    assert_eq!(err.line, 2);
    assert_eq!(err.to_string(), "2:2: missing '{'");
}

#[test]
fn test_error_end_of_comment_missing() {
    let err = parse_err(".a { color: red; }\n/* abc");
    assert_eq!(err.kind, ParseErrorKind::EndOfCommentMissing);
    assert_eq!((err.line, err.column), (2, 1));
    assert_eq!(err.to_string(), "2:1: End of comment missing");
}

#[test]
fn test_error_property_missing_colon() {
    let err = parse_err(".a { color red; }");
    assert_eq!(err.kind, ParseErrorKind::PropertyMissingColon);
}

#[test]
fn test_error_stray_close_brace() {
    let err = parse_err(".a { color: red; } }");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedCloseBrace);
}

#[test]
fn test_error_unbalanced_at_rule() {
    let err = parse_err("@media print { .a { color: red; }");
    assert_eq!(
        err.kind,
        ParseErrorKind::AtRuleMissingCloseBrace("media".to_string())
    );
    assert_eq!(err.to_string(), "1:1: @media missing '}'");
}

#[test]
fn test_serialize_layout() {
    let sheet = Stylesheet {
        rules: vec![
            Rule::Comment(" note ".to_string()),
            Rule::Style(StyleRule::new(
                vec![".a".to_string(), ".b".to_string()],
                vec![
                    Declaration::comment(" left: NOT MIGRATED "),
                    Declaration::property("left", "1mm"),
                ],
            )),
        ],
    };

    assert_eq!(
        sheet.to_css_string(),
        "/* note */\n\n.a,\n.b {\n  /* left: NOT MIGRATED */\n  left: 1mm;\n}"
    );
}

#[test]
fn test_serialized_output_reparses_to_same_tree() {
    let css = "/*x*/ .a,.b{color:red;/*c*/margin : 0 auto !important} @media print{.c{d:e}} .e{}";
    let sheet = Stylesheet::parse(css).unwrap();
    let again = Stylesheet::parse(&sheet.to_css_string()).unwrap();
    assert_eq!(sheet, again);
}
