//! CSS serialization.
//!
//! Output layout: rules separated by a blank line, one declaration per line
//! indented by two spaces, selector alternatives one per line.

use std::fmt::Write;

use super::{Declaration, Rule, StyleRule, Stylesheet};

/// Serialize a node back to CSS text.
pub trait ToCss {
    /// Write this value as CSS to the buffer.
    fn to_css(&self, buf: &mut String);

    /// Convert to a CSS string (convenience method).
    fn to_css_string(&self) -> String {
        let mut buf = String::new();
        self.to_css(&mut buf);
        buf
    }
}

impl ToCss for Stylesheet {
    fn to_css(&self, buf: &mut String) {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                buf.push_str("\n\n");
            }
            rule.to_css(buf);
        }
    }
}

impl ToCss for Rule {
    fn to_css(&self, buf: &mut String) {
        match self {
            Rule::Style(rule) => rule.to_css(buf),
            Rule::Comment(text) => write!(buf, "/*{text}*/").unwrap(),
            Rule::AtRule(raw) => buf.push_str(raw),
        }
    }
}

impl ToCss for StyleRule {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(&self.selectors.join(",\n"));
        buf.push_str(" {\n");
        for declaration in &self.declarations {
            buf.push_str("  ");
            declaration.to_css(buf);
            buf.push('\n');
        }
        buf.push('}');
    }
}

impl ToCss for Declaration {
    fn to_css(&self, buf: &mut String) {
        match self {
            Declaration::Property { name, value } => write!(buf, "{name}: {value};").unwrap(),
            Declaration::Comment(text) => write!(buf, "/*{text}*/").unwrap(),
        }
    }
}
