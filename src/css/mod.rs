//! CSS stylesheet model, parser and serializer.
//!
//! Unlike a rendering-oriented CSS parser, this one keeps everything a human
//! reviewer would want to see again: comments, rule order, the exact text of
//! selectors and values. It is strict about structure so that malformed input
//! is reported (with a position) instead of being silently skipped.

mod parsing;
pub mod selector;
mod to_css;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use selector::{ComplexSelector, SimpleSelector};
pub use to_css::ToCss;

/// A parsed stylesheet: an ordered list of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

/// A top-level item of a stylesheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `a, b { ... }`
    Style(StyleRule),
    /// `/* ... */` between rules. Holds the text between the markers.
    Comment(String),
    /// An at-rule, kept verbatim (including any block).
    AtRule(String),
}

/// A style rule with its selector alternatives and declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleRule {
    /// Comma-separated selector alternatives, trimmed, comments removed.
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// An item inside a rule block.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `name: value`. The value keeps any `!important` text.
    Property { name: String, value: String },
    /// `/* ... */` inside a block.
    Comment(String),
}

impl Declaration {
    pub fn property(name: impl Into<String>, value: impl Into<String>) -> Self {
        Declaration::Property {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Declaration::Comment(text.into())
    }

    /// Property name, or `None` for comments.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Property { name, .. } => Some(name),
            Declaration::Comment(_) => None,
        }
    }

    /// Property value, or `None` for comments.
    pub fn value(&self) -> Option<&str> {
        match self {
            Declaration::Property { value, .. } => Some(value),
            Declaration::Comment(_) => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Declaration::Comment(_))
    }
}

impl StyleRule {
    pub fn new(selectors: Vec<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selectors,
            declarations,
        }
    }

    /// First property declaration with the given name.
    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == Some(name))
    }

    /// Value of the first property declaration with the given name.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Declaration::value)
    }

    /// Selector alternatives parsed into their structured form.
    pub fn parsed_selectors(&self) -> Vec<ComplexSelector> {
        self.selectors
            .iter()
            .map(|s| ComplexSelector::parse(s))
            .collect()
    }

    /// Number of property declarations (comments excluded).
    pub fn property_count(&self) -> usize {
        self.declarations.iter().filter(|d| !d.is_comment()).count()
    }
}

impl Stylesheet {
    /// Parse a stylesheet, failing on the first structural error.
    pub fn parse(css: &str) -> Result<Self, ParseError> {
        parsing::parse_stylesheet(css)
    }

    /// Iterate over the style rules, skipping comments and at-rules.
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().filter_map(|r| match r {
            Rule::Style(rule) => Some(rule),
            _ => None,
        })
    }
}

/// A structural CSS error with its 1-based position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong. The messages match the ones legacy tooling reported, so
/// they can be compared against older logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("selector missing")]
    SelectorMissing,
    #[error("missing '{{'")]
    MissingOpenBrace,
    #[error("missing '}}'")]
    MissingCloseBrace,
    #[error("property missing ':'")]
    PropertyMissingColon,
    #[error("End of comment missing")]
    EndOfCommentMissing,
    #[error("unexpected '}}'")]
    UnexpectedCloseBrace,
    #[error("@{0} missing '}}'")]
    AtRuleMissingCloseBrace(String),
}
