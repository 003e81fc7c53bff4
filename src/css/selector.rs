//! Structured view of selector text.
//!
//! Selectors are stored as strings on [`super::StyleRule`]; this module
//! tokenizes one alternative with `cssparser` into compound selectors so that
//! class membership and class removal work on whole class names rather than
//! substrings (`.marginBoxOuter` is not `.marginBox`).
//!
//! Only classes and attributes are interpreted. Everything else (type and id
//! selectors, pseudo-classes, functions) is carried as source text.

use std::fmt;

use cssparser::{ParseError, Parser, ParserInput, Token, serialize_identifier};

/// One simple selector inside a compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// `.name` (unescaped name)
    Class(String),
    /// `[name]`, `[name=value]`, ...
    Attribute {
        name: String,
        has_value: bool,
        raw: String,
    },
    /// Anything else, as written.
    Other(String),
}

/// A run of simple selectors with no combinator between them, plus the
/// combinator (as written, whitespace included) that precedes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub combinator: Option<String>,
    pub simples: Vec<SimpleSelector>,
}

/// A single selector alternative: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: Vec<Compound>,
}

impl ComplexSelector {
    /// Tokenize one selector alternative. Never fails: unrecognized input is
    /// kept as [`SimpleSelector::Other`].
    pub fn parse(text: &str) -> Self {
        let mut input = ParserInput::new(text.trim());
        let mut parser = Parser::new(&mut input);
        let mut compounds = vec![Compound::default()];
        let mut pending: Option<String> = None;

        loop {
            let start = parser.position();
            let token = match parser.next_including_whitespace() {
                Ok(t) => t.clone(),
                Err(_) => break,
            };

            match token {
                Token::WhiteSpace(ws) => {
                    pending.get_or_insert_with(String::new).push_str(ws);
                    continue;
                }
                Token::Delim(c @ ('>' | '+' | '~')) => {
                    pending.get_or_insert_with(String::new).push(c);
                    continue;
                }
                _ => {}
            }

            if let Some(combinator) = pending.take() {
                compounds.push(Compound {
                    combinator: Some(combinator),
                    simples: Vec::new(),
                });
            }

            let simple = match token {
                Token::Delim('.') => {
                    let name = match parser.next_including_whitespace() {
                        Ok(Token::Ident(name)) => Some(name.to_string()),
                        _ => None,
                    };
                    match name {
                        Some(name) => SimpleSelector::Class(name),
                        None => SimpleSelector::Other(parser.slice_from(start).to_string()),
                    }
                }
                Token::SquareBracketBlock => {
                    skip_block(&mut parser);
                    let raw = parser.slice_from(start);
                    let inner = raw.trim_start_matches('[').trim_end_matches(']').trim();
                    let name: String = inner
                        .chars()
                        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
                        .collect();
                    SimpleSelector::Attribute {
                        name,
                        has_value: inner.contains('='),
                        raw: raw.to_string(),
                    }
                }
                Token::Function(_) | Token::ParenthesisBlock => {
                    skip_block(&mut parser);
                    SimpleSelector::Other(parser.slice_from(start).to_string())
                }
                Token::Colon => {
                    skip_pseudo(&mut parser);
                    SimpleSelector::Other(parser.slice_from(start).to_string())
                }
                _ => SimpleSelector::Other(parser.slice_from(start).to_string()),
            };

            if let Some(last) = compounds.last_mut() {
                last.simples.push(simple);
            }
        }

        // Only a dangling `>`/`+`/`~` is worth keeping; trailing whitespace is not.
        if let Some(combinator) = pending
            && !combinator.trim().is_empty()
        {
            compounds.push(Compound {
                combinator: Some(combinator),
                simples: Vec::new(),
            });
        }

        Self { compounds }
    }

    /// All class names, in source order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.compounds
            .iter()
            .flat_map(|c| &c.simples)
            .filter_map(|s| match s {
                SimpleSelector::Class(name) => Some(name.as_str()),
                _ => None,
            })
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }

    /// Whether one compound has both the class and a valued attribute
    /// `attribute`, e.g. `.Title-On-Cover-style[lang="fr"]`.
    pub fn has_class_with_attribute(&self, class: &str, attribute: &str) -> bool {
        self.compounds.iter().any(|compound| {
            let has_class = compound
                .simples
                .iter()
                .any(|s| matches!(s, SimpleSelector::Class(c) if c == class));
            let has_attribute = compound.simples.iter().any(|s| {
                matches!(s, SimpleSelector::Attribute { name, has_value: true, .. }
                    if name.eq_ignore_ascii_case(attribute))
            });
            has_class && has_attribute
        })
    }

    /// This selector without any `.name` class. Compounds that consisted of
    /// nothing but that class disappear along with their combinator. Returns
    /// `None` when nothing is left.
    pub fn without_class(&self, name: &str) -> Option<Self> {
        let mut compounds: Vec<Compound> = Vec::with_capacity(self.compounds.len());
        let mut dropped_first = false;

        for (i, compound) in self.compounds.iter().enumerate() {
            let simples: Vec<SimpleSelector> = compound
                .simples
                .iter()
                .filter(|s| !matches!(s, SimpleSelector::Class(c) if c == name))
                .cloned()
                .collect();
            if simples.is_empty() && !compound.simples.is_empty() {
                dropped_first |= i == 0;
                continue;
            }
            compounds.push(Compound {
                combinator: compound.combinator.clone(),
                simples,
            });
        }

        if compounds.iter().all(|c| c.simples.is_empty()) {
            return None;
        }
        if dropped_first && let Some(first) = compounds.first_mut() {
            first.combinator = None;
        }
        Some(Self { compounds })
    }

    /// Whether this is a single compound made only of plain class names
    /// (`.a.b-c.D9`), the first starting with a letter.
    pub fn is_class_list(&self) -> bool {
        let [compound] = self.compounds.as_slice() else {
            return false;
        };
        if compound.combinator.is_some() || compound.simples.is_empty() {
            return false;
        }
        compound.simples.iter().enumerate().all(|(i, s)| match s {
            SimpleSelector::Class(name) => {
                let first_ok = i > 0 || name.starts_with(|c: char| c.is_ascii_alphabetic());
                first_ok
                    && !name.is_empty()
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            _ => false,
        })
    }

    /// The class-list form with classes sorted, or `None` if this selector
    /// is anything more than a class list.
    pub fn sorted_class_list(&self) -> Option<String> {
        if !self.is_class_list() {
            return None;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.sort_unstable();
        let mut out = String::new();
        for class in classes {
            out.push('.');
            out.push_str(class);
        }
        Some(out)
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for compound in &self.compounds {
            if let Some(combinator) = &compound.combinator {
                f.write_str(combinator)?;
            }
            for simple in &compound.simples {
                match simple {
                    SimpleSelector::Class(name) => {
                        f.write_str(".")?;
                        serialize_identifier(name, f)?;
                    }
                    SimpleSelector::Attribute { raw, .. } | SimpleSelector::Other(raw) => {
                        f.write_str(raw)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Sort the classes of a pure class-list selector; leave anything else alone.
pub fn normalize(selector: &str) -> String {
    ComplexSelector::parse(selector)
        .sorted_class_list()
        .unwrap_or_else(|| selector.trim().to_string())
}

/// Split a selector list on its top-level commas. Commas inside strings,
/// brackets and functions do not split. Empty alternatives are dropped.
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut start = parser.position();

    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };
        if token == Token::Comma {
            parts.push(parser.slice(start..before).trim().to_string());
            start = parser.position();
        }
    }
    parts.push(parser.slice_from(start).trim().to_string());

    parts.retain(|p| !p.is_empty());
    parts
}

/// Consume the contents of the block whose opening token was just returned.
fn skip_block<'i>(parser: &mut Parser<'i, '_>) {
    let _ = parser.parse_nested_block(|block| -> Result<(), ParseError<'i, ()>> {
        while block.next_including_whitespace_and_comments().is_ok() {}
        Ok(())
    });
}

/// Consume the rest of a pseudo-class or pseudo-element after its first `:`.
fn skip_pseudo(parser: &mut Parser<'_, '_>) {
    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => return,
        };
        match token {
            Token::Colon => continue,
            Token::Function(_) => {
                skip_block(parser);
                return;
            }
            _ => return,
        }
    }
}
