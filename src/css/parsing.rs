//! Stylesheet parser.
//!
//! A small hand-written recursive descent over the source text. Selector
//! lists are handed to [`super::selector`], which tokenizes them with
//! `cssparser`; everything else is scanned here so that comments, exact
//! value text and line/column positions survive.

use std::borrow::Cow;

use memchr::memmem;

use super::selector::split_selector_list;
use super::{Declaration, ParseError, ParseErrorKind, Rule, StyleRule, Stylesheet};

/// Parse a complete stylesheet.
pub(crate) fn parse_stylesheet(css: &str) -> Result<Stylesheet, ParseError> {
    let mut cursor = Cursor::new(css);
    let mut rules = Vec::new();

    cursor.comments(&mut rules, Rule::Comment)?;
    while let Some(c) = cursor.peek() {
        let rule = match c {
            '}' => return Err(cursor.error(ParseErrorKind::UnexpectedCloseBrace)),
            '@' => Rule::AtRule(cursor.at_rule()?),
            _ => Rule::Style(cursor.style_rule()?),
        };
        rules.push(rule);
        cursor.comments(&mut rules, Rule::Comment)?;
    }

    Ok(Stylesheet { rules })
}

/// Source position tracker.
///
/// Lines end at `\r\n`, `\n` or a lone `\r`; columns count characters.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    after_cr: bool,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            after_cr: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            kind,
        }
    }

    /// Consume `len` bytes, updating the line and column.
    fn advance(&mut self, len: usize) {
        for c in self.src[self.pos..self.pos + len].chars() {
            match c {
                '\n' if self.after_cr => {}
                '\r' | '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
            self.after_cr = c == '\r';
        }
        self.pos += len;
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.advance(rest.len() - rest.trim_start().len());
    }

    /// Collect any comments (and the whitespace around them) into `out`.
    fn comments<T>(
        &mut self,
        out: &mut Vec<T>,
        wrap: impl Fn(String) -> T,
    ) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if !rest.starts_with("/*") {
                return Ok(());
            }
            let Some(end) = memmem::find(&rest.as_bytes()[2..], b"*/") else {
                return Err(self.error(ParseErrorKind::EndOfCommentMissing));
            };
            out.push(wrap(rest[2..2 + end].to_string()));
            self.advance(end + 4);
        }
    }

    /// An at-rule up to its terminating `;` or the end of its block.
    fn at_rule(&mut self) -> Result<String, ParseError> {
        let rest = self.rest();
        let name: String = rest[1..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        let bytes = rest.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;
        let mut end = None;
        while i < bytes.len() {
            match bytes[i] {
                b'"' | b'\'' => {
                    i = quoted_end(bytes, i).unwrap_or(i + 1);
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = comment_end(bytes, i).unwrap_or(bytes.len());
                    continue;
                }
                b'{' => depth += 1,
                b'}' if depth == 0 => break,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i + 1);
                        break;
                    }
                }
                b';' if depth == 0 => {
                    end = Some(i + 1);
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        let Some(end) = end else {
            return Err(self.error(ParseErrorKind::AtRuleMissingCloseBrace(name)));
        };
        let raw = rest[..end].to_string();
        self.advance(end);
        Ok(raw)
    }

    fn style_rule(&mut self) -> Result<StyleRule, ParseError> {
        let selector_missing = self.error(ParseErrorKind::SelectorMissing);
        let rest = self.rest();
        let len = selector_len(rest.as_bytes());
        let raw = &rest[..len];
        self.advance(len);

        let text = strip_comments(raw);
        let text = text.trim();
        if text.is_empty() {
            return Err(selector_missing);
        }
        let selectors = split_selector_list(text);

        if self.peek() != Some('{') {
            return Err(self.error(ParseErrorKind::MissingOpenBrace));
        }
        self.advance(1);

        let mut declarations = Vec::new();
        self.comments(&mut declarations, Declaration::Comment)?;
        while let Some(declaration) = self.declaration()? {
            declarations.push(declaration);
            self.comments(&mut declarations, Declaration::Comment)?;
        }

        if self.peek() != Some('}') {
            return Err(self.error(ParseErrorKind::MissingCloseBrace));
        }
        self.advance(1);

        Ok(StyleRule {
            selectors,
            declarations,
        })
    }

    /// One `name: value;` item, or `None` when no property name starts here.
    fn declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        let rest = self.rest();
        let name_len = property_len(rest.as_bytes());
        if name_len == 0 {
            return Ok(None);
        }
        let name = rest[..name_len].to_string();
        self.advance(name_len);
        self.skip_whitespace();

        if self.peek() != Some(':') {
            return Err(self.error(ParseErrorKind::PropertyMissingColon));
        }
        self.advance(1);
        self.skip_whitespace();

        let rest = self.rest();
        let value_len = value_len(rest.as_bytes());
        let value = rest[..value_len].trim().to_string();
        self.advance(value_len);

        let rest = self.rest();
        let trailing = rest.len()
            - rest
                .trim_start_matches(|c: char| c == ';' || c.is_whitespace())
                .len();
        self.advance(trailing);

        Ok(Some(Declaration::Property { name, value }))
    }
}

// All scanners below index bytes but only ever stop on ASCII bytes, so the
// returned offsets are always char boundaries.

/// Length of a property name: `\*?[-#/*\\\w]+(\[[0-9a-z_-]+\])?`.
fn property_len(bytes: &[u8]) -> usize {
    let is_name_byte =
        |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'#' | b'/' | b'*' | b'\\');
    let len = bytes.iter().take_while(|&&b| is_name_byte(b)).count();
    if len == 0 || bytes.get(len) != Some(&b'[') {
        return len;
    }

    let inner = bytes[len + 1..]
        .iter()
        .take_while(|&&b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'-'))
        .count();
    if inner > 0 && bytes.get(len + 1 + inner) == Some(&b']') {
        len + inner + 2
    } else {
        len
    }
}

/// Length of a declaration value, up to `;` or `}`. Quoted strings,
/// parenthesized groups and comments are taken whole.
fn value_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() {
        i = match bytes[i] {
            b';' | b'}' => break,
            b'"' | b'\'' => quoted_end(bytes, i).unwrap_or(i + 1),
            b'(' => match memchr::memchr(b')', &bytes[i + 1..]) {
                Some(close) => i + close + 2,
                None => i + 1,
            },
            b'/' if bytes.get(i + 1) == Some(&b'*') => comment_end(bytes, i).unwrap_or(i + 1),
            _ => i + 1,
        };
    }
    i
}

/// Length of a selector: everything up to the opening `{` of the block.
fn selector_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() {
        i = match bytes[i] {
            b'{' => break,
            b'"' | b'\'' => quoted_end(bytes, i).unwrap_or(i + 1),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                comment_end(bytes, i).unwrap_or(bytes.len())
            }
            _ => i + 1,
        };
    }
    i
}

/// Offset just past the quote closing the string that opens at `start`.
/// Strings do not span lines; `\` escapes the quote character.
fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&quote) => i += 2,
            b'\n' | b'\r' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Offset just past the `*/` closing the comment that opens at `start`.
fn comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    memmem::find(&bytes[start + 2..], b"*/").map(|end| start + 2 + end + 2)
}

/// Remove `/* ... */` comments; an unterminated one runs to the end.
/// Quoted strings are skipped the same way [`selector_len`] skips them.
pub(crate) fn strip_comments(text: &str) -> Cow<'_, str> {
    if !text.contains("/*") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = quoted_end(bytes, i).unwrap_or(i + 1),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&text[copied..i]);
                match comment_end(bytes, i) {
                    Some(end) => {
                        copied = end;
                        i = end;
                    }
                    None => return Cow::Owned(out),
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}
