//! Parse with one round of line-level repair.
//!
//! The repairs cover the corruption actually found in customized book
//! stylesheets. This is not general error correction: an error that does not
//! match one of these exact shapes is left alone.

use std::fmt;

use log::{debug, info};

use crate::css::{ParseError, ParseErrorKind, Stylesheet};

/// A repair that made an unparseable stylesheet parseable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// `} {` on `line` collapsed to a space, rejoining a rule that had been
    /// split in two.
    JoinedSplitRule { line: usize },
    /// `} ` inserted at the start of `line` to close the rule before it.
    ClosedRule { line: usize },
    /// A line holding only `.` removed.
    RemovedStrayDot { line: usize },
    /// `*/` appended to close a comment left open at the end of the file.
    ClosedTrailingComment,
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::JoinedSplitRule { line } => write!(f, "joined a rule split by '}} {{' on line {line}"),
            Repair::ClosedRule { line } => write!(f, "added a missing '}}' at the start of line {line}"),
            Repair::RemovedStrayDot { line } => write!(f, "removed a stray '.' on line {line}"),
            Repair::ClosedTrailingComment => f.write_str("closed an unterminated comment at the end"),
        }
    }
}

/// A successfully parsed stylesheet and the repair it needed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub stylesheet: Stylesheet,
    pub repair: Option<Repair>,
}

/// Parse `css`, trying one repair if the first parse fails.
///
/// On failure returns the error from the *original* text, which is the one
/// worth showing to a person.
pub fn parse_with_recovery(css: &str) -> Result<Recovered, ParseError> {
    let error = match Stylesheet::parse(css) {
        Ok(stylesheet) => {
            return Ok(Recovered {
                stylesheet,
                repair: None,
            });
        }
        Err(error) => error,
    };

    let Some((fixed, repair)) = repair(css, &error) else {
        debug!("no repair for parse error {error}");
        return Err(error);
    };

    match Stylesheet::parse(&fixed) {
        Ok(stylesheet) => {
            info!("parse error {error}: {repair}");
            Ok(Recovered {
                stylesheet,
                repair: Some(repair),
            })
        }
        Err(second) => {
            debug!("parse error {error} persisted after repair ({repair}): {second}");
            Err(error)
        }
    }
}

/// Apply the repair matching `error`, if there is one.
pub fn repair(css: &str, error: &ParseError) -> Option<(String, Repair)> {
    let lines = split_lines(css);
    let index = error.line.checked_sub(1)?;
    let line = lines.get(index)?.0;

    match error.kind {
        ParseErrorKind::SelectorMissing if line.contains("} {") => {
            let joined = line.replacen("} {", " ", 1);
            Some((
                rejoin(&lines, index, Some(&joined)),
                Repair::JoinedSplitRule { line: error.line },
            ))
        }
        ParseErrorKind::MissingCloseBrace => {
            let closed = format!("}} {line}");
            Some((
                rejoin(&lines, index, Some(&closed)),
                Repair::ClosedRule { line: error.line },
            ))
        }
        ParseErrorKind::MissingOpenBrace if line == "." => Some((
            rejoin(&lines, index, None),
            Repair::RemovedStrayDot { line: error.line },
        )),
        ParseErrorKind::EndOfCommentMissing => {
            // Later lines may only hold stray debris like a lone `}`.
            let rest_blank = lines[index + 1..]
                .iter()
                .all(|(text, _)| text.chars().count() < 2);
            rest_blank.then(|| (format!("{css}*/"), Repair::ClosedTrailingComment))
        }
        _ => None,
    }
}

/// Split into `(line, terminator)` pairs, breaking on `\r\n`, `\n` and a
/// lone `\r` the same way the parser counts lines.
fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    while let Some(offset) = memchr::memchr2(b'\r', b'\n', &bytes[start..]) {
        let end = start + offset;
        let terminator_len = if bytes[end] == b'\r' && bytes.get(end + 1) == Some(&b'\n') {
            2
        } else {
            1
        };
        lines.push((&text[start..end], &text[end..end + terminator_len]));
        start = end + terminator_len;
    }
    lines.push((&text[start..], ""));

    lines
}

/// Join the lines back, replacing line `index` (or dropping it, terminator
/// included, when `replacement` is `None`).
fn rejoin(lines: &[(&str, &str)], index: usize, replacement: Option<&str>) -> String {
    let mut out = String::new();
    for (i, (text, terminator)) in lines.iter().enumerate() {
        if i == index {
            let Some(replacement) = replacement else {
                continue;
            };
            out.push_str(replacement);
        } else {
            out.push_str(text);
        }
        out.push_str(terminator);
    }
    out
}
