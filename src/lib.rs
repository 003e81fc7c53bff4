//! # marginbox-migrate
//!
//! Migrates book stylesheets that position the `.marginBox` absolutely
//! (`left`, `top`, `width`, `height`) to the page margin variables used by
//! the current page layout (`--page-margin-*`, `--cover-margin-*`).
//!
//! ## Features
//!
//! - Strict, comment-preserving CSS parser with positioned errors
//! - One-step repair of the corruption found in real customized stylesheets
//! - Margin computation from the known page sizes, with cover variants
//! - `NOT MIGRATED` notes on anything a person has to look at
//! - Corpus tooling for grouping, filtering and drafting migrations
//!   (`cli` feature)
//!
//! ## Quick Start
//!
//! ```
//! use marginbox_migrate::{MigrationConfig, migrate};
//!
//! let css = ".marginBox.A5Portrait { left: 15mm; top: 10mm; width: 115mm; height: 182mm; }";
//! let migration = migrate(css, &MigrationConfig::default());
//!
//! assert!(migration.css.contains("--page-margin-bottom: 18.0mm;"));
//! assert!(migration.css.contains("--page-margin-right: 18.0mm;"));
//! assert!(!migration.report.needs_review());
//! ```
//!
//! ## Working with Stylesheets
//!
//! The [`Stylesheet`] model can be used on its own:
//!
//! ```
//! use marginbox_migrate::{Stylesheet, ToCss};
//!
//! let sheet = Stylesheet::parse("/* keep me */ .a,.b { color: red }").unwrap();
//! assert_eq!(sheet.to_css_string(), "/* keep me */\n\n.a,\n.b {\n  color: red;\n}");
//! ```

pub mod css;
pub mod error;
pub mod migrate;

#[cfg(feature = "cli")]
pub mod corpus;

pub use css::{Declaration, ParseError, ParseErrorKind, Rule, StyleRule, Stylesheet, ToCss};
pub use error::{Error, Result};
pub use migrate::{Migration, MigrationConfig, MigrationReport, PageSize, Repair, migrate};
