//! Write one draft migration folder per problem stylesheet.
//!
//! Each folder is named by the checksum of the original stylesheet and holds
//! the migrated `customBookStyles.css`, the `original.css` it came from, a
//! `migration.json` describing it and a `CHANGELOG.md` for the reviewer.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::filter::ProblemRecord;
use crate::error::{Error, Result};
use crate::migrate::{Migration, MigrationConfig, migrate};

/// How far the migration got, for whoever triages the folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Rewritten with nothing left to check by hand.
    Migrated,
    /// Rewritten, but with NOT MIGRATED notes or uncomputable values.
    NeedsReview,
    /// Could not be parsed; the output is the original text.
    Unparseable,
}

impl Outcome {
    fn of(migration: &Migration) -> Self {
        let report = &migration.report;
        if !report.is_migrated() {
            Outcome::Unparseable
        } else if report.needs_review() {
            Outcome::NeedsReview
        } else {
            Outcome::Migrated
        }
    }
}

/// Contents of `migration.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationInfo {
    /// First eight hex digits of the SHA-1 of the original stylesheet.
    pub checksum: String,
    pub book_count: usize,
    pub unique_named_books: usize,
    /// Obfuscated uploader ids, each listed once.
    pub uploaders: Vec<String>,
    pub first_book: String,
    pub hide_secondary_cover_title: bool,
    pub outcome: Outcome,
}

/// Short checksum naming a migration folder.
pub fn checksum(css: &str) -> String {
    let mut hex = sha1_smol::Sha1::from(css).hexdigest();
    hex.truncate(8);
    hex
}

/// Hide most of an uploader id: `john@example.org` → `j***@example.org`,
/// anything else keeps only its first character.
pub fn obfuscate_uploader(id: &str) -> String {
    let mut chars = id.chars();
    let first = chars.next().map(String::from).unwrap_or_default();
    match id.split_once('@') {
        Some((_, domain)) => format!("{first}***@{domain}"),
        None => format!("{first}***"),
    }
}

/// Migrate every record and write its folder under `out_dir`.
///
/// Stylesheets are migrated in parallel; folders are written in record
/// order so that a checksum collision always gives the later record the
/// `-2`, `-3`, ... suffix. Returns the folders written.
pub fn create_migrations(
    records: &[ProblemRecord],
    out_dir: &Path,
    config: &MigrationConfig,
) -> Result<Vec<PathBuf>> {
    let migrations: Vec<Migration> = records
        .par_iter()
        .map(|record| migrate(&record.css, config))
        .collect();

    fs::create_dir_all(out_dir).map_err(|e| Error::io_at(out_dir, e))?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(records.len());
    for (record, migration) in records.iter().zip(&migrations) {
        let sum = checksum(&record.css);
        let folder = out_dir.join(unique_name(&sum, &mut used));
        write_migration(&folder, &sum, record, migration)?;
        debug!("wrote {} ({:?})", folder.display(), Outcome::of(migration));
        written.push(folder);
    }

    info!("wrote {} migrations to {}", written.len(), out_dir.display());
    Ok(written)
}

fn unique_name(checksum: &str, used: &mut HashSet<String>) -> String {
    let mut name = checksum.to_string();
    let mut n = 1;
    while !used.insert(name.clone()) {
        n += 1;
        name = format!("{checksum}-{n}");
    }
    name
}

fn write_migration(
    folder: &Path,
    checksum: &str,
    record: &ProblemRecord,
    migration: &Migration,
) -> Result<()> {
    fs::create_dir_all(folder).map_err(|e| Error::io_at(folder, e))?;

    let info = MigrationInfo {
        checksum: checksum.to_string(),
        book_count: record.book_count,
        unique_named_books: record.unique_named_books,
        uploaders: uploaders(&record.paths),
        first_book: record.first_book.clone(),
        hide_secondary_cover_title: migration.hide_secondary_cover_title,
        outcome: Outcome::of(migration),
    };

    let files = [
        ("customBookStyles.css", migration.css.clone()),
        ("original.css", record.css.clone()),
        ("migration.json", serde_json::to_string_pretty(&info)?),
        ("CHANGELOG.md", changelog(checksum, record, migration)),
    ];
    for (name, content) in files {
        let path = folder.join(name);
        fs::write(&path, content).map_err(|e| Error::io_at(path, e))?;
    }
    Ok(())
}

/// Obfuscated uploaders of the books, first-seen order, no repeats.
fn uploaders(paths: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter_map(|path| path.split('/').nth(1))
        .filter(|id| !id.is_empty())
        .map(obfuscate_uploader)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// A human-readable account of what the migration did.
pub fn changelog(checksum: &str, record: &ProblemRecord, migration: &Migration) -> String {
    let report = &migration.report;
    let mut out = String::new();

    writeln!(out, "# Migration {checksum}").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "Stylesheet used by {} books ({} with distinct names). First book: {}",
        record.book_count, record.unique_named_books, record.first_book
    )
    .unwrap();
    writeln!(out).unwrap();

    if let Some(error) = &report.parse_error {
        writeln!(
            out,
            "- Could not parse the stylesheet ({error}); customBookStyles.css is the original text."
        )
        .unwrap();
        return out;
    }

    if let Some(repair) = &report.repair {
        writeln!(out, "- Repaired before migrating: {repair}.").unwrap();
    }
    writeln!(
        out,
        "- Rewrote {} .marginBox rules to page margin variables.",
        report.migrated_rules
    )
    .unwrap();
    if report.split_rules > 0 {
        writeln!(
            out,
            "- Moved other declarations of {} rules into a following rule.",
            report.split_rules
        )
        .unwrap();
    }
    if report.unmigrated_rules > 0 {
        writeln!(
            out,
            "- Left {} .marginBox rules in place (no page size, left or top).",
            report.unmigrated_rules
        )
        .unwrap();
    }
    if !report.not_migrated.is_empty() {
        writeln!(out, "- Marked NOT MIGRATED: {}.", report.not_migrated.join(", ")).unwrap();
    }
    if report.value_errors > 0 {
        writeln!(
            out,
            "- {} values could not be computed and were set to `ignore`.",
            report.value_errors
        )
        .unwrap();
    }
    if migration.hide_secondary_cover_title {
        writeln!(out, "- Hides the secondary-language title on the cover.").unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(css: &str, paths: &[&str]) -> ProblemRecord {
        ProblemRecord {
            book_count: paths.len(),
            unique_named_books: paths.len(),
            first_book: "https://bloomlibrary.org/:search:bookInstanceId%3Aid".to_string(),
            css: css.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            uniqueified_paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_checksum() {
        // sha1("abc") = a9993e36...
        assert_eq!(checksum("abc"), "a9993e36");
    }

    #[test]
    fn test_obfuscate_uploader() {
        assert_eq!(obfuscate_uploader("john@example.org"), "j***@example.org");
        assert_eq!(obfuscate_uploader("someone"), "s***");
        assert_eq!(obfuscate_uploader(""), "***");
    }

    #[test]
    fn test_uploaders_are_unique() {
        let paths = vec![
            "/jane@x.org/1/A".to_string(),
            "/joe@x.org/2/B".to_string(),
            "/bob/3/C".to_string(),
        ];
        assert_eq!(uploaders(&paths), vec!["j***@x.org", "b***"]);
    }

    #[test]
    fn test_create_migrations_suffixes_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let css = ".marginBox.A5Portrait { left: 15mm; top: 10mm; width: 115mm }";
        let records = vec![
            record(css, &["/a@x.org/1/One"]),
            record(css, &["/b@x.org/2/Two"]),
            record(".marginBox { left 1mm }", &["/c/3/Three"]),
        ];

        let written =
            create_migrations(&records, dir.path(), &MigrationConfig::default()).unwrap();
        let sum = checksum(css);
        assert_eq!(written[0], dir.path().join(&sum));
        assert_eq!(written[1], dir.path().join(format!("{sum}-2")));

        let migrated = fs::read_to_string(written[0].join("customBookStyles.css")).unwrap();
        assert!(migrated.contains("--page-margin-right: 18.0mm;"));
        assert_eq!(fs::read_to_string(written[0].join("original.css")).unwrap(), css);

        let info: MigrationInfo =
            serde_json::from_str(&fs::read_to_string(written[1].join("migration.json")).unwrap())
                .unwrap();
        assert_eq!(info.checksum, sum);
        assert_eq!(info.uploaders, vec!["b***@x.org"]);
        assert_eq!(info.outcome, Outcome::Migrated);

        let info: MigrationInfo =
            serde_json::from_str(&fs::read_to_string(written[2].join("migration.json")).unwrap())
                .unwrap();
        assert_eq!(info.outcome, Outcome::Unparseable);
        let changelog = fs::read_to_string(written[2].join("CHANGELOG.md")).unwrap();
        assert!(changelog.contains("Could not parse the stylesheet"));
    }
}
