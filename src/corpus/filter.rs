//! Keep only the stylesheet groups whose `.marginBox` rules will interfere
//! with the page margin variables.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::group::CssGroup;

/// A `.marginBox { ... }` block, capturing its body.
static MARGIN_BOX_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.marginBox\s*\{([^}]*)\}").unwrap());

/// Properties that position or size the box.
static INTERFERING_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)padding-|left:|top:|right:|bottom:|margin-|width:|height:").unwrap()
});

/// A group of identical stylesheets that needs migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub book_count: usize,
    /// Books with distinct titles; rebranded copies of one book share a title.
    pub unique_named_books: usize,
    /// Bloom library search for the first book's instance id.
    pub first_book: String,
    pub css: String,
    pub paths: Vec<String>,
    pub uniqueified_paths: Vec<String>,
}

/// Totals over the whole corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub total_books: usize,
    pub total_books_with_problems: usize,
    pub total_unique_files: usize,
    pub unique_files_with_problems: usize,
    /// `unique_named_books` of each record, in record order.
    pub unique_book_counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOutput {
    pub summary: FilterSummary,
    pub records: Vec<ProblemRecord>,
}

/// Whether `css` has a `.marginBox` block setting a property that fights the
/// margin variables. Names that merely end in one (`min-width`,
/// `-webkit-margin-start`) do not count.
pub fn probably_interferes(css: &str) -> bool {
    MARGIN_BOX_BLOCK.captures_iter(css).any(|block| {
        let Some(body) = block.get(1) else {
            return false;
        };
        INTERFERING_PROPERTY.find_iter(body.as_str()).any(|m| {
            let start = body.start() + m.start();
            !css[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c == '-' || c == '_' || c.is_ascii_alphanumeric())
        })
    })
}

/// Keep the interfering groups, most widely used first.
pub fn filter_groups(groups: &[CssGroup]) -> FilterOutput {
    let mut records: Vec<ProblemRecord> = groups
        .iter()
        .filter(|group| probably_interferes(&group.content))
        .map(problem_record)
        .collect();
    records.sort_by(|a, b| b.unique_named_books.cmp(&a.unique_named_books));

    let summary = FilterSummary {
        total_books: groups.iter().map(|g| g.paths.len()).sum(),
        total_books_with_problems: records.iter().map(|r| r.book_count).sum(),
        total_unique_files: groups.len(),
        unique_files_with_problems: records.len(),
        unique_book_counts: records.iter().map(|r| r.unique_named_books).collect(),
    };
    FilterOutput { summary, records }
}

fn problem_record(group: &CssGroup) -> ProblemRecord {
    let uniqueified_paths = uniqueify_paths(&group.paths);
    let instance_id = group
        .paths
        .first()
        .and_then(|path| path.split('/').nth(2))
        .unwrap_or_default();

    ProblemRecord {
        book_count: group.paths.len(),
        unique_named_books: uniqueified_paths.len(),
        first_book: format!("https://bloomlibrary.org/:search:bookInstanceId%3A{instance_id}"),
        css: group.content.clone(),
        paths: group.paths.clone(),
        uniqueified_paths,
    }
}

/// The first path for each distinct book folder name.
fn uniqueify_paths(paths: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|path| seen.insert(path.rsplit('/').next().unwrap_or_default()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(content: &str, paths: &[&str]) -> CssGroup {
        CssGroup {
            content: content.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_probably_interferes() {
        assert!(probably_interferes(".marginBox { left: 10mm; }"));
        assert!(probably_interferes(".A5Portrait .MARGINBOX{top:1mm}"));
        assert!(probably_interferes(".marginBox {\n  padding-left: 1mm }"));
        assert!(!probably_interferes(".marginBox { min-width: 10mm; }"));
        assert!(!probably_interferes(".marginBox { -webkit-margin-start: 0; }"));
        assert!(!probably_interferes(".marginBox { color: red; } p { left: 0; }"));
        assert!(!probably_interferes(".bloom-page { left: 0; }"));
    }

    #[test]
    fn test_uniqueify_paths() {
        let paths = vec![
            "/a/1/Title".to_string(),
            "/b/2/Other".to_string(),
            "/c/3/Title".to_string(),
        ];
        assert_eq!(uniqueify_paths(&paths), vec!["/a/1/Title", "/b/2/Other"]);
    }

    #[test]
    fn test_filter_groups() {
        let groups = vec![
            group(".marginBox { top: 1mm }", &["/a/id1/One"]),
            group("p { color: red }", &["/a/id2/Two", "/b/id3/Three"]),
            group(".marginBox { width: 1mm }", &["/c/id4/Four", "/d/id5/Five"]),
        ];
        let output = filter_groups(&groups);

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].css, ".marginBox { width: 1mm }");
        assert_eq!(
            output.records[0].first_book,
            "https://bloomlibrary.org/:search:bookInstanceId%3Aid4"
        );
        assert_eq!(
            output.summary,
            FilterSummary {
                total_books: 5,
                total_books_with_problems: 3,
                total_unique_files: 3,
                unique_files_with_problems: 2,
                unique_book_counts: vec![2, 1],
            }
        );
    }
}
