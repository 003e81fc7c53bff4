//! Collect downloaded stylesheets into groups with identical content.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Header comment of collection stylesheets created by newer Bloom versions.
const BOILERPLATE: &str = "/*  Some books may need control over aspects of layout that cannot yet be adjusted\r\n    \
from the Bloom interface. In those cases, Bloom provides this \"under the hood\" method\r\n    \
of creating style rules using the underlying \"Cascading Stylesheets\" system.\r\n    \
These rules are then applied to all books in this collection.  EDIT THIS FILE ONLY\r\n    \
IN THE COLLECTION FOLDER:  changes made to a copy found in the book folder will be\r\n    \
lost the next time the book is edited with Bloom!\r\n\r\n \
Note: you can also add a file named \"customBookStyles.css\" in the book folder,\r\n    \
to limit the effects of the rules to just that one book.\r\n\r\n    \
You can learn about CSS from hundreds of books, or online. However chances are, if\r\n    \
you need this customization, you will need an expert to create a version of this file\r\n    \
for you, or give you rules that you can paste in below this line. */";

/// The same header as written by older versions.
const BOILERPLATE_OLD: &str = "/*  Some books may need control over aspects of layout that cannot yet be adjusted\r\n    \
from the Bloom interface. In those cases, Bloom provides this \"under the hood\" method\r\n    \
of creating style rules using the underlying \"Cascading Stylesheets\" system. \r\n    \
These rules are then applied to all books in this collection.\r\n\r\n \
Note: you can also add a file named \"customBookStyles.css\" in the book folder,\r\n    \
to limit the effects of the rules to just that one book.\r\n \r\n    \
You can learn about CSS from hundreds of books, or online. However chances are, if\r\n    \
you need this customization, you will need an expert to create a version of this file\r\n    \
for you, or give you rules that you can paste in below this line. */";

/// Stylesheets with the same content and the book folders they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssGroup {
    pub content: String,
    /// Book folders relative to the download root, like `/uploader/id/Title`.
    pub paths: Vec<String>,
}

/// Remove the standard header comments and surrounding whitespace.
pub fn strip_boilerplate(text: &str) -> String {
    text.replacen(BOILERPLATE, "", 1)
        .replacen(BOILERPLATE_OLD, "", 1)
        .trim()
        .to_string()
}

/// Walk `root` and group every non-empty stylesheet by content, in the order
/// first seen. Stops after `limit` non-empty files when given.
///
/// Files that cannot be read as UTF-8 text are skipped with a warning.
pub fn group_stylesheets(root: &Path, limit: Option<usize>) -> Result<Vec<CssGroup>> {
    let mut groups: Vec<CssGroup> = Vec::new();
    let mut by_content: HashMap<String, usize> = HashMap::new();
    let mut count = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        if limit.is_some_and(|limit| count >= limit) {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::Walk(e)),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let text = match fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(e) => {
                warn!("skipping {}: {e}", entry.path().display());
                continue;
            }
        };
        let content = strip_boilerplate(&text);
        if content.is_empty() {
            continue;
        }

        count += 1;
        let folder = book_folder(root, entry.path());
        debug!("{count} {folder}");
        match by_content.get(&content) {
            Some(&i) => groups[i].paths.push(folder),
            None => {
                by_content.insert(content.clone(), groups.len());
                groups.push(CssGroup {
                    content,
                    paths: vec![folder],
                });
            }
        }
    }

    info!("{count} stylesheets in {} groups", groups.len());
    Ok(groups)
}

/// The folder holding `file`, relative to `root`, `/`-separated with a
/// leading `/`.
fn book_folder(root: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    let mut folder = String::new();
    for component in relative.components() {
        folder.push('/');
        folder.push_str(&component.as_os_str().to_string_lossy());
    }
    if folder.is_empty() {
        folder.push('/');
    }
    folder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_strip_boilerplate() {
        let text = format!("{BOILERPLATE}\r\n\r\n.a {{ color: red; }}\r\n");
        assert_eq!(strip_boilerplate(&text), ".a { color: red; }");
        let text = format!("{BOILERPLATE_OLD}\r\n");
        assert_eq!(strip_boilerplate(&text), "");
    }

    #[test]
    fn test_group_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a@x.org/id1/Book One/customCollectionStyles.css", ".a { x: 1 }\n");
        write(
            root,
            "b@y.org/id2/Book Two/customCollectionStyles.css",
            &format!("{BOILERPLATE}\r\n.a {{ x: 1 }}"),
        );
        write(root, "b@y.org/id3/Book Three/customCollectionStyles.css", ".b { y: 2 }");
        write(root, "c/id4/Empty/customCollectionStyles.css", &format!("{BOILERPLATE_OLD}  "));

        let groups = group_stylesheets(root, None).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].content, ".a { x: 1 }");
        assert_eq!(groups[0].paths, vec!["/a@x.org/id1/Book One", "/b@y.org/id2/Book Two"]);
        assert_eq!(groups[1].paths, vec!["/b@y.org/id3/Book Three"]);
    }

    #[test]
    fn test_group_limit_counts_non_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a/1/empty.css", "   ");
        write(root, "a/2/one.css", ".a {}");
        write(root, "a/3/two.css", ".b {}");

        let groups = group_stylesheets(root, Some(1)).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paths, vec!["/a/2"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = group_stylesheets(&dir.path().join("nope"), None);
        assert!(matches!(result, Err(Error::Walk(_))));
    }
}
