//! Shared test harness utilities for hype crates.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Markdown exercising every extension toggled by the extended grammar.
pub const SAMPLE_DOCUMENT: &str = "\
# Sample

~~strike~~

- [ ] task
- [x] done

:smile:

| a | b |
|---|---|
| 1 | 2 |

Text with a note[^1].

Term

: Definition

<div class=\"raw\">inline html</div>

[^1]: The note.
";

/// Write `contents` to `relative` below `dir`, creating parent directories.
pub fn write_fixture(dir: &Path, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

/// Temporary directory pre-populated with the given `(relative path, contents)` files.
pub fn fixture_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (relative, contents) in files {
        write_fixture(dir.path(), relative, contents);
    }
    dir
}
