use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

/// Permission bits applied to every generated HTML file.
pub const OUTPUT_MODE: u32 = 0o644;

/// Atomically write `contents` to `path`, creating missing parent
/// directories. Readers never observe partial content: the bytes go to a
/// temporary file in the same directory which is then renamed into place.
pub fn write_output(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = Builder::new().prefix(".hype").tempfile_in(&parent)?;
    tmp.as_file_mut().write_all(contents)?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(OUTPUT_MODE))?;
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("site/nested/index.html");

        write_output(&target, b"<p>hi</p>\n").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"<p>hi</p>\n");
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("index.html");
        fs::write(&target, "old").unwrap();

        write_output(&target, b"new").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".hype"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn applies_fixed_non_executable_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let target = dir.path().join("index.html");

        write_output(&target, b"x").unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, OUTPUT_MODE);
    }
}
