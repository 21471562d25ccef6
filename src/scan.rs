//! Directory enumeration for transmission (depth-first, regular files only)

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Entry discovered during a scan. The size is the size at scan time; the
/// worker stats the file again when it actually transmits.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Recursively enumerate all regular files under `root`, depth-first.
/// Symlinks are not followed. Unreadable directories are logged and
/// contribute nothing; in particular an unreadable root yields an empty
/// list rather than an error.
pub fn scan_tree(root: &Path) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(e) if e.file_type().is_file() => match e.metadata() {
                Ok(md) => entries.push(FileEntry {
                    path: e.into_path(),
                    size: md.len(),
                }),
                Err(err) => eprintln!("scan: skipping {}: {}", e.path().display(), err),
            },
            Ok(_) => {}
            Err(err) => eprintln!("scan: {}", err),
        }
    }
    entries
}

/// The name a file travels under on the wire: its path relative to the
/// server's base root, `/`-separated. None if the path is not under `base`.
pub fn wire_name(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_nested_files_and_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("top.txt"), b"12345").unwrap();
        fs::write(tmp.path().join("a/mid.bin"), b"").unwrap();
        fs::write(tmp.path().join("a/b/deep.dat"), b"xyz").unwrap();

        let mut found = scan_tree(tmp.path());
        found.sort_by(|x, y| x.path.cmp(&y.path));
        let names: Vec<_> = found
            .iter()
            .map(|e| wire_name(tmp.path(), &e.path).unwrap())
            .collect();
        assert_eq!(names, vec!["a/b/deep.dat", "a/mid.bin", "top.txt"]);

        let by_name = |n: &str| found.iter().find(|e| e.path.ends_with(n)).unwrap();
        assert_eq!(by_name("top.txt").size, 5);
        assert_eq!(by_name("mid.bin").size, 0);
        assert_eq!(by_name("deep.dat").size, 3);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan_tree(tmp.path()).is_empty());
    }

    #[test]
    fn missing_root_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan_tree(&tmp.path().join("no-such-dir")).is_empty());
    }

    #[test]
    fn directories_themselves_are_not_listed() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("only/dirs/here")).unwrap();
        assert!(scan_tree(tmp.path()).is_empty());
    }

    #[test]
    fn wire_name_is_relative_to_base() {
        let base = Path::new("/srv/files");
        assert_eq!(
            wire_name(base, Path::new("/srv/files/mydir/dirA/file1.txt")).unwrap(),
            "mydir/dirA/file1.txt"
        );
        assert_eq!(wire_name(base, Path::new("/elsewhere/x")), None);
        assert_eq!(wire_name(base, base), None);
    }
}
