//! Filesystem capability consumed by the request handler

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// The handful of filesystem queries the handler needs
///
/// `Sync` because one handler (and so one filesystem) is shared by every
/// worker thread.
pub trait FileSystem: Send + Sync {
    /// Does anything exist at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Is `path` a directory (following symlinks)
    fn is_directory(&self, path: &Path) -> bool;

    /// UTF-8 names of the entries directly under a directory, sorted
    fn list_entries(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Whole file contents
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// `FileSystem` backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Entries whose names are not UTF-8 are skipped.
    fn list_entries(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let name = entry?.file_name();
            match name.into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(dir = %path.display(), name = ?raw, "skipping non-UTF-8 entry"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("torero-fs-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_os_fs_queries() {
        let dir = scratch_dir("queries");
        fs::write(dir.join("b.txt"), b"bee").unwrap();
        fs::write(dir.join("a.txt"), b"ay").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();

        let osfs = OsFileSystem;
        assert!(osfs.exists(&dir.join("a.txt")));
        assert!(!osfs.exists(&dir.join("missing")));
        assert!(osfs.is_directory(&dir.join("sub")));
        assert!(!osfs.is_directory(&dir.join("a.txt")));
        assert_eq!(osfs.read_all(&dir.join("b.txt")).unwrap(), b"bee");
        assert_eq!(osfs.list_entries(&dir).unwrap(), vec!["a.txt", "b.txt", "sub"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_os_fs_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = scratch_dir("non-utf8");
        fs::write(dir.join("plain.txt"), b"ok").unwrap();
        fs::write(dir.join(OsStr::from_bytes(b"bad\xff.txt")), b"x").unwrap();

        let names = OsFileSystem.list_entries(&dir).unwrap();
        assert_eq!(names, vec!["plain.txt"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_os_fs_list_missing_dir() {
        let osfs = OsFileSystem;
        let missing = std::env::temp_dir().join("__torero_no_such_dir__");
        assert!(osfs.list_entries(&missing).is_err());
    }
}
