//! Directory scanning.
//!
//! One synchronous listing per directory, files and sub-directories split
//! apart and sorted bytewise. Nothing is cached: every call reads the
//! filesystem again, so a rescan reflects whatever changed in between.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A snapshot of one directory's immediate entries.
///
/// `files` and `sub_directories` are sorted lexically and never contain
/// `.` or `..`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryListing {
    pub directory: PathBuf,
    pub files: Vec<String>,
    pub sub_directories: Vec<String>,
}

/// Source of directory listings.
pub trait Scanner {
    /// Lists the immediate entries of `path`.
    ///
    /// # Errors
    /// [`Error::NotFound`] when `path` does not exist, [`Error::NotADirectory`]
    /// when it is not traversable.
    fn list_directory(&self, path: &Path) -> Result<DirectoryListing>;

    /// Pre-order, depth-first walk. `visit` sees `path` itself first, then
    /// each sub-directory in listing order. Symlink cycles are not detected.
    fn traverse<F>(&self, path: &Path, visit: &mut F) -> Result<()>
    where
        F: FnMut(&DirectoryListing) -> Result<()>,
    {
        let listing = self.list_directory(path)?;
        visit(&listing)?;
        for name in &listing.sub_directories {
            self.traverse(&listing.directory.join(name), visit)?;
        }
        Ok(())
    }
}

/// [`Scanner`] over the local filesystem.
///
/// Symlinks are classified by what they point at; a dangling link is
/// neither a file nor a directory and is left out.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsScanner;

impl Scanner for FsScanner {
    fn list_directory(&self, path: &Path) -> Result<DirectoryListing> {
        let entries = fs::read_dir(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => Error::NotFound { path: path.to_path_buf(), source },
            ErrorKind::NotADirectory => Error::NotADirectory { path: path.to_path_buf() },
            _ if path.is_file() => Error::NotADirectory { path: path.to_path_buf() },
            _ => Error::Io { path: path.to_path_buf(), source },
        })?;

        let mut files = Vec::new();
        let mut sub_directories = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "." || name == ".." {
                continue;
            }
            // fs::metadata follows symlinks.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => sub_directories.push(name),
                Ok(meta) if meta.is_file() => files.push(name),
                _ => {}
            }
        }
        files.sort_unstable();
        sub_directories.sort_unstable();

        Ok(DirectoryListing { directory: path.to_path_buf(), files, sub_directories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn listing_is_partitioned_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "post.rs");
        touch(dir.path(), "get.rs");
        touch(dir.path(), "B.txt");
        touch(dir.path(), "zeta/get.rs");
        touch(dir.path(), "$id/get.rs");
        touch(dir.path(), "^auth/all.rs");

        let listing = FsScanner.list_directory(dir.path()).unwrap();
        assert_eq!(listing.files, ["B.txt", "get.rs", "post.rs"]);
        assert_eq!(listing.sub_directories, ["$id", "^auth", "zeta"]);
        assert_eq!(listing.directory, dir.path());
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsScanner.list_directory(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
    }

    #[test]
    fn file_path_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "get.rs");
        let err = FsScanner.list_directory(&dir.path().join("get.rs")).unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }), "{err:?}");
    }

    #[test]
    fn rescan_sees_new_entries() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "get.rs");
        assert_eq!(FsScanner.list_directory(dir.path()).unwrap().files.len(), 1);
        touch(dir.path(), "put.rs");
        assert_eq!(FsScanner.list_directory(dir.path()).unwrap().files.len(), 2);
    }

    #[test]
    fn traverse_is_pre_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b/inner/get.rs");
        touch(dir.path(), "a/get.rs");
        touch(dir.path(), "get.rs");

        let mut seen = Vec::new();
        FsScanner
            .traverse(dir.path(), &mut |listing: &DirectoryListing| {
                let rel = listing.directory.strip_prefix(dir.path()).unwrap();
                seen.push(rel.to_string_lossy().replace('\\', "/"));
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, ["", "a", "b", "b/inner"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_follow_their_target() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "real/get.rs");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/get.rs"), dir.path().join("put.rs")).unwrap();

        let listing = FsScanner.list_directory(dir.path()).unwrap();
        assert_eq!(listing.sub_directories, ["linked", "real"]);
        assert_eq!(listing.files, ["put.rs"]);
    }
}
