//! Filesystem abstraction layer for testability
//!
//! Every filesystem touch made by the guard, the policy engine, the unit
//! manager and the directory tracker goes through [`FileSystem`], so tests can
//! either mock individual calls (mockall) or point the real implementation at
//! a temporary directory.

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting filesystem operations for dependency injection.
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace `path` with `contents` via a temp file + rename in the same directory.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory. Fails if the directory has entries.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Whether a directory has no entries.
    fn is_dir_empty(&self, path: &Path) -> io::Result<bool>;

    /// Set Unix file permissions mode (e.g., 0o700).
    fn set_permissions_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", path.display()),
            )
        })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;

        // NamedTempFile is created 0600; rulesets and units are world-readable
        self.set_permissions_mode(temp_file.path(), 0o644)?;

        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn is_dir_empty(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::read_dir(path)?.next().is_none())
    }

    fn set_permissions_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }
}

static REAL_FS: RealFileSystem = RealFileSystem;

/// Get a reference to the global real filesystem instance.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_atomic_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("rules.v4");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"*filter\nCOMMIT\n").unwrap();
        assert_eq!(fs.read_to_string(&file_path).unwrap(), "*filter\nCOMMIT\n");

        // Overwrite leaves no temp files behind
        fs.write_atomic(&file_path, b"second").unwrap();
        assert_eq!(fs.read_to_string(&file_path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_real_fs_write_atomic_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("unit.service");

        RealFileSystem.write_atomic(&file_path, b"[Unit]\n").unwrap();

        let metadata = std::fs::metadata(&file_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn test_real_fs_write_atomic_missing_parent() {
        let fs = RealFileSystem;
        let result = fs.write_atomic(Path::new("/nonexistent/path/file.txt"), b"test");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_remove_dir_only_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("iptables");
        let fs = RealFileSystem;

        fs.create_dir_all(&dir).unwrap();
        assert!(fs.is_dir_empty(&dir).unwrap());

        fs.write_atomic(&dir.join("custom.rules"), b"x").unwrap();
        assert!(!fs.is_dir_empty(&dir).unwrap());
        assert!(fs.remove_dir(&dir).is_err());
        assert!(fs.exists(&dir));

        fs.remove_file(&dir.join("custom.rules")).unwrap();
        fs.remove_dir(&dir).unwrap();
        assert!(!fs.exists(&dir));
    }

    #[test]
    fn test_real_fs_read_nonexistent() {
        let fs = RealFileSystem;
        let result = fs.read_to_string(Path::new("/nonexistent/path/file.txt"));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_set_permissions_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("state");
        let fs = real_fs();

        fs.create_dir_all(&dir).unwrap();
        fs.set_permissions_mode(&dir, 0o700).unwrap();

        let metadata = std::fs::metadata(&dir).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o700);
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_write_atomic().returning(|_, _| {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "access denied",
            ))
        });

        let result = mock.write_atomic(Path::new("/etc/iptables/rules.v4"), b"");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
