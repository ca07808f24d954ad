//! Sentinel file management
//!
//! The sentinel is an empty file under `<temp root>/plexMonitor/` whose
//! modification time is the only thing external observers look at. Setup is
//! idempotent: existing objects of the right type are left untouched.

use common::{Error, Result};
use std::fs::{self, DirBuilder, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

use crate::config::DATA_DIR_NAME;

/// Owner-only access for the data directory
const DATA_DIR_MODE: u32 = 0o700;

/// Owner read/write, everyone else read-only
const SENTINEL_MODE: u32 = 0o644;

/// Resolved sentinel file; both it and its directory exist on disk
#[derive(Debug, Clone)]
pub struct Sentinel {
    path: PathBuf,
}

impl Sentinel {
    /// Ensure `temp_root/plexMonitor/name` exists and return it
    ///
    /// Creates the data directory and the file as needed. An object of the
    /// wrong type already occupying either path is a setup error.
    pub fn resolve(temp_root: &Path, name: &str) -> Result<Self> {
        let data_dir = temp_root.join(DATA_DIR_NAME);
        ensure_data_dir(&data_dir)?;

        let path = data_dir.join(name);
        ensure_sentinel_file(&path)?;

        debug!("Sentinel file ready: {}", path.display());
        Ok(Self { path })
    }

    /// Path of the sentinel file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the access and modification times to now
    ///
    /// The file is opened read-only: owning it is enough to change its times,
    /// so a sentinel without the write bit still works. A sentinel that
    /// vanished since setup is reported as a touch failure.
    pub fn touch(&self) -> Result<()> {
        let now = SystemTime::now();
        let times = FileTimes::new().set_accessed(now).set_modified(now);

        File::open(&self.path)
            .and_then(|file| file.set_times(times))
            .map_err(|source| Error::Touch {
                path: self.path.clone(),
                source,
            })
    }
}

fn ensure_data_dir(dir: &Path) -> Result<()> {
    if fs::metadata(dir).is_ok_and(|meta| meta.is_dir()) {
        return Ok(());
    }

    warn!("Creating data directory: {}", dir.display());

    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    builder.mode(DATA_DIR_MODE);

    builder.create(dir).map_err(|source| Error::Setup {
        path: dir.to_path_buf(),
        source,
    })
}

fn ensure_sentinel_file(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => return Ok(()),
        Ok(_) => {
            return Err(Error::Setup {
                path: path.to_path_buf(),
                source: io::Error::other("exists but is not a regular file"),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(Error::Setup {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    warn!("Creating output file: {}", path.display());

    create_sentinel_file(path).map_err(|source| Error::Setup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn create_sentinel_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(SENTINEL_MODE);

    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::tempdir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
            .unwrap();
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_resolve_creates_dir_and_file() {
        let root = tempdir().unwrap();
        let sentinel = Sentinel::resolve(root.path(), "MOTION").unwrap();

        assert_eq!(sentinel.path(), root.path().join("plexMonitor").join("MOTION"));
        assert!(root.path().join("plexMonitor").is_dir());
        assert!(sentinel.path().is_file());
        assert_eq!(fs::metadata(sentinel.path()).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_permissions() {
        let root = tempdir().unwrap();
        let sentinel = Sentinel::resolve(root.path(), "MOTION").unwrap();

        // umask can only clear bits, never add them
        let dir_mode = fs::metadata(root.path().join("plexMonitor"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o700, 0o700);
        assert_eq!(dir_mode & 0o077, 0);

        let file_mode = fs::metadata(sentinel.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o600, 0o600);
        assert_eq!(file_mode & 0o133, 0);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let root = tempdir().unwrap();
        let first = Sentinel::resolve(root.path(), "MOTION").unwrap();

        let old = UNIX_EPOCH + Duration::from_secs(1_000_000);
        set_mtime(first.path(), old);

        let second = Sentinel::resolve(root.path(), "MOTION").unwrap();
        assert_eq!(first.path(), second.path());
        assert_eq!(mtime(second.path()), old);
    }

    #[test]
    fn test_resolve_keeps_existing_content() {
        let root = tempdir().unwrap();
        let dir = root.path().join("plexMonitor");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("hallway"), b"keep").unwrap();

        let sentinel = Sentinel::resolve(root.path(), "hallway").unwrap();
        assert_eq!(fs::read(sentinel.path()).unwrap(), b"keep");
    }

    #[test]
    fn test_resolve_rejects_file_in_place_of_dir() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("plexMonitor"), b"").unwrap();

        let err = Sentinel::resolve(root.path(), "MOTION").unwrap_err();
        assert!(matches!(err, Error::Setup { .. }));
    }

    #[test]
    fn test_resolve_rejects_dir_in_place_of_file() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("plexMonitor").join("MOTION")).unwrap();

        let err = Sentinel::resolve(root.path(), "MOTION").unwrap_err();
        match err {
            Error::Setup { path, .. } => assert!(path.ends_with("plexMonitor/MOTION")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_missing_root_fails() {
        let root = tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        let err = Sentinel::resolve(&missing, "MOTION").unwrap_err();
        assert_eq!(err.exit_status(), common::ExitStatus::Failure);
    }

    #[test]
    fn test_touch_updates_mtime() {
        let root = tempdir().unwrap();
        let sentinel = Sentinel::resolve(root.path(), "MOTION").unwrap();
        set_mtime(sentinel.path(), UNIX_EPOCH + Duration::from_secs(1_000_000));

        let before = SystemTime::now() - Duration::from_secs(1);
        sentinel.touch().unwrap();
        assert!(mtime(sentinel.path()) >= before);
    }

    #[cfg(unix)]
    #[test]
    fn test_touch_read_only_sentinel() {
        let root = tempdir().unwrap();
        let sentinel = Sentinel::resolve(root.path(), "MOTION").unwrap();
        set_mtime(sentinel.path(), UNIX_EPOCH + Duration::from_secs(1_000_000));
        fs::set_permissions(sentinel.path(), fs::Permissions::from_mode(0o444)).unwrap();

        let before = SystemTime::now() - Duration::from_secs(1);
        sentinel.touch().unwrap();
        assert!(mtime(sentinel.path()) >= before);

        // Setup accepts it as is
        Sentinel::resolve(root.path(), "MOTION").unwrap();
        let mode = fs::metadata(sentinel.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[test]
    fn test_touch_missing_file_fails_with_touch_error() {
        let root = tempdir().unwrap();
        let sentinel = Sentinel::resolve(root.path(), "MOTION").unwrap();
        fs::remove_file(sentinel.path()).unwrap();

        let err = sentinel.touch().unwrap_err();
        assert!(matches!(err, Error::Touch { .. }));
        assert_eq!(err.exit_status(), common::ExitStatus::TouchFailed);
        assert!(!sentinel.path().exists());
    }
}
