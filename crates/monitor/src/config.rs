//! Monitor settings
//!
//! The only runtime inputs are the device serial and the sentinel name from
//! the command line. Everything else is fixed here.

use common::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Subdirectory of the temp area holding sentinel files
pub const DATA_DIR_NAME: &str = "plexMonitor";

/// Sentinel file name used when none is given
pub const DEFAULT_NAME: &str = "MOTION";

/// Hard deadline for a single device read
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(2);

/// Sleep between polls, whatever the outcome
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// libusb timeout for each transfer; kept below the watchdog window
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Serial number of the device to poll
    pub serial: String,
    /// Sentinel file name
    pub name: String,
    /// Per-user temporary-files area
    pub temp_root: PathBuf,
    pub watchdog_timeout: Duration,
    pub poll_interval: Duration,
    pub transfer_timeout: Duration,
}

impl MonitorSettings {
    /// Build settings from the command-line values
    ///
    /// Rejects a name that would place the sentinel outside the data
    /// directory.
    pub fn new(serial: String, name: String, temp_root: PathBuf) -> Result<Self> {
        if serial.is_empty() {
            return Err(Error::Usage("SERIAL must not be empty".to_string()));
        }
        Self::validate_name(&name)?;

        Ok(Self {
            serial,
            name,
            temp_root,
            watchdog_timeout: WATCHDOG_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            transfer_timeout: TRANSFER_TIMEOUT,
        })
    }

    /// Per-user temporary-files area
    ///
    /// `$XDG_RUNTIME_DIR` on Linux; elsewhere the process temp dir, which on
    /// macOS is already the per-user `$TMPDIR`.
    pub fn default_temp_root() -> PathBuf {
        dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
    }

    /// The name must be exactly one normal path component
    fn validate_name(name: &str) -> Result<()> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == name => Ok(()),
            _ => Err(Error::Usage(format!(
                "NAME must be a plain file name, got '{}'",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(name: &str) -> Result<MonitorSettings> {
        MonitorSettings::new("ABC123".to_string(), name.to_string(), PathBuf::from("/tmp"))
    }

    #[test]
    fn test_default_settings() {
        let settings = settings(DEFAULT_NAME).unwrap();
        assert_eq!(settings.name, "MOTION");
        assert_eq!(settings.watchdog_timeout, Duration::from_secs(2));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert!(settings.transfer_timeout < settings.watchdog_timeout);
        assert_eq!(settings.temp_root, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_validate_name_valid() {
        assert!(settings("MOTION").is_ok());
        assert!(settings("hallway-sensor").is_ok());
        assert!(settings("motion.stamp").is_ok());
    }

    #[test]
    fn test_validate_name_invalid() {
        for name in ["", ".", "..", "../MOTION", "a/b", "/etc/passwd", "MOTION/"] {
            let err = settings(name).unwrap_err();
            assert!(matches!(err, Error::Usage(_)), "name {name:?}");
        }
    }

    #[test]
    fn test_empty_serial_rejected() {
        let result = MonitorSettings::new(String::new(), DEFAULT_NAME.to_string(), PathBuf::new());
        assert!(matches!(result, Err(Error::Usage(_))));
    }

    #[test]
    fn test_default_temp_root_is_absolute() {
        assert!(MonitorSettings::default_temp_root().is_absolute());
    }
}
