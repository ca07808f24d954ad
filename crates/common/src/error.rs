//! Common error types
//!
//! There is no local recovery anywhere in the monitor: every error reaches
//! `main`, which logs it and exits with the status from [`Error::exit_status`].

use protocol::ProtocolError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Error creating {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("USB error: {0}")]
    Usb(String),

    #[error("Device read error: {0}")]
    Read(String),

    #[error("Device protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Timeout waiting for USB read after {0:?}")]
    Timeout(Duration),

    #[error("Error touching output file {}: {source}", path.display())]
    Touch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit status the process terminates with for this error
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Error::Usage(_) => ExitStatus::Usage,
            Error::Touch { .. } => ExitStatus::TouchFailed,
            Error::Setup { .. }
            | Error::DeviceNotFound(_)
            | Error::Usb(_)
            | Error::Read(_)
            | Error::Protocol(_)
            | Error::Timeout(_)
            | Error::Logging(_)
            | Error::Io(_) => ExitStatus::Failure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Process exit statuses
///
/// A clean exit never happens in practice since the poll loop runs until the
/// process is killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Device, filesystem setup, read or timeout failure
    Failure = 1,
    /// Motion was detected but could not be recorded
    TouchFailed = 2,
    /// Missing or malformed command-line arguments (the C convention of `-1`)
    Usage = 255,
}

impl ExitStatus {
    /// Status as accepted by [`std::process::exit`]
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(
            Error::Usage("missing SERIAL".into()).exit_status(),
            ExitStatus::Usage
        );
        assert_eq!(
            Error::DeviceNotFound("ABC123".into()).exit_status(),
            ExitStatus::Failure
        );
        assert_eq!(
            Error::Read("pipe".into()).exit_status(),
            ExitStatus::Failure
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(2)).exit_status(),
            ExitStatus::Failure
        );
        assert_eq!(
            Error::Touch {
                path: PathBuf::from("/tmp/plexMonitor/MOTION"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            }
            .exit_status(),
            ExitStatus::TouchFailed
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ExitStatus::TouchFailed.code(), 2);
        assert_eq!(ExitStatus::Usage.code(), 255);
    }

    #[test]
    fn test_diagnostics_name_the_subject() {
        let err = Error::DeviceNotFound("ABC123".into());
        assert_eq!(err.to_string(), "Device not found: ABC123");

        let err = Error::Setup {
            path: PathBuf::from("/tmp/plexMonitor"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/plexMonitor"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: Error = ProtocolError::ShortReport {
            expected: 8,
            actual: 1,
        }
        .into();
        assert_eq!(err.exit_status(), ExitStatus::Failure);
    }
}
