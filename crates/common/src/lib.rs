//! Common utilities for plex-motion-monitor
//!
//! This crate provides the error taxonomy shared by every layer of the
//! monitor, the mapping from failures to process exit statuses, and the
//! logging setup.

pub mod error;
pub mod logging;

pub use error::{Error, ExitStatus, Result};
pub use logging::setup_logging;
