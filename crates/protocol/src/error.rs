//! Protocol error types

use thiserror::Error;

/// Errors raised while decoding a device report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The device returned fewer bytes than a full report
    #[error("Short report: expected {expected} bytes, got {actual}")]
    ShortReport { expected: usize, actual: usize },

    /// The response echoes a different command than the one sent
    #[error("Opcode mismatch: expected {expected:#04x}, got {actual:#04x}")]
    OpcodeMismatch { expected: u8, actual: u8 },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
