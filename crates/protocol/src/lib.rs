//! USBmicro U4x1 wire protocol
//!
//! This crate describes how to talk to a USBmicro U401/U421 digital I/O
//! interface: which USB ids identify it, how a command is laid out in the
//! 8-byte HID report, and how the response report is decoded. It performs no
//! I/O of its own; the monitor crate moves the reports over USB.
//!
//! # Example
//!
//! ```
//! use protocol::{Command, StatusByte, decode_read_response, encode_command};
//!
//! let report = encode_command(Command::ReadA);
//! assert_eq!(report[0], Command::ReadA.opcode());
//!
//! // The device echoes the opcode and returns the port state in byte 1
//! let response = [Command::ReadA.opcode(), 0x20, 0, 0, 0, 0, 0, 0];
//! let status = StatusByte(decode_read_response(Command::ReadA, &response).unwrap());
//! assert!(status.is_motion());
//! ```

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{REPORT_SIZE, decode_read_response, encode_command};
pub use error::{ProtocolError, Result};
pub use types::{
    Command, INTERRUPT_IN_ENDPOINT, MOTION_MASK, MOTION_PIN, Model, StatusByte, USBMICRO_VENDOR_ID,
};
