//! Report encoding and decoding
//!
//! Every exchange with the device is a pair of fixed-size reports:
//!
//! ```text
//! out: [opcode][arg0][arg1][0][0][0][0][0]
//! in:  [opcode][data][.. unused ..]
//! ```
//!
//! The response echoes the opcode of the command it answers, which lets us
//! detect a desynchronised pipe.

use crate::{Command, error::ProtocolError, error::Result};

/// Size of every HID report exchanged with the device
pub const REPORT_SIZE: usize = 8;

/// Encode a command into an output report
///
/// # Example
/// ```
/// use protocol::{Command, encode_command};
///
/// let report = encode_command(Command::WriteA(0xff));
/// assert_eq!(report, [0x01, 0xff, 0, 0, 0, 0, 0, 0]);
/// ```
pub fn encode_command(command: Command) -> [u8; REPORT_SIZE] {
    let mut report = [0u8; REPORT_SIZE];
    let [arg0, arg1] = command.arguments();
    report[0] = command.opcode();
    report[1] = arg0;
    report[2] = arg1;
    report
}

/// Decode the data byte from the response to `expected`
///
/// Fails if the report is truncated or answers a different command.
pub fn decode_read_response(expected: Command, report: &[u8]) -> Result<u8> {
    if report.len() < REPORT_SIZE {
        return Err(ProtocolError::ShortReport {
            expected: REPORT_SIZE,
            actual: report.len(),
        });
    }

    if report[0] != expected.opcode() {
        return Err(ProtocolError::OpcodeMismatch {
            expected: expected.opcode(),
            actual: report[0],
        });
    }

    Ok(report[1])
}
