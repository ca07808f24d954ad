//! Device identifiers, commands, and the port status byte

use std::fmt;

/// USB vendor id assigned to USBmicro
pub const USBMICRO_VENDOR_ID: u16 = 0x0de7;

/// Interrupt IN endpoint carrying command responses
pub const INTERRUPT_IN_ENDPOINT: u8 = 0x81;

/// Port A pin wired to the motion sensor output
pub const MOTION_PIN: u8 = 5;

/// Mask selecting the motion pin in a port A status byte
pub const MOTION_MASK: u8 = 1 << MOTION_PIN;

/// Supported USBmicro interface models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    U401,
    U421,
}

impl Model {
    /// All models the monitor will enumerate
    pub const ALL: [Model; 2] = [Model::U401, Model::U421];

    /// USB product id for this model
    pub fn product_id(self) -> u16 {
        match self {
            Model::U401 => 0x0190,
            Model::U421 => 0x0191,
        }
    }

    /// Identify a model from a USB vendor/product id pair
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Option<Self> {
        if vendor_id != USBMICRO_VENDOR_ID {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|model| model.product_id() == product_id)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::U401 => write!(f, "U401"),
            Model::U421 => write!(f, "U421"),
        }
    }
}

/// Commands understood by the U4x1 firmware
///
/// Each command travels as an 8-byte output report with the opcode in the
/// first byte and its arguments following.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Configure both ports as inputs with pull-ups
    InitPorts,
    /// Drive all of port A
    WriteA(u8),
    /// Drive all of port B
    WriteB(u8),
    /// Update port A through an AND mask followed by an OR mask
    WriteABit { and_mask: u8, or_mask: u8 },
    /// Update port B through an AND mask followed by an OR mask
    WriteBBit { and_mask: u8, or_mask: u8 },
    /// Read the pin state of port A
    ReadA,
    /// Read the pin state of port B
    ReadB,
}

impl Command {
    /// Firmware opcode for this command
    pub fn opcode(self) -> u8 {
        match self {
            Command::InitPorts => 0x00,
            Command::WriteA(_) => 0x01,
            Command::WriteB(_) => 0x02,
            Command::WriteABit { .. } => 0x03,
            Command::WriteBBit { .. } => 0x04,
            Command::ReadA => 0x05,
            Command::ReadB => 0x06,
        }
    }

    /// Argument bytes that follow the opcode
    pub fn arguments(self) -> [u8; 2] {
        match self {
            Command::WriteA(value) | Command::WriteB(value) => [value, 0],
            Command::WriteABit { and_mask, or_mask } | Command::WriteBBit { and_mask, or_mask } => {
                [and_mask, or_mask]
            }
            Command::InitPorts | Command::ReadA | Command::ReadB => [0, 0],
        }
    }

    /// Whether the firmware answers this command with a data byte
    pub fn returns_data(self) -> bool {
        matches!(self, Command::ReadA | Command::ReadB)
    }
}

/// Pin state of port A as returned by a single read
///
/// Read fresh on every poll and never retained, so there is no notion of a
/// previous value or of debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusByte(pub u8);

impl StatusByte {
    /// True when the motion pin is high; no other pin affects the result
    pub fn is_motion(self) -> bool {
        self.0 & MOTION_MASK != 0
    }

    /// State of a single pin (0-7); pins past 7 read as low
    pub fn pin(self, pin: u8) -> bool {
        pin < 8 && self.0 & (1 << pin) != 0
    }
}

impl From<u8> for StatusByte {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for StatusByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_mask_is_pin_a5() {
        assert_eq!(MOTION_MASK, 0x20);
    }

    #[test]
    fn test_model_from_ids() {
        assert_eq!(Model::from_ids(0x0de7, 0x0190), Some(Model::U401));
        assert_eq!(Model::from_ids(0x0de7, 0x0191), Some(Model::U421));
        assert_eq!(Model::from_ids(0x0de7, 0x1234), None);
        assert_eq!(Model::from_ids(0x1234, 0x0190), None);
    }

    #[test]
    fn test_opcodes_are_distinct() {
        let commands = [
            Command::InitPorts,
            Command::WriteA(0),
            Command::WriteB(0),
            Command::WriteABit {
                and_mask: 0,
                or_mask: 0,
            },
            Command::WriteBBit {
                and_mask: 0,
                or_mask: 0,
            },
            Command::ReadA,
            Command::ReadB,
        ];
        let mut opcodes: Vec<u8> = commands.iter().map(|c| c.opcode()).collect();
        opcodes.sort_unstable();
        opcodes.dedup();
        assert_eq!(opcodes.len(), commands.len());
    }

    #[test]
    fn test_status_pins() {
        let status = StatusByte(0b1010_0001);
        assert!(status.pin(0));
        assert!(!status.pin(1));
        assert!(status.pin(5));
        assert!(status.pin(7));
        assert!(!status.pin(8));
        assert!(status.is_motion());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StatusByte(0x20).to_string(), "0b00100000");
    }
}
