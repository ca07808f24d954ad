//! USB subsystem
//!
//! Talks to USBmicro U4x1 interfaces through libusb:
//! - Device enumeration and lookup by serial number
//! - Port reads over the HID report protocol
//!
//! One [`DeviceManager`] owns the libusb context for the life of the process.
//! The poll loop reads through the [`StatusSource`] trait so it can be driven
//! by something other than real hardware.

pub mod device;
pub mod manager;

pub use device::UsbMicroDevice;
pub use manager::DeviceManager;

use common::Result;
use protocol::StatusByte;

/// Source of port status bytes
pub trait StatusSource {
    /// Perform one blocking read of the status byte
    fn read_status(&mut self) -> Result<StatusByte>;
}

/// Describe a libusb failure for diagnostics
pub(crate) fn describe_rusb_error(e: rusb::Error) -> String {
    match e {
        rusb::Error::NoDevice => "device disconnected".to_string(),
        rusb::Error::Access => "permission denied (check udev rules)".to_string(),
        rusb::Error::Timeout => "transfer timed out".to_string(),
        rusb::Error::Pipe => "endpoint stalled".to_string(),
        other => other.to_string(),
    }
}
