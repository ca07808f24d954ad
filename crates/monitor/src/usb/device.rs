//! USBmicro device handle
//!
//! Wraps an opened [`rusb::DeviceHandle`] with interface 0 claimed. Each
//! command is sent as a HID SET_REPORT control transfer and answered on the
//! interrupt IN endpoint.

use crate::usb::{StatusSource, describe_rusb_error};
use common::{Error, Result};
use protocol::{
    Command, INTERRUPT_IN_ENDPOINT, Model, REPORT_SIZE, StatusByte, decode_read_response,
    encode_command,
};
use rusb::{Context, DeviceHandle, Direction, Recipient, RequestType};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Interface carrying the HID reports
const HID_INTERFACE: u8 = 0;

/// HID class request: SET_REPORT
const HID_SET_REPORT: u8 = 0x09;

/// wValue for SET_REPORT: output report, id 0
const HID_OUTPUT_REPORT: u16 = 0x0200;

/// An opened USBmicro interface
pub struct UsbMicroDevice {
    handle: DeviceHandle<Context>,
    model: Model,
    serial: String,
    timeout: Duration,
}

impl UsbMicroDevice {
    /// Take ownership of an opened handle and claim the HID interface
    pub(crate) fn claim(
        mut handle: DeviceHandle<Context>,
        model: Model,
        serial: String,
        timeout: Duration,
    ) -> Result<Self> {
        // Not supported on every platform; claiming reports the real failure
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", e);
        }

        handle.claim_interface(HID_INTERFACE).map_err(|e| {
            Error::Usb(format!(
                "Failed to claim interface {} on {}: {}",
                HID_INTERFACE,
                serial,
                describe_rusb_error(e)
            ))
        })?;

        debug!("Claimed interface {} on {} {}", HID_INTERFACE, model, serial);
        Ok(Self {
            handle,
            model,
            serial,
            timeout,
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Read the pin state of port A
    pub fn read_port_a(&mut self) -> Result<StatusByte> {
        self.transact(Command::ReadA).map(StatusByte)
    }

    /// Send a data-returning command and decode its response byte
    fn transact(&mut self, command: Command) -> Result<u8> {
        if !command.returns_data() {
            return Err(Error::Usb(format!("{:?} does not return data", command)));
        }

        let request_type =
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface);
        let report = encode_command(command);

        trace!("Sending {:?} report {:02x?}", command, report);
        self.handle
            .write_control(
                request_type,
                HID_SET_REPORT,
                HID_OUTPUT_REPORT,
                u16::from(HID_INTERFACE),
                &report,
                self.timeout,
            )
            .map_err(|e| {
                Error::Read(format!(
                    "sending {:?} to {}: {}",
                    command,
                    self.serial,
                    describe_rusb_error(e)
                ))
            })?;

        let mut response = [0u8; REPORT_SIZE];
        let len = self
            .handle
            .read_interrupt(INTERRUPT_IN_ENDPOINT, &mut response, self.timeout)
            .map_err(|e| {
                Error::Read(format!(
                    "reading {:?} response from {}: {}",
                    command,
                    self.serial,
                    describe_rusb_error(e)
                ))
            })?;

        trace!("Received {:?} response {:02x?}", command, &response[..len]);
        Ok(decode_read_response(command, &response[..len])?)
    }
}

impl StatusSource for UsbMicroDevice {
    fn read_status(&mut self) -> Result<StatusByte> {
        self.read_port_a()
    }
}

impl Drop for UsbMicroDevice {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(HID_INTERFACE) {
            warn!("Failed to release interface {}: {}", HID_INTERFACE, e);
        }
    }
}
