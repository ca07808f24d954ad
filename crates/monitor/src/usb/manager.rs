//! USB device manager
//!
//! Owns the libusb context and resolves USBmicro interfaces by serial
//! number. The context is created once at startup and lives as long as the
//! manager; every opened device keeps its own reference to it.

use crate::usb::{UsbMicroDevice, describe_rusb_error};
use common::{Error, Result};
use protocol::Model;
use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, info, warn};

/// An attached USBmicro interface as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub model: Model,
    pub bus_number: u8,
    pub device_address: u8,
    /// Serial string, if the device could be opened and reports one
    pub serial_number: Option<String>,
}

/// USB device manager
pub struct DeviceManager {
    /// USB context for device operations
    context: Context,
    /// Timeout applied to every transfer on opened devices
    transfer_timeout: Duration,
}

impl DeviceManager {
    /// Create the USB context
    pub fn new(transfer_timeout: Duration) -> Result<Self> {
        let context = Context::new().map_err(|e| {
            Error::Usb(format!(
                "Failed to create USB context: {}",
                describe_rusb_error(e)
            ))
        })?;

        debug!("USB context created");
        Ok(Self {
            context,
            transfer_timeout,
        })
    }

    /// List every attached USBmicro interface
    pub fn list_devices(&self) -> Result<Vec<DeviceSummary>> {
        let mut found = Vec::new();

        for (device, model) in self.usbmicro_devices()? {
            let serial_number = match device.open() {
                Ok(handle) => read_serial(&device, &handle),
                Err(e) => {
                    warn!(
                        "Cannot open {} at bus {:03} device {:03}: {}",
                        model,
                        device.bus_number(),
                        device.address(),
                        describe_rusb_error(e)
                    );
                    None
                }
            };

            found.push(DeviceSummary {
                model,
                bus_number: device.bus_number(),
                device_address: device.address(),
                serial_number,
            });
        }

        debug!("Enumerated {} USBmicro devices", found.len());
        Ok(found)
    }

    /// Open the interface whose serial number is `serial`
    ///
    /// Only the first match is used. Devices that cannot be opened are
    /// skipped with a warning.
    pub fn open_by_serial(&self, serial: &str) -> Result<UsbMicroDevice> {
        for (device, model) in self.usbmicro_devices()? {
            let handle = match device.open() {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(
                        "Skipping {} at bus {:03} device {:03}: {}",
                        model,
                        device.bus_number(),
                        device.address(),
                        describe_rusb_error(e)
                    );
                    continue;
                }
            };

            if read_serial(&device, &handle).as_deref() == Some(serial) {
                info!(
                    "Found {} {} at bus {:03} device {:03}",
                    model,
                    serial,
                    device.bus_number(),
                    device.address()
                );
                return UsbMicroDevice::claim(
                    handle,
                    model,
                    serial.to_string(),
                    self.transfer_timeout,
                );
            }
        }

        Err(Error::DeviceNotFound(serial.to_string()))
    }

    /// Attached devices with a USBmicro vendor/product id
    fn usbmicro_devices(&self) -> Result<Vec<(Device<Context>, Model)>> {
        let devices = self.context.devices().map_err(|e| {
            Error::Usb(format!(
                "Failed to enumerate devices: {}",
                describe_rusb_error(e)
            ))
        })?;

        Ok(devices
            .iter()
            .filter_map(|device| {
                let descriptor = device.device_descriptor().ok()?;
                let model = Model::from_ids(descriptor.vendor_id(), descriptor.product_id())?;
                Some((device, model))
            })
            .collect())
    }
}

/// Read the serial string descriptor
fn read_serial(device: &Device<Context>, handle: &DeviceHandle<Context>) -> Option<String> {
    let index = device.device_descriptor().ok()?.serial_number_string_index()?;
    match handle.read_string_descriptor_ascii(index) {
        Ok(serial) => Some(serial.trim().to_string()),
        Err(e) => {
            debug!("Could not read serial string: {}", e);
            None
        }
    }
}
