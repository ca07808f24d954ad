//! plex-motion-monitor
//!
//! Polls a USBmicro U4x1 interface wired to a motion sensor and records each
//! detection by updating the modification time of a sentinel file, where an
//! external presence check (e.g. a media server) can pick it up.
//!
//! Every failure is fatal: the process exits with a status that identifies
//! the failure class and relies on a supervisor to restart it.

mod config;
mod poller;
mod sentinel;
mod service;
mod usb;
mod watchdog;

use clap::Parser;
use common::{Error, ExitStatus, Result, setup_logging};
use config::MonitorSettings;
use poller::Poller;
use sentinel::Sentinel;
use service::SystemdNotifier;
use std::convert::Infallible;
use std::process::ExitCode;
use tracing::{error, info};
use usb::DeviceManager;
use watchdog::Watchdog;

#[derive(Parser, Debug)]
#[command(name = "plex-motion-monitor")]
#[command(
    author,
    version,
    about = "Record USB motion sensor detections as sentinel file timestamps"
)]
#[command(long_about = "
Polls a USBmicro U401/U421 interface every 250ms and touches a sentinel file
whenever the motion input (port A, pin 5) is high. Observers watch the file's
modification time; no content is ever written.

The sentinel lives at <temp dir>/plexMonitor/<NAME>, where <temp dir> is
$XDG_RUNTIME_DIR on Linux and $TMPDIR elsewhere.

EXAMPLES:
    # Monitor the device with serial ABC123
    plex-motion-monitor ABC123

    # Use a custom sentinel name
    plex-motion-monitor ABC123 HALLWAY

    # Find the serial of attached devices
    plex-motion-monitor --list-devices

EXIT STATUS:
    1    device not found, read error, or read timeout
    2    motion detected but the sentinel could not be updated
    255  usage error
")]
struct Args {
    /// Serial number of the USBmicro device to poll
    #[arg(value_name = "SERIAL", required_unless_present = "list_devices")]
    serial: Option<String>,

    /// Name of the sentinel file
    #[arg(value_name = "NAME", default_value = config::DEFAULT_NAME)]
    name: String,

    /// List attached USBmicro devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too
            let status = if e.use_stderr() {
                ExitStatus::Usage.into()
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return status;
        }
    };

    if let Err(e) = setup_logging(&args.log_level) {
        eprintln!("{}", e);
        return e.exit_status().into();
    }

    info!("plex-motion-monitor v{}", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            e.exit_status().into()
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.list_devices {
        let manager = DeviceManager::new(config::TRANSFER_TIMEOUT)?;
        return list_devices_mode(&manager);
    }

    let serial = args
        .serial
        .ok_or_else(|| Error::Usage("SERIAL is required".to_string()))?;
    let settings = MonitorSettings::new(serial, args.name, MonitorSettings::default_temp_root())?;

    match monitor(&settings)? {}
}

/// List USBmicro devices and exit
fn list_devices_mode(manager: &DeviceManager) -> Result<()> {
    let devices = manager.list_devices()?;

    if devices.is_empty() {
        println!("No USBmicro devices found.");
    } else {
        println!("Found {} USBmicro device(s):\n", devices.len());
        for device in devices {
            println!(
                "  {} - Bus {:03} Device {:03}",
                device.model, device.bus_number, device.device_address
            );
            match &device.serial_number {
                Some(serial) => println!("      Serial: {}", serial),
                None => println!("      Serial: (unreadable)"),
            }
        }
    }

    Ok(())
}

/// Set up the sentinel and device, then poll forever
fn monitor(settings: &MonitorSettings) -> Result<Infallible> {
    let sentinel = Sentinel::resolve(&settings.temp_root, &settings.name)?;

    let watchdog = Watchdog::spawn(
        settings.watchdog_timeout,
        watchdog::exit_on_expiry(settings.watchdog_timeout),
    )?;

    let manager = DeviceManager::new(settings.transfer_timeout)?;
    let device = manager.open_by_serial(&settings.serial)?;
    info!("Monitoring {} {}", device.model(), device.serial());

    let notifier = SystemdNotifier::from_env();
    if notifier.is_active() {
        info!("Running under systemd");
    }
    notifier.notify_ready();
    notifier.notify_status(&format!("Monitoring {}", settings.serial));

    Poller::new(
        device,
        sentinel,
        watchdog,
        settings.poll_interval,
        notifier,
    )
    .run()
}
