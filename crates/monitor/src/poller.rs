//! Poll loop
//!
//! Each iteration reads the status byte under the watchdog, touches the
//! sentinel if the motion bit is set, and sleeps for the poll interval. The
//! loop has no terminal state: it returns only when an iteration fails, and
//! the caller turns that into a process exit.

use crate::sentinel::Sentinel;
use crate::service::SystemdNotifier;
use crate::usb::StatusSource;
use crate::watchdog::Watchdog;
use common::Result;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Motion bit set; the sentinel was touched
    Motion,
    /// Motion bit clear; nothing was written
    Idle,
}

pub struct Poller<S> {
    source: S,
    sentinel: Sentinel,
    watchdog: Watchdog,
    interval: Duration,
    notifier: SystemdNotifier,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(
        source: S,
        sentinel: Sentinel,
        watchdog: Watchdog,
        interval: Duration,
        notifier: SystemdNotifier,
    ) -> Self {
        Self {
            source,
            sentinel,
            watchdog,
            interval,
            notifier,
        }
    }

    /// Read once and record motion if detected
    pub fn poll_once(&mut self) -> Result<Outcome> {
        let source = &mut self.source;
        let status = self.watchdog.guard(|| source.read_status())?;
        debug!("Port A status {}", status);

        if status.is_motion() {
            #[cfg(feature = "debug-output")]
            println!("Motion detected");

            self.sentinel.touch()?;
            Ok(Outcome::Motion)
        } else {
            #[cfg(feature = "debug-output")]
            println!();

            Ok(Outcome::Idle)
        }
    }

    /// Poll until an iteration fails
    pub fn run(mut self) -> Result<Infallible> {
        info!(
            "Polling every {:?}, read timeout {:?}, sentinel {}",
            self.interval,
            self.watchdog.timeout(),
            self.sentinel.path().display()
        );

        loop {
            self.poll_once()?;
            self.notifier.keepalive();
            std::thread::sleep(self.interval);
        }
    }
}
