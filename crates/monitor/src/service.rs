//! Systemd service integration
//!
//! A stalled or failed read kills the monitor, so recovery depends on a
//! supervisor restarting it. Under systemd this module reports readiness and
//! sends watchdog keepalives over the sd-notify socket. Without
//! `NOTIFY_SOCKET` every call is a no-op, and a failed notification is only
//! logged.

use std::env;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// sd-notify client
#[derive(Debug)]
pub struct SystemdNotifier {
    socket_path: Option<PathBuf>,
    keepalive_interval: Option<Duration>,
    last_keepalive: Option<Instant>,
}

impl SystemdNotifier {
    /// Configure from `NOTIFY_SOCKET` and `WATCHDOG_USEC`
    pub fn from_env() -> Self {
        let socket_path = env::var_os("NOTIFY_SOCKET").map(PathBuf::from);
        let watchdog_usec = env::var("WATCHDOG_USEC").ok().and_then(|s| s.parse().ok());
        Self::new(socket_path, watchdog_usec)
    }

    /// Keepalives go out at half the systemd watchdog timeout
    pub fn new(socket_path: Option<PathBuf>, watchdog_usec: Option<u64>) -> Self {
        let keepalive_interval = socket_path
            .as_ref()
            .and(watchdog_usec)
            .map(|usec| Duration::from_micros(usec / 2));

        if let Some(interval) = keepalive_interval {
            info!("Systemd watchdog enabled, keepalive every {:?}", interval);
        }

        Self {
            socket_path,
            keepalive_interval,
            last_keepalive: None,
        }
    }

    /// A notifier that never sends anything
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Check if running under systemd
    pub fn is_active(&self) -> bool {
        self.socket_path.is_some()
    }

    /// Notify systemd that the service is ready
    pub fn notify_ready(&self) {
        if self.send("READY=1") {
            info!("Notified systemd: service ready");
        }
    }

    /// Status line shown by `systemctl status`
    pub fn notify_status(&self, status: &str) {
        if self.send(&format!("STATUS={}", status)) {
            debug!("Notified systemd: status = {}", status);
        }
    }

    /// Send a watchdog keepalive if one is due
    pub fn keepalive(&mut self) {
        let Some(interval) = self.keepalive_interval else {
            return;
        };

        let now = Instant::now();
        if self
            .last_keepalive
            .is_some_and(|last| now.duration_since(last) < interval)
        {
            return;
        }

        if self.send("WATCHDOG=1") {
            debug!("Notified systemd: watchdog keepalive");
        }
        self.last_keepalive = Some(now);
    }

    /// Returns whether a message was sent
    fn send(&self, message: &str) -> bool {
        let Some(path) = &self.socket_path else {
            return false;
        };

        match send_datagram(path, message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send '{}' to systemd: {}", message, e);
                false
            }
        }
    }
}

fn send_datagram(path: &Path, message: &str) -> io::Result<()> {
    let socket = UnixDatagram::unbound()?;
    socket.send_to(message.as_bytes(), path)?;
    Ok(())
}
