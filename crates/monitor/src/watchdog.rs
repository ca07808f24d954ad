//! Read watchdog
//!
//! A supervisor thread enforces a hard deadline on each blocking device
//! read. The poll loop arms it before the read and disarms it once the read
//! returns. If the deadline passes first, the expiry action runs once; in
//! production that action logs and terminates the process, so control never
//! returns to the stalled read.

use common::Error;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error};

type ExpiryAction = Box<dyn Fn() + Send + 'static>;

#[derive(Debug, Default)]
struct State {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deadline supervisor for blocking reads
pub struct Watchdog {
    shared: Arc<Shared>,
    timeout: Duration,
    thread: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Start the supervisor thread
    pub fn spawn<F>(timeout: Duration, on_expire: F) -> std::io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let supervisor = Arc::clone(&shared);
        let on_expire: ExpiryAction = Box::new(on_expire);

        let thread = std::thread::Builder::new()
            .name("read-watchdog".to_string())
            .spawn(move || supervise(&supervisor, on_expire))?;

        debug!("Watchdog started with {:?} timeout", timeout);
        Ok(Self {
            shared,
            timeout,
            thread: Some(thread),
        })
    }

    /// Deadline applied to each guarded call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arm the watchdog; it is disarmed when the returned guard drops
    pub fn arm(&self) -> Armed<'_> {
        self.shared.lock().deadline = Some(Instant::now() + self.timeout);
        self.shared.wake.notify_one();
        Armed { watchdog: self }
    }

    /// Run `op` under the deadline
    pub fn guard<T>(&self, op: impl FnOnce() -> T) -> T {
        let _armed = self.arm();
        op()
    }

    fn disarm(&self) {
        self.shared.lock().deadline = None;
        self.shared.wake.notify_one();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_one();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Watchdog thread panicked");
            }
        }
    }
}

/// An armed watchdog
#[must_use = "the watchdog is disarmed as soon as this guard drops"]
pub struct Armed<'a> {
    watchdog: &'a Watchdog,
}

impl Drop for Armed<'_> {
    fn drop(&mut self) {
        self.watchdog.disarm();
    }
}

fn supervise(shared: &Shared, on_expire: ExpiryAction) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }

        match state.deadline {
            None => {
                state = shared.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    // One shot: a stalled read fires exactly once
                    state.deadline = None;
                    drop(state);
                    on_expire();
                    state = shared.lock();
                } else {
                    state = shared
                        .wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }
}

/// Expiry action used in production: report and exit with status 1
pub fn exit_on_expiry(timeout: Duration) -> impl Fn() + Send + 'static {
    move || {
        let err = Error::Timeout(timeout);
        error!("{}", err);
        std::process::exit(err.exit_status().code());
    }
}
