//! Rest timer between sets.
//!
//! The timer is split in two layers:
//! - [`RestTimer`]: a pure counter advanced by explicit `tick()` calls,
//!   so the state machine is fully deterministic and testable.
//! - [`Ticker`]: a background thread delivering one tick per second to a
//!   [`SharedTimer`]. Shutdown joins the thread, so no tick can be
//!   observed after it returns.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Format a second count as `minutes:seconds`, seconds zero-padded
pub fn format_elapsed(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Free-running rest counter
///
/// Advances one second per `tick()` while running. Starting a running
/// timer and stopping a stopped one are no-ops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestTimer {
    elapsed_seconds: u32,
    running: bool,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin counting
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Halt counting; the elapsed value stays readable
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Zero the counter regardless of running state
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
    }

    /// Advance one second if running
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_seconds += 1;
        }
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Display string, e.g. `1:05`
    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

/// Timer handle shared between the session and the tick source
///
/// All accessors take the lock for the duration of one operation, so a
/// `stop()` that has returned is guaranteed to be seen by the next tick.
#[derive(Clone, Debug, Default)]
pub struct SharedTimer {
    inner: Arc<Mutex<RestTimer>>,
}

impl SharedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RestTimer> {
        // The timer operations cannot panic, so a poisoned lock still
        // holds a consistent value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn tick(&self) {
        self.lock().tick();
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.lock().elapsed_seconds()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    pub fn display(&self) -> String {
        self.lock().display()
    }
}

/// Background tick source driving a shared timer
pub struct Ticker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a ticker advancing `timer` once per second
    pub fn spawn(timer: SharedTimer) -> Self {
        Self::with_interval(timer, Duration::from_secs(1))
    }

    /// Spawn with a custom tick interval (shortened in tests)
    pub fn with_interval(timer: SharedTimer, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => timer.tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        tracing::debug!("Ticker started ({:?} interval)", interval);
        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stop the tick source and wait for the thread to exit
    ///
    /// After this returns, the shared timer will not advance again.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::debug!("Ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
