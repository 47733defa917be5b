//! Fixed-rate background schedule with an explicit stop handle.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Stops a running [`Ticker`] when asked to, or when dropped.
#[derive(Debug)]
pub struct StopHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl StopHandle {
    /// Stop the schedule and wait for the current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn shutdown(&mut self) {
        // Disconnecting the channel wakes the ticker immediately.
        self.stop_tx.take();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs a closure on a fixed-rate schedule in its own thread.
pub struct Ticker;

impl Ticker {
    /// Call `tick` once immediately, then every `interval`, until the
    /// closure returns [`ControlFlow::Break`] or the handle is stopped.
    ///
    /// Deadlines are computed from the start time so slow ticks do not
    /// accumulate drift. A tick that overruns its slot is not repeated.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> std::io::Result<StopHandle>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut deadline = Instant::now();
                loop {
                    if tick().is_break() {
                        return;
                    }

                    deadline += interval;
                    let now = Instant::now();
                    if deadline < now {
                        deadline = now + interval;
                    }

                    match stop_rx.recv_timeout(deadline - now) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
            })?;

        Ok(StopHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }
}
