//! Pipeline supervision with reconnect and backoff
//!
//! One pipeline attempt is: connect to the event socket, discover the layout
//! list, then feed events to a fresh `WindowLayoutTracker` until something
//! fails. Nothing survives an attempt; the layout configuration may have
//! changed while the compositor was unreachable, so discovery always reruns.
//!
//! ## Backoff Strategy
//!
//! After the k-th consecutive failed attempt the supervisor waits the k-th
//! configured delay (the last delay repeats). With the defaults:
//!
//! - Attempt 1: immediate
//! - Attempt 2: after 500ms
//! - Attempt 3: after 1s
//! - Attempt 4: after 2s
//! - Attempt 5: after 4s
//! - Fifth failure: give up
//!
//! The failure count resets as soon as one event has been handled after a
//! reconnect.

use std::time::Duration;

use perwindow_layout_config::ReconnectConfig;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::directory::LayoutDirectory;
use crate::error::PipelineError;
use crate::hypr_ipc::{Connector, Controller, EventSource};
use crate::tracker::{Outcome, WindowLayoutTracker};

/// Consecutive-failure counter with a delay schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    delays: Vec<Duration>,
    max_retries: u32,
    failures: u32,
}

impl Backoff {
    pub fn new(delays: Vec<Duration>, max_retries: u32) -> Self {
        let delays = if delays.is_empty() {
            vec![Duration::ZERO]
        } else {
            delays
        };
        Self {
            delays,
            max_retries,
            failures: 0,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(config.backoff.clone(), config.max_retries)
    }

    /// Consecutive failures since the last reset
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay before the retry that follows the `failures`-th failure
    pub fn delay_for(&self, failures: u32) -> Duration {
        let position = (failures.max(1) - 1) as usize;
        self.delays[position.min(self.delays.len() - 1)]
    }

    /// Count a failure; `None` once the retry budget is spent
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.failures > self.max_retries {
            return None;
        }
        Some(self.delay_for(self.failures))
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Where the supervisor is in its restart cycle
#[derive(Debug)]
enum State {
    Running,
    BackingOff(Duration),
    Terminated(PipelineError),
}

/// Runs pipeline attempts until the retry budget is exhausted
pub struct Supervisor<K, C> {
    connector: K,
    controller: C,
    backoff: Backoff,
}

impl<K, C> Supervisor<K, C>
where
    K: Connector,
    C: Controller,
{
    pub fn new(connector: K, controller: C, backoff: Backoff) -> Self {
        Self {
            connector,
            controller,
            backoff,
        }
    }

    /// Run until an unrecoverable error, which is returned
    ///
    /// Only `PipelineError::Startup` and `PipelineError::RetriesExhausted`
    /// are ever returned.
    pub async fn run(&mut self) -> PipelineError {
        let mut state = State::Running;

        loop {
            state = match state {
                State::Running => {
                    let err = self.run_attempt().await;
                    self.after_failure(err)
                }
                State::BackingOff(delay) => {
                    sleep(delay).await;
                    State::Running
                }
                State::Terminated(err) => return err,
            };
        }
    }

    fn after_failure(&mut self, err: PipelineError) -> State {
        if !err.is_retryable() {
            return State::Terminated(err);
        }

        match self.backoff.record_failure() {
            Some(delay) => {
                warn!(
                    attempt = self.backoff.failures(),
                    delay_ms = millis(delay),
                    "Pipeline failed: {}. Restarting...",
                    err
                );
                State::BackingOff(delay)
            }
            None => State::Terminated(PipelineError::RetriesExhausted {
                attempts: self.backoff.failures(),
                last: Box::new(err),
            }),
        }
    }

    /// One connect → discover → stream cycle; always ends in an error
    async fn run_attempt(&mut self) -> PipelineError {
        let mut source = match self.connector.connect().await {
            Ok(source) => source,
            Err(e) => return PipelineError::from_stream(e),
        };
        debug!("Event stream connected");

        let err = self.stream_events(&mut source).await;

        // Drops the pending read with the connection
        source.close().await;
        err
    }

    async fn stream_events(&mut self, source: &mut K::Source) -> PipelineError {
        let directory = match LayoutDirectory::discover(&self.controller).await {
            Ok(directory) => directory,
            Err(e) => return e,
        };
        info!(
            count = directory.len(),
            layouts = ?directory.names(),
            "Discovered keyboard layouts"
        );

        let mut tracker = WindowLayoutTracker::new(directory);

        let err = loop {
            let event = match source.read_event().await {
                Ok(event) => event,
                Err(e) => break PipelineError::from_stream(e),
            };
            trace!(name = %event.name, args = ?event.args, "Received event");

            match tracker.handle_event(&event, &self.controller).await {
                Ok(outcome) => report(&outcome),
                Err(e) => break e,
            }

            if self.backoff.failures() > 0 {
                info!(
                    failures = self.backoff.failures(),
                    "Event pipeline recovered"
                );
                self.backoff.reset();
            }
        };

        debug!(
            windows = tracker.tracked_windows(),
            focused = ?tracker.current_window(),
            layout = ?tracker.current_layout(),
            "Discarding window layouts"
        );
        err
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Switched { window, layout } => {
            debug!(window = %window, layout, "Switched layout");
        }
        Outcome::Recorded { window, layout } => {
            debug!(window = %window, layout, "Remembered layout");
        }
        Outcome::Forgotten { window } => {
            trace!(window = %window, "Forgot closed window");
        }
        Outcome::Unchanged | Outcome::Ignored => {}
    }
}
