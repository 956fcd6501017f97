use poll_promise::Promise;
use tracing::{error, info};

use crate::interval::Interval;
use crate::request::{take_ready, RequestManager, StartedTime};
use crate::Result;

/// Seconds between `/started` polls.
pub const STARTED_POLL_PERIOD: f64 = 1.0;

/// Notices when the generator server restarts by watching the start time it
/// reports. The first time seen is the baseline; any later difference means
/// the viewer should reload from scratch.
pub struct StartedWatcher {
    interval: Interval,
    baseline: Option<String>,
    pending: Option<Promise<Result<StartedTime>>>,
}

impl Default for StartedWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StartedWatcher {
    pub fn new() -> Self {
        Self {
            interval: Interval::new(STARTED_POLL_PERIOD),
            baseline: None,
            pending: None,
        }
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// Returns true once the server has restarted.
    pub fn poll(&mut self, requests: &RequestManager, time: f64) -> bool {
        let mut restarted = false;

        if let Some(result) = take_ready(&mut self.pending) {
            match result {
                Ok(started) => match &self.baseline {
                    None => {
                        info!("server started at {}", started.time);
                        self.baseline = Some(started.time);
                    }
                    Some(baseline) if *baseline != started.time => {
                        info!("server restarted ({baseline} -> {})", started.time);
                        restarted = true;
                    }
                    Some(_) => {}
                },
                Err(err) => error!("polling server start time: {err}"),
            }
        }

        let first = self.baseline.is_none() && self.pending.is_none();
        if self.pending.is_none() && (self.interval.tick(time) || first) {
            self.pending = Some(requests.started_time());
        }

        restarted
    }
}
