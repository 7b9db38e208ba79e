use super::{GuardApi, GuardError, PendingRequest, PollOutcome, Resolution, Result};
use crate::config::PollConfig;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Wait schedule for resolving a pending request
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Fraction of the interval added as random jitter, in `[0, 1]`
    pub jitter: f64,
    /// Give up after this long; the server expires requests after ~10 minutes
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(30),
            multiplier: 1.5,
            jitter: 0.1,
            deadline: Duration::from_secs(600),
        }
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            multiplier: config.multiplier,
            jitter: config.jitter,
            deadline: Duration::from_secs(config.deadline_secs),
        }
    }
}

impl PollPolicy {
    /// Scheduled wait after the `retry`-th pending response (0-based), before jitter
    pub fn interval(&self, retry: u32) -> Duration {
        let scaled = self.initial_interval.as_secs_f64() * self.multiplier.powi(retry as i32);
        Duration::from_secs_f64(scaled.min(self.max_interval.as_secs_f64()))
    }

    /// Jitter is additive so the wait never drops below the scheduled interval
    fn delay(&self, retry: u32) -> Duration {
        let base = self.interval(retry);
        if self.jitter <= 0.0 {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter);
        base + base.mul_f64(extra)
    }
}

/// Resolves pending requests by polling `getResponse`.
///
/// Stops at the first non-204 status, at the deadline, or when the
/// cancellation token fires, whichever comes first.
#[derive(Clone)]
pub struct Poller {
    api: Arc<dyn GuardApi>,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(api: Arc<dyn GuardApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub async fn wait(
        &self,
        token: &str,
        request: PendingRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let request_id = request.request_id;
        let started = Instant::now();
        let deadline = started
            .checked_add(self.policy.deadline)
            .unwrap_or_else(far_future);
        let mut retry = 0u32;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.cancelled(&request_id));
                }
                _ = sleep_until(deadline) => {
                    return Err(self.expired(&request_id, started));
                }
                outcome = self.api.get_response(token, &request_id) => outcome?,
            };

            match outcome {
                PollOutcome::Resolved(resolution) => {
                    tracing::info!(
                        "Request {} finished as {:?} (HTTP {}) after {} poll(s)",
                        request_id,
                        resolution.state(),
                        resolution.status,
                        retry + 1
                    );
                    return Ok(resolution);
                }
                PollOutcome::Pending => {
                    let delay = self.policy.delay(retry);
                    tracing::debug!(
                        "Request {} still pending, next poll in {:?}",
                        request_id,
                        delay
                    );
                    retry += 1;

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(self.cancelled(&request_id));
                        }
                        _ = sleep_until(deadline) => {
                            return Err(self.expired(&request_id, started));
                        }
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn cancelled(&self, request_id: &str) -> GuardError {
        tracing::warn!("Stopped waiting for request {}: cancelled", request_id);
        GuardError::Cancelled {
            request_id: request_id.to_string(),
        }
    }

    fn expired(&self, request_id: &str, started: Instant) -> GuardError {
        let waited_secs = started.elapsed().as_secs();
        tracing::warn!(
            "Stopped waiting for request {} after {}s: deadline reached",
            request_id,
            waited_secs
        );
        GuardError::DeadlineExceeded {
            request_id: request_id.to_string(),
            waited_secs,
        }
    }
}

/// Roughly 30 years out, the same horizon tokio uses for "never"
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}
