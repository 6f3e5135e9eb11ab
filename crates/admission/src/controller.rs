use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimit;
use crate::error::{AdmissionError, Result};

/// Per-key accounting. Created on the first check of a key.
#[derive(Debug)]
struct RateLimitState {
    timestamps: VecDeque<Instant>,
    last_reset: Instant,
    burst_count: u32,
}

impl RateLimitState {
    fn new(now: Instant) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_reset: now,
            burst_count: 0,
        }
    }

    fn window_elapsed(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_reset) >= window
    }

    /// Wholesale reset once the fixed window has elapsed, then drop
    /// timestamps that fell out of the trailing window.
    fn refresh(&mut self, now: Instant, window: Duration) {
        if self.window_elapsed(now, window) {
            self.timestamps.clear();
            self.burst_count = 0;
            self.last_reset = now;
        }
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            self.timestamps.pop_front();
        }
    }

    fn in_window(&self) -> u32 {
        u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX)
    }
}

/// Two-tier throttle: a burst allowance consumed first, then a sliding window
/// over steady capacity.
///
/// State is not synchronized. Every method takes `&mut self`, so callers
/// sharing a controller across tasks must serialize access themselves.
pub struct AdmissionController<C: Clock = SystemClock> {
    limit: RateLimit,
    burst_size: u32,
    clock: C,
    states: HashMap<String, RateLimitState>,
}

impl AdmissionController<SystemClock> {
    pub fn new(limit: RateLimit) -> Result<Self> {
        Self::with_clock(limit, SystemClock)
    }
}

impl<C: Clock> AdmissionController<C> {
    pub fn with_clock(limit: RateLimit, clock: C) -> Result<Self> {
        limit.validate()?;
        let burst_size = limit.effective_burst();
        debug!(
            max_requests = limit.max_requests,
            window_ms = limit.time_window_ms,
            burst_size,
            "admission controller configured"
        );
        Ok(Self {
            limit,
            burst_size,
            clock,
            states: HashMap::new(),
        })
    }

    pub fn limit(&self) -> &RateLimit {
        &self.limit
    }

    pub fn burst_size(&self) -> u32 {
        self.burst_size
    }

    /// Decide whether one more request for `key` may proceed now, and record it
    /// if so.
    pub fn check_limit(&mut self, key: &str) -> bool {
        let now = self.clock.now();
        let window = self.limit.window();
        let state = self
            .states
            .entry(key.to_owned())
            .or_insert_with(|| RateLimitState::new(now));
        state.refresh(now, window);

        if state.burst_count < self.burst_size {
            state.burst_count += 1;
            state.timestamps.push_back(now);
            return true;
        }

        if state.in_window() < self.limit.max_requests {
            state.timestamps.push_back(now);
            return true;
        }

        debug!(key, in_window = state.in_window(), "admission rejected");
        false
    }

    pub fn remaining_requests(&mut self, key: &str) -> u32 {
        let max = self.limit.max_requests;
        self.refreshed(key)
            .map_or(max, |state| max.saturating_sub(state.in_window()))
    }

    pub fn remaining_burst(&mut self, key: &str) -> u32 {
        let burst = self.burst_size;
        self.refreshed(key)
            .map_or(burst, |state| burst.saturating_sub(state.burst_count))
    }

    /// Time until the fixed window of `key` rolls over. Zero for unseen keys.
    pub fn time_until_reset(&mut self, key: &str) -> Duration {
        let now = self.clock.now();
        let window = self.limit.window();
        self.refreshed(key).map_or(Duration::ZERO, |state| {
            (state.last_reset + window).saturating_duration_since(now)
        })
    }

    /// Build the rejection error for `key` from its current accounting.
    pub fn exceeded(&mut self, key: &str) -> AdmissionError {
        AdmissionError::RateLimitExceeded {
            key: key.to_owned(),
            retry_after: self.time_until_reset(key),
            remaining: self.remaining_requests(key),
        }
    }

    /// Run `action` if `key` is admitted, returning its output unchanged.
    pub async fn guard<F, Fut, T>(&mut self, key: &str, action: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.guard_with(key, action, || {}).await
    }

    /// Like [`guard`](Self::guard), calling `on_rejected` before failing.
    pub async fn guard_with<F, Fut, T, R>(
        &mut self,
        key: &str,
        action: F,
        on_rejected: R,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        R: FnOnce(),
    {
        if !self.check_limit(key) {
            on_rejected();
            return Err(self.exceeded(key));
        }
        Ok(action().await)
    }

    /// Forget all accounting for `key`.
    pub fn reset(&mut self, key: &str) {
        self.states.remove(key);
    }

    /// Drop keys whose window has fully elapsed. Returns how many were removed.
    pub fn prune_idle(&mut self) -> usize {
        let now = self.clock.now();
        let window = self.limit.window();
        let before = self.states.len();
        self.states
            .retain(|_, state| !state.window_elapsed(now, window));
        before - self.states.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }

    fn refreshed(&mut self, key: &str) -> Option<&RateLimitState> {
        let now = self.clock.now();
        let window = self.limit.window();
        let state = self.states.get_mut(key)?;
        state.refresh(now, window);
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn controller(max: u32, window_ms: u64, burst: u32) -> (AdmissionController<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let limit = RateLimit::new(max, Duration::from_millis(window_ms)).with_burst(burst);
        let ctl = AdmissionController::with_clock(limit, clock.clone()).unwrap();
        (ctl, clock)
    }

    #[test]
    fn burst_then_steady_then_reject() {
        let (mut ctl, _clock) = controller(5, 1000, 2);

        assert!(ctl.check_limit("u"));
        assert!(ctl.check_limit("u"));
        assert_eq!(ctl.remaining_burst("u"), 0);

        for _ in 0..3 {
            assert!(ctl.check_limit("u"));
        }
        assert!(!ctl.check_limit("u"));
        assert_eq!(ctl.remaining_requests("u"), 0);
    }

    #[test]
    fn keys_are_independent() {
        let (mut ctl, _clock) = controller(1, 1000, 0);
        assert!(ctl.check_limit("a"));
        assert!(!ctl.check_limit("a"));
        assert!(ctl.check_limit("b"));
    }

    #[test]
    fn unseen_key_reports_full_capacity_without_tracking() {
        let (mut ctl, _clock) = controller(5, 1000, 2);
        assert_eq!(ctl.remaining_requests("ghost"), 5);
        assert_eq!(ctl.remaining_burst("ghost"), 2);
        assert_eq!(ctl.time_until_reset("ghost"), Duration::ZERO);
        assert_eq!(ctl.tracked_keys(), 0);
    }

    #[test]
    fn capacity_returns_after_idle_window() {
        let (mut ctl, clock) = controller(3, 1000, 1);
        while ctl.check_limit("k") {}
        assert_eq!(ctl.remaining_requests("k"), 0);

        clock.advance(Duration::from_millis(1000));

        assert_eq!(ctl.remaining_requests("k"), 3);
        assert_eq!(ctl.remaining_burst("k"), 1);
        assert!(ctl.check_limit("k"));
    }

    #[test]
    fn time_until_reset_counts_down_from_first_check() {
        let (mut ctl, clock) = controller(2, 1000, 0);
        assert!(ctl.check_limit("k"));
        clock.advance(Duration::from_millis(300));
        assert_eq!(ctl.time_until_reset("k"), Duration::from_millis(700));
    }

    #[test]
    fn burst_larger_than_capacity_is_bounded_by_sum() {
        let (mut ctl, _clock) = controller(2, 1000, 5);
        let admitted = (0..20).filter(|_| ctl.check_limit("k")).count();
        assert!(admitted <= 7, "admitted {admitted}");
        assert_eq!(admitted, 5);
    }

    #[test]
    fn reset_forgets_key() {
        let (mut ctl, _clock) = controller(1, 1000, 0);
        assert!(ctl.check_limit("k"));
        assert!(!ctl.check_limit("k"));
        ctl.reset("k");
        assert!(ctl.check_limit("k"));
    }

    #[test]
    fn prune_idle_drops_only_elapsed_keys() {
        let (mut ctl, clock) = controller(5, 1000, 0);
        ctl.check_limit("old");
        clock.advance(Duration::from_millis(600));
        ctl.check_limit("fresh");
        clock.advance(Duration::from_millis(500));

        assert_eq!(ctl.prune_idle(), 1);
        assert_eq!(ctl.tracked_keys(), 1);
        assert_eq!(ctl.remaining_requests("fresh"), 4);
    }

    #[tokio::test]
    async fn guard_passes_output_through() {
        let (mut ctl, _clock) = controller(1, 1000, 0);
        let out = ctl.guard("k", || async { 42 }).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn guard_rejection_runs_callback_and_reports_retry() {
        let (mut ctl, clock) = controller(1, 1000, 0);
        ctl.check_limit("k");
        clock.advance(Duration::from_millis(250));

        let mut rejected = false;
        let err = ctl
            .guard_with("k", || async { "ran" }, || rejected = true)
            .await
            .unwrap_err();

        assert!(rejected);
        match err {
            AdmissionError::RateLimitExceeded {
                key,
                retry_after,
                remaining,
            } => {
                assert_eq!(key, "k");
                assert_eq!(retry_after, Duration::from_millis(750));
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn guard_does_not_run_rejected_action() {
        let (mut ctl, _clock) = controller(1, 1000, 0);
        ctl.check_limit("k");
        let ran = std::cell::Cell::new(false);
        let flag = &ran;
        let result = ctl.guard("k", move || async move { flag.set(true) }).await;
        assert!(result.is_err());
        assert!(!ran.get());
    }
}
