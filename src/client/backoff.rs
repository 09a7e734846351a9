//! Reconnect bookkeeping: exponential delays, a retry budget and the one
//! pending timer.

use std::time::Duration;

/// Default first retry delay, doubled per failed attempt.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Default number of retries before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 15;

/// Longest single wait, whatever the attempt number. Also injected into
/// livepatch.js.
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl ReconnectPolicy {
    /// `base_delay * 2^attempt`, saturating.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Handle of a scheduled retry. A fired timer whose id is no longer pending
/// is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
pub struct ReconnectState {
    retry_count: u32,
    pending: Option<TimerId>,
    online: bool,
    next_id: u64,
}

impl ReconnectState {
    pub fn new() -> Self {
        Self {
            retry_count: 0,
            pending: None,
            online: true,
            next_id: 0,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn reset(&mut self) {
        self.retry_count = 0;
    }

    /// Book the next retry, or `None` when offline or out of budget.
    ///
    /// Replaces any pending timer; the old one goes stale.
    pub fn schedule(&mut self, policy: &ReconnectPolicy) -> Option<(TimerId, Duration)> {
        if !self.online || self.retry_count >= policy.max_retries {
            return None;
        }

        let delay = policy.delay_for(self.retry_count);
        self.retry_count += 1;

        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending = Some(id);
        Some((id, delay))
    }

    /// Forget the pending timer, returning it so the caller can clear it.
    pub fn cancel(&mut self) -> Option<TimerId> {
        self.pending.take()
    }

    /// `true` if `id` is the pending timer (which is then consumed).
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(16000));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(40), MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_DELAY);
    }

    #[test]
    fn test_schedule_until_budget_spent() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(10),
            max_retries: 3,
        };
        let mut state = ReconnectState::new();

        let delays: Vec<_> = std::iter::from_fn(|| state.schedule(&policy).map(|(_, d)| d)).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40)
            ]
        );
        assert_eq!(state.retry_count(), 3);
    }

    #[test]
    fn test_offline_never_schedules() {
        let mut state = ReconnectState::new();
        state.set_online(false);
        assert!(state.schedule(&ReconnectPolicy::default()).is_none());
        assert_eq!(state.retry_count(), 0);
    }

    #[test]
    fn test_stale_timer_ignored() {
        let policy = ReconnectPolicy::default();
        let mut state = ReconnectState::new();

        let (first, _) = state.schedule(&policy).unwrap();
        let (second, _) = state.schedule(&policy).unwrap();

        assert!(!state.fire(first));
        assert!(state.fire(second));
        assert!(!state.fire(second));
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut state = ReconnectState::new();
        let (id, _) = state.schedule(&ReconnectPolicy::default()).unwrap();

        assert_eq!(state.cancel(), Some(id));
        assert_eq!(state.pending(), None);
        assert!(!state.fire(id));
    }
}
