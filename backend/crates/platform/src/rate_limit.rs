//! Login Lockout Policy
//!
//! Failed logins are counted over a rolling window; once the count for a
//! key reaches the threshold, further attempts are refused until the oldest
//! failure ages out. There is no explicit unlock.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Lockout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures within the window that trigger a lockout
    pub max_attempts: u32,
    /// Rolling window over which failures are counted
    pub window: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Oldest timestamp (exclusive) that still counts at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX);
        now.checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether `recent_failures` failures inside the window lock the key
    pub fn is_locked(&self, recent_failures: u32) -> bool {
        recent_failures >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.window, Duration::from_secs(900));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = LockoutPolicy::new(5, 900);
        assert!(!policy.is_locked(0));
        assert!(!policy.is_locked(4));
        assert!(policy.is_locked(5));
        assert!(policy.is_locked(6));
    }

    #[test]
    fn test_window_start() {
        let policy = LockoutPolicy::new(5, 900);
        let now = Utc::now();
        assert_eq!(now - policy.window_start(now), chrono::Duration::seconds(900));
    }
}
