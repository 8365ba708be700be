use std::time::Duration;

use rand::Rng;

/// Retry policy: exponential backoff with jitter (spec §4.5). 4xx other
/// than 429 is non-retriable; that decision lives in the caller
/// ([`crate::gateway::Gateway`]), since it needs the HTTP status, which
/// this module doesn't see.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(200), max_delay: Duration::from_secs(10), multiplier: 2.0 }
    }
}

impl RetryPolicy {
    /// Delay before the given zero-indexed retry attempt, with up to
    /// ±25% jitter, or `retry_after` if the server specified one (429
    /// honors `Retry-After` ahead of the computed backoff).
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(retry_after) = retry_after {
            return retry_after;
        }

        let exp = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = exp.min(self.max_delay.as_secs_f64());
        let jitter_factor = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_secs_f64(capped * jitter_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_with_attempt_number() {
        let policy = RetryPolicy::default();
        let d0 = policy.delay_for(0, None);
        let d2 = policy.delay_for(2, None);
        assert!(d2 > d0);
    }

    #[test]
    fn delay_is_capped_at_max_delay() {
        let policy = RetryPolicy { max_attempts: 10, base_delay: Duration::from_millis(200), max_delay: Duration::from_secs(1), multiplier: 10.0 };
        let d = policy.delay_for(9, None);
        assert!(d <= Duration::from_secs(2));
    }

    #[test]
    fn retry_after_overrides_computed_backoff() {
        let policy = RetryPolicy::default();
        let d = policy.delay_for(0, Some(Duration::from_secs(30)));
        assert_eq!(d, Duration::from_secs(30));
    }
}
