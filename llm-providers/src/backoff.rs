use std::time::Duration;

/// Exponential backoff between provider attempts for one batch. Applied
/// before moving to the next provider in the chain, never before retrying
/// the one that just failed.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base delay for the first fallthrough (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    pub multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl BackoffPolicy {
    /// Delay with exponential backoff and jitter. Attempt 0 is the first
    /// fallthrough.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = if attempt == 0 {
            self.base_delay_ms
        } else {
            let multiplied = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
            (multiplied as u64).min(self.max_delay_ms)
        };

        // Jitter to avoid synchronized retries across concurrent runs.
        let jitter_range = (exponential as f64 * self.jitter_factor) as u64;
        let jitter = fastrand::u64(0..=jitter_range);

        Duration::from_millis((exponential + jitter).min(self.max_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffPolicy {
        BackoffPolicy {
            base_delay_ms: 1000,
            max_delay_ms: 10000,
            multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_exponential_growth() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_delay_caps_at_max() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for(10), Duration::from_millis(10000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = BackoffPolicy {
            jitter_factor: 0.5,
            ..no_jitter()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }
}
