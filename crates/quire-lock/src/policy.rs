use std::time::Duration;

use rand::Rng;

/// Retry and expiry settings for lock acquisition.
#[derive(Clone, Debug, PartialEq)]
pub struct LockPolicy {
    /// Total acquisition attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub growth: f64,
    /// Upper bound on the exponential part of the delay.
    pub max_delay: Duration,
    /// Uniform random delay added on top, in `[0, jitter]`.
    pub jitter: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            growth: 2.0,
            max_delay: Duration::from_secs(5),
            jitter: Duration::from_millis(100),
        }
    }
}

impl LockPolicy {
    /// Exponential part of the delay after failed attempt `attempt`
    /// (zero-based): `min(base × growth^attempt, max_delay)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.base_delay.as_secs_f64() * self.growth.powi(exponent);
        if !scaled.is_finite() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
            .unwrap_or(self.max_delay)
    }

    /// Full delay after failed attempt `attempt`, including jitter.
    pub fn delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(0..=jitter_ms))
        };
        self.backoff(attempt) + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = LockPolicy::default();
        assert_eq!(p.max_attempts, 10);
        assert_eq!(p.base_delay, Duration::from_millis(100));
        assert_eq!(p.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn backoff_grows_then_caps() {
        let p = LockPolicy {
            base_delay: Duration::from_millis(100),
            growth: 2.0,
            max_delay: Duration::from_millis(1000),
            ..LockPolicy::default()
        };
        assert_eq!(p.backoff(0), Duration::from_millis(100));
        assert_eq!(p.backoff(1), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(800));
        assert_eq!(p.backoff(4), Duration::from_millis(1000));
        assert_eq!(p.backoff(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn jitter_is_bounded() {
        let p = LockPolicy {
            base_delay: Duration::from_millis(10),
            growth: 1.0,
            jitter: Duration::from_millis(5),
            ..LockPolicy::default()
        };
        let mut rng = rand::thread_rng();
        for attempt in 0..50 {
            let d = p.delay(attempt, &mut rng);
            assert!(d >= Duration::from_millis(10));
            assert!(d <= Duration::from_millis(15));
        }
    }

    #[test]
    fn zero_jitter() {
        let p = LockPolicy {
            jitter: Duration::ZERO,
            ..LockPolicy::default()
        };
        let mut rng = rand::thread_rng();
        assert_eq!(p.delay(0, &mut rng), p.base_delay);
    }
}
