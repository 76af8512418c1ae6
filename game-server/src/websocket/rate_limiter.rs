use std::time::Instant;

/// Token bucket applied to inbound frames of one connection.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: f64,
    max_tokens: f64,
    per_second: f64,
    last_refill: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub burst: u32,
    pub per_second: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            burst: 30,
            per_second: 5,
        }
    }
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self::starting_at(limits, Instant::now())
    }

    fn starting_at(limits: RateLimits, now: Instant) -> Self {
        let max_tokens = f64::from(limits.burst.max(1));
        Self {
            tokens: max_tokens,
            max_tokens,
            per_second: f64::from(limits.per_second),
            last_refill: now,
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.per_second).min(self.max_tokens);
        self.last_refill = now;
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill(Instant::now());
        self.tokens as u32
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_refuse() {
        let limits = RateLimits {
            burst: 3,
            per_second: 1,
        };
        let start = Instant::now();
        let mut limiter = RateLimiter::starting_at(limits, start);

        assert!(limiter.check_at(start));
        assert!(limiter.check_at(start));
        assert!(limiter.check_at(start));
        assert!(!limiter.check_at(start));
    }

    #[test]
    fn test_refills_over_time() {
        let limits = RateLimits {
            burst: 2,
            per_second: 4,
        };
        let start = Instant::now();
        let mut limiter = RateLimiter::starting_at(limits, start);
        assert!(limiter.check_at(start));
        assert!(limiter.check_at(start));
        assert!(!limiter.check_at(start));

        // one token every 250ms
        let later = start + Duration::from_millis(250);
        assert!(limiter.check_at(later));
        assert!(!limiter.check_at(later));
    }

    #[test]
    fn test_never_exceeds_burst() {
        let limits = RateLimits {
            burst: 2,
            per_second: 100,
        };
        let start = Instant::now();
        let mut limiter = RateLimiter::starting_at(limits, start);
        let much_later = start + Duration::from_secs(60);
        assert!(limiter.check_at(much_later));
        assert!(limiter.check_at(much_later));
        assert!(!limiter.check_at(much_later));
    }
}
