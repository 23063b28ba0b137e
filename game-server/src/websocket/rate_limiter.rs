use std::time::{Duration, Instant};

pub const DEFAULT_MAX_TOKENS: u32 = 30;
pub const DEFAULT_REFILL_RATE: Duration = Duration::from_secs(2);

/// Token bucket, one per connection.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::new_with_limits(DEFAULT_MAX_TOKENS, DEFAULT_REFILL_RATE)
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Takes a token if one is available.
    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens();

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self) {
        let elapsed = self.last_refill.elapsed();
        if self.refill_rate.is_zero() || elapsed < self.refill_rate {
            return;
        }

        let intervals = elapsed.as_nanos() / self.refill_rate.as_nanos();
        let tokens_to_add = u32::try_from(intervals).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(tokens_to_add).min(self.max_tokens);

        if self.tokens == self.max_tokens {
            self.last_refill = Instant::now();
        } else {
            // partial interval carries over
            self.last_refill += self.refill_rate * tokens_to_add;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens();
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_full() {
        let mut limiter = RateLimiter::new();
        assert_eq!(limiter.remaining_tokens(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_exhausts_bucket() {
        let mut limiter = RateLimiter::new_with_limits(3, Duration::from_secs(60));
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());
        assert_eq!(limiter.remaining_tokens(), 0);
    }

    #[tokio::test]
    async fn test_refills_over_time() {
        let mut limiter = RateLimiter::new_with_limits(2, Duration::from_millis(10));
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(limiter.remaining_tokens() >= 1);
        assert!(limiter.check_rate_limit());
    }

    #[tokio::test]
    async fn test_refill_capped_at_max() {
        let mut limiter = RateLimiter::new_with_limits(2, Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(limiter.remaining_tokens(), 2);
    }
}
