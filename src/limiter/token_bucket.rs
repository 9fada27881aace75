// Token-bucket admission gate shared by every outbound API call.
//
// The SpaceTraders API grants a fixed request quota per window (2 per
// second), so the bucket is reset to full capacity on a wall-clock cadence
// rather than refilled continuously. Tokens are never "returned" by callers:
// a permit is a marker, not a lease.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Construction-time validation failure. Bad quota values are rejected
/// outright instead of being clamped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    ZeroCapacity,
    ZeroInterval,
}

impl fmt::Display for LimiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimiterError::ZeroCapacity => write!(f, "rate limiter capacity must be at least 1"),
            LimiterError::ZeroInterval => write!(f, "rate limiter refill interval must be non-zero"),
        }
    }
}

impl std::error::Error for LimiterError {}

/// A waiting `acquire` was interrupted before admission. No token was
/// consumed on this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The limiter was shut down while the caller was waiting.
    Closed,
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Closed => write!(f, "rate limiter closed while waiting for admission"),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Proof of admission. Hold it for the duration of exactly one gated
/// request; dropping it early does not restore a token, the next refill
/// event is the only thing that replenishes the bucket.
#[must_use = "a permit covers one outbound request; acquire it immediately before sending"]
#[derive(Debug)]
pub struct RatePermit {
    _admitted: (),
}

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

struct Shared {
    capacity: u32,
    bucket: Mutex<Bucket>,
    refilled: Notify,
    closed: AtomicBool,
}

impl Shared {
    // The only place a token is consumed. Checking and decrementing happen
    // under the same lock, so two callers can never both take the last token.
    fn try_admit(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap();
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// Coroutine-safe token bucket. One instance lives per client session and
/// meters all of its outbound requests; the refill task is cancelled when
/// the limiter is closed or dropped.
pub struct RateLimiter {
    shared: Arc<Shared>,
    refill_task: JoinHandle<()>,
}

impl RateLimiter {
    /// Create a limiter admitting at most `capacity` requests per
    /// `refill_interval`. The bucket starts full.
    pub fn new(capacity: u32, refill_interval: Duration) -> Result<Self, LimiterError> {
        if capacity == 0 {
            return Err(LimiterError::ZeroCapacity);
        }
        if refill_interval.is_zero() {
            return Err(LimiterError::ZeroInterval);
        }

        let shared = Arc::new(Shared {
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            refilled: Notify::new(),
            closed: AtomicBool::new(false),
        });

        let refill_task = tokio::spawn(Self::refill_loop(Arc::clone(&shared), refill_interval));

        Ok(RateLimiter {
            shared,
            refill_task,
        })
    }

    /// Limiter preconfigured with the SpaceTraders quota (2 requests/second).
    pub fn with_api_defaults() -> Self {
        // Defaults are compile-time valid, new() cannot fail here
        match Self::new(
            crate::DEFAULT_RATE_CAPACITY,
            Duration::from_millis(crate::DEFAULT_RATE_INTERVAL_MS),
        ) {
            Ok(limiter) => limiter,
            Err(_) => unreachable!("built-in rate quota is non-zero"),
        }
    }

    // Periodic reset to full capacity. Skipped ticks are not made up for,
    // so an idle process never banks more than `capacity` tokens.
    async fn refill_loop(shared: Arc<Shared>, refill_interval: Duration) {
        let mut ticker = time::interval_at(Instant::now() + refill_interval, refill_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            {
                let mut bucket = shared.bucket.lock().unwrap();
                bucket.tokens = shared.capacity;
                bucket.last_refill = Instant::now();
            }
            // Every waiter re-contends for the fresh tokens; wake order is
            // best-effort, not FIFO
            shared.refilled.notify_waiters();
        }
    }

    /// Wait until a token is available, consume it, and return the permit.
    ///
    /// Cancellation-safe: dropping the returned future before it resolves
    /// consumes no token. Returns `AcquireError::Closed` if the limiter is
    /// shut down while the caller is parked.
    pub async fn acquire(&self) -> Result<RatePermit, AcquireError> {
        loop {
            // Register interest in the next refill before checking the
            // bucket, so a refill landing between the check and the await
            // cannot be missed.
            let refilled = self.shared.refilled.notified();

            if self.shared.closed.load(Ordering::Acquire) {
                return Err(AcquireError::Closed);
            }
            if self.shared.try_admit() {
                return Ok(RatePermit { _admitted: () });
            }

            refilled.await;
        }
    }

    /// Tokens currently available. For introspection and tests; admission
    /// decisions go through `acquire` only.
    pub fn available_tokens(&self) -> u32 {
        self.shared.bucket.lock().unwrap().tokens
    }

    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Instant of the most recent refill event (construction counts as one).
    pub fn last_refill_time(&self) -> Instant {
        self.shared.bucket.lock().unwrap().last_refill
    }

    /// Stop the refill task and fail all parked waiters with
    /// `AcquireError::Closed`. Called when the owning session ends.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.refill_task.abort();
        self.shared.refilled.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        // The refill task holds its own Arc to the shared state; abort it
        // so nothing outlives the session that owned this limiter.
        self.refill_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_zero_capacity() {
        let result = RateLimiter::new(0, Duration::from_secs(1));
        assert!(matches!(result, Err(LimiterError::ZeroCapacity)));
    }

    #[tokio::test]
    async fn rejects_zero_interval() {
        let result = RateLimiter::new(2, Duration::ZERO);
        assert!(matches!(result, Err(LimiterError::ZeroInterval)));
    }

    #[tokio::test]
    async fn bucket_starts_full() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1)).unwrap();
        assert_eq!(limiter.available_tokens(), 3);
        assert_eq!(limiter.capacity(), 3);
    }

    #[tokio::test]
    async fn acquire_consumes_one_token() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1)).unwrap();
        let _permit = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available_tokens(), 1);
    }

    #[tokio::test]
    async fn dropping_permit_does_not_restore_a_token() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1)).unwrap();
        let permit = limiter.acquire().await.unwrap();
        drop(permit);
        assert_eq!(limiter.available_tokens(), 1);
    }

    #[tokio::test]
    async fn closed_limiter_fails_pending_acquire() {
        let limiter = std::sync::Arc::new(RateLimiter::new(1, Duration::from_secs(60)).unwrap());
        let _held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = std::sync::Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;

        limiter.close();
        let outcome = waiter.await.unwrap();
        assert_eq!(outcome, Err(AcquireError::Closed));
    }
}
