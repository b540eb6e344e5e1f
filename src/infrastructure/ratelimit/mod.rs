use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("invalid rate limit configuration: {0}")]
    Config(String),
}

/// Process-wide request quota: at most `capacity` dispatches in any `window`.
///
/// The TTS provider enforces its quota per account, so one instance is built at
/// startup and shared (`Arc<QuotaLimiter>`) by every synthesis call of every
/// pipeline run. Dispatch times are kept in a log, which bounds every sliding
/// window, not only aligned ones.
///
/// Waiters queue on a fair mutex and are admitted in arrival order.
#[derive(Debug)]
pub struct QuotaLimiter {
    capacity: usize,
    window: Duration,
    dispatched: Mutex<VecDeque<Instant>>,
}

impl QuotaLimiter {
    /// Create a limiter allowing `capacity` requests per `window`
    pub fn new(capacity: u32, window: Duration) -> Result<Self, RateLimitError> {
        if capacity == 0 {
            return Err(RateLimitError::Config("capacity must be > 0".to_string()));
        }
        if window.is_zero() {
            return Err(RateLimitError::Config("window must be > 0".to_string()));
        }

        Ok(Self {
            capacity: capacity as usize,
            window,
            dispatched: Mutex::new(VecDeque::with_capacity(capacity as usize)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for a free slot in the quota, then consume it.
    ///
    /// Dropping the future while it waits gives up the caller's place without
    /// consuming anything.
    pub async fn acquire(&self) {
        let mut dispatched = self.dispatched.lock().await;

        loop {
            let now = Instant::now();
            while let Some(&oldest) = dispatched.front() {
                if now.duration_since(oldest) >= self.window {
                    dispatched.pop_front();
                } else {
                    break;
                }
            }

            if dispatched.len() < self.capacity {
                dispatched.push_back(now);
                return;
            }

            // Full: the oldest dispatch leaves the window first
            if let Some(&oldest) = dispatched.front() {
                let ready_at = oldest + self.window;
                tracing::debug!(
                    wait_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                    "TTS quota exhausted, waiting for a slot"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    /// Slots available right now, without waiting
    pub async fn available(&self) -> usize {
        let dispatched = self.dispatched.lock().await;
        let now = Instant::now();
        let in_window = dispatched
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count();
        self.capacity - in_window
    }
}
