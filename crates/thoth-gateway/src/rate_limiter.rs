use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-service token bucket. `capacity` tokens refill continuously at
/// `refill_per_sec`; `acquire` sleeps until a token is available rather
/// than failing, since the gateway's contract (spec §4.5) is to shape
/// request rate, not to reject callers.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_sec: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self { state: Mutex::new(BucketState { tokens: capacity, last_refill: Instant::now() }), capacity, refill_per_sec }
    }

    /// Waits until a token is available, then consumes one.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d.max(Duration::from_millis(1))).await,
            }
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquires_immediately_while_tokens_available() {
        let bucket = TokenBucket::new(2.0, 1.0);
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn blocks_once_tokens_exhausted() {
        let bucket = TokenBucket::new(1.0, 20.0);
        bucket.acquire().await;
        let start = Instant::now();
        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
