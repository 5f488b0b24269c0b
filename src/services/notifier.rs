// src/services/notifier.rs

//! Notification transport abstraction.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Delivers formatted messages to a single recipient.
///
/// Implementations never retry; `false` means the recipient did not accept the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> bool;
}

/// Enforces a minimum spacing between consecutive sends.
#[derive(Debug)]
pub struct Throttle {
    min_gap: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last: None,
        }
    }

    /// Sleep until `min_gap` has passed since the previous call, then record this one.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.min_gap;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Send through `notifier` after honouring the throttle.
pub async fn send_throttled(notifier: &dyn Notifier, throttle: &mut Throttle, message: &str) -> bool {
    throttle.wait().await;
    notifier.notify(message).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_send_is_immediate() {
        let mut throttle = Throttle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_sends_are_spaced() {
        let mut throttle = Throttle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_the_gap() {
        let mut throttle = Throttle::new(Duration::from_secs(2));
        throttle.wait().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        let before = Instant::now();
        throttle.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
