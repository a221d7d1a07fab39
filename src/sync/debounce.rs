use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time;

/// Trailing-edge debounce for filter edits.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay. Returns `false` if another call arrived meanwhile,
    /// in which case that later call owns the fetch.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_burst_call_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(500));

        let (first, second, third) = tokio::join!(
            debouncer.settle(),
            async {
                time::sleep(Duration::from_millis(100)).await;
                debouncer.settle().await
            },
            async {
                time::sleep(Duration::from_millis(200)).await;
                debouncer.settle().await
            },
        );

        assert!(!first);
        assert!(!second);
        assert!(third);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_both_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(debouncer.settle().await);
        assert!(debouncer.settle().await);
    }
}
