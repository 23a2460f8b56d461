use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

pub struct WaitConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(3),
        }
    }
}

/// Poll `condition` until it holds or `config.timeout` has passed.
/// `on_miss` runs after every failed attempt (progress dots).
pub async fn wait_for<F, Fut>(config: WaitConfig, mut condition: F, mut on_miss: impl FnMut()) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + config.timeout;
    loop {
        if condition().await {
            return true;
        }
        on_miss();
        if Instant::now() + config.interval > deadline {
            return false;
        }
        sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> WaitConfig {
        WaitConfig {
            timeout: Duration::from_millis(200),
            interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_wait_for_succeeds_after_retries() {
        let attempts = &AtomicU32::new(0);
        let mut misses = 0;
        let ready = wait_for(
            fast(),
            move || async move { attempts.fetch_add(1, Ordering::SeqCst) >= 2 },
            || misses += 1,
        )
        .await;
        assert!(ready);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(misses, 2);
    }

    #[tokio::test]
    async fn test_wait_for_gives_up() {
        let ready = wait_for(fast(), || async { false }, || {}).await;
        assert!(!ready);
    }
}
