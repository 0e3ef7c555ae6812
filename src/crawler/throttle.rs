//! Global request throttle
//!
//! Two controls live here, shared by every worker:
//! - a semaphore bounding how many fetches are in flight at once
//! - a single politeness clock spacing *all* outbound requests, so raising
//!   concurrency can never raise the request rate against the site
//!
//! The clock hands out send slots: each caller reserves the next free slot
//! under the mutex, then sleeps until its slot outside the lock.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Shared rate-limit gate for one pipeline run.
pub struct Throttle {
    permits: Arc<Semaphore>,
    clock: Mutex<Instant>,
    interval: Duration,
}

impl Throttle {
    /// Creates a throttle with the given worker bound and per-request
    /// politeness interval.
    pub fn new(concurrency: usize, interval: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            clock: Mutex::new(Instant::now()),
            interval,
        }
    }

    /// The politeness interval in force (after any robots.txt adjustment).
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Acquires a worker slot, waiting while the pool is saturated.
    pub async fn slot(&self) -> OwnedSemaphorePermit {
        // The semaphore lives as long as the throttle and is never closed.
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("throttle semaphore closed")
    }

    /// Waits until this caller's turn on the shared politeness clock.
    ///
    /// Each call reserves the next free send slot; concurrent callers get
    /// consecutive slots `interval` apart regardless of worker count.
    pub async fn wait_turn(&self) {
        if self.interval.is_zero() {
            return;
        }

        let scheduled = {
            let mut next = self.clock.lock().await;
            let now = Instant::now();
            let scheduled = if *next > now { *next } else { now };
            *next = scheduled + self.interval;
            scheduled
        };

        tokio::time::sleep_until(scheduled).await;
    }
}

/// The politeness interval to enforce: the configured interval, raised to
/// the robots.txt Crawl-delay when the site asks for more.
pub fn effective_interval(configured_ms: u64, crawl_delay_secs: Option<f64>) -> Duration {
    let configured = Duration::from_millis(configured_ms);
    let robots = crawl_delay_secs
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::ZERO);
    std::cmp::max(configured, robots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_interval_uses_config() {
        assert_eq!(effective_interval(700, None), Duration::from_millis(700));
    }

    #[test]
    fn test_effective_interval_robots_larger() {
        assert_eq!(effective_interval(700, Some(2.0)), Duration::from_secs(2));
    }

    #[test]
    fn test_effective_interval_robots_smaller_than_config() {
        assert_eq!(
            effective_interval(1000, Some(0.5)),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_effective_interval_ignores_nonsense_delay() {
        assert_eq!(
            effective_interval(700, Some(-3.0)),
            Duration::from_millis(700)
        );
        assert_eq!(
            effective_interval(700, Some(f64::NAN)),
            Duration::from_millis(700)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_turns_are_spaced() {
        let throttle = Throttle::new(4, Duration::from_millis(500));

        let start = Instant::now();
        throttle.wait_turn().await;
        throttle.wait_turn().await;
        throttle.wait_turn().await;

        // Third turn lands two intervals after the first.
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_turns_share_one_clock() {
        let throttle = Arc::new(Throttle::new(4, Duration::from_millis(300)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let t = Arc::clone(&throttle);
            handles.push(tokio::spawn(async move {
                t.wait_turn().await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Three turns from three tasks still take two intervals in total.
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_wait() {
        let throttle = Throttle::new(1, Duration::ZERO);
        throttle.wait_turn().await;
        throttle.wait_turn().await;
    }

    #[tokio::test]
    async fn test_slot_bounds_concurrency() {
        let throttle = Arc::new(Throttle::new(2, Duration::ZERO));

        let a = throttle.slot().await;
        let _b = throttle.slot().await;

        // Pool exhausted: a third slot is not immediately available.
        let t = Arc::clone(&throttle);
        let third = tokio::time::timeout(Duration::from_millis(50), t.slot()).await;
        assert!(third.is_err());

        drop(a);
        let third = tokio::time::timeout(Duration::from_millis(50), throttle.slot()).await;
        assert!(third.is_ok());
    }
}
