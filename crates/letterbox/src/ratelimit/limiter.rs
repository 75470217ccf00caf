//! In-memory rate limiter keyed by client IP.
//!
//! Two independent checks run on every request:
//! - burst: the previous admitted request must be at least `burst_interval` old
//! - volume: fewer than `hourly_cap` admitted requests inside the sliding `window`
//!
//! Only admitted requests are recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Too soon after the previous request
    Burst,
    /// Window cap reached
    HourlyCap,
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Default)]
struct RateLimitEntry {
    last_request: Option<Instant>,
    recent: VecDeque<Instant>,
}

/// Rate limiting service
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    burst_interval: Duration,
    hourly_cap: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(burst_interval: Duration, hourly_cap: usize, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            burst_interval,
            hourly_cap,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Duration::from_secs(config.burst_interval_secs),
            config.hourly_cap,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Check and record a request from `ip` now
    pub fn check(&self, ip: &str) -> RateDecision {
        self.check_at(ip, Instant::now())
    }

    /// Check and record a request from `ip` at `now`
    pub fn check_at(&self, ip: &str, now: Instant) -> RateDecision {
        // No address to key on, let it through
        if ip.is_empty() {
            return RateDecision::Allowed;
        }

        let mut entries = self.lock();
        let entry = entries.entry(ip.to_string()).or_default();

        let window = self.window;
        entry.recent.retain(|t| now.duration_since(*t) < window);

        if let Some(last) = entry.last_request {
            if now.duration_since(last) < self.burst_interval {
                return RateDecision::Burst;
            }
        }

        if entry.recent.len() >= self.hourly_cap {
            return RateDecision::HourlyCap;
        }

        entry.last_request = Some(now);
        entry.recent.push_back(now);
        RateDecision::Allowed
    }

    /// Drop entries with no admitted request inside the window.
    /// Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.window;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            entry
                .last_request
                .is_some_and(|last| now.duration_since(last) < window)
        });
        before - entries.len()
    }

    /// Number of tracked IPs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // A panic mid-update leaves at worst a stale entry
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Background worker that periodically evicts idle entries
pub async fn sweeper_worker(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "🧹 Rate-limit sweeper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let removed = limiter.sweep_at(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, tracked = limiter.len(), "Swept idle rate-limit entries");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("🧹 Rate-limit sweeper shutting down...");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(8), 20, Duration::from_secs(3600))
    }

    #[test]
    fn test_burst_limit() {
        let limiter = limiter();
        let start = Instant::now();

        assert_eq!(limiter.check_at("1.2.3.4", start), RateDecision::Allowed);
        assert_eq!(
            limiter.check_at("1.2.3.4", start + Duration::from_secs(7)),
            RateDecision::Burst
        );
        // A rejected request does not move the burst clock
        assert_eq!(
            limiter.check_at("1.2.3.4", start + Duration::from_secs(8)),
            RateDecision::Allowed
        );
        // Other IPs are independent
        assert_eq!(
            limiter.check_at("5.6.7.8", start + Duration::from_secs(8)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_hourly_cap() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..20 {
            let at = start + Duration::from_secs(9 * i);
            assert!(limiter.check_at("10.0.0.1", at).is_allowed(), "request {i}");
        }
        let at = start + Duration::from_secs(9 * 20);
        assert_eq!(limiter.check_at("10.0.0.1", at), RateDecision::HourlyCap);
    }

    #[test]
    fn test_hourly_window_slides() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..20 {
            limiter.check_at("10.0.0.2", start + Duration::from_secs(9 * i));
        }
        // The first request leaves the window one hour after it was made
        let later = start + Duration::from_secs(3600);
        assert_eq!(limiter.check_at("10.0.0.2", later), RateDecision::Allowed);
        // The second one (t=9s) is still inside the window at t=3608s
        assert_eq!(
            limiter.check_at("10.0.0.2", later + Duration::from_secs(8)),
            RateDecision::HourlyCap
        );
        assert_eq!(
            limiter.check_at("10.0.0.2", later + Duration::from_secs(9)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_empty_ip_is_not_limited() {
        let limiter = limiter();
        let now = Instant::now();
        assert!(limiter.check_at("", now).is_allowed());
        assert!(limiter.check_at("", now).is_allowed());
        assert_eq!(limiter.len(), 0);
    }

    #[test]
    fn test_sweep_drops_idle_entries() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("fresh", start + Duration::from_secs(3000));

        let removed = limiter.sweep_at(start + Duration::from_secs(3600));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let limiter = Arc::new(limiter());
        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(sweeper_worker(limiter, Duration::from_secs(600), rx));
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
