//! Per-client sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Decision returned by a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request is allowed.
    pub allowed: bool,

    /// Configured maximum requests per window.
    pub limit: u64,

    /// Requests remaining in the window after this check.
    pub remaining: u64,

    /// Time until the oldest counted request leaves the window, when
    /// denied.
    pub retry_after: Option<Duration>,
}

impl RateDecision {
    /// Create an allowed decision.
    #[must_use]
    pub fn allowed(limit: u64, remaining: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            retry_after: None,
        }
    }

    /// Create a denied decision.
    #[must_use]
    pub fn denied(limit: u64, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            retry_after: Some(retry_after),
        }
    }
}

/// Arrival history for one client, oldest first.
///
/// The mutex serializes concurrent checks for the same client so the
/// prune-count-append sequence is atomic per key.
#[derive(Debug, Default)]
struct ClientWindow {
    arrivals: Mutex<VecDeque<Instant>>,
}

/// Sliding-window rate limiter keyed by client identity.
///
/// Each check prunes the client's arrivals against the trailing window
/// and denies once the pruned count has reached the limit. Denied
/// requests are not recorded, which caps the stored arrivals per client
/// at the limit itself. A previously unseen client starts with an empty
/// window, so its first request is always allowed.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window.
    limit: u64,

    /// Window length.
    window: Duration,

    /// Per-client arrival windows.
    clients: RwLock<HashMap<String, Arc<ClientWindow>>>,

    /// Total checks performed.
    total_checks: AtomicU64,

    /// Checks that were denied.
    total_denied: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter allowing `limit` requests per `window`.
    #[must_use]
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: RwLock::new(HashMap::new()),
            total_checks: AtomicU64::new(0),
            total_denied: AtomicU64::new(0),
        }
    }

    /// Check and record a request from `client` arriving at `now`.
    ///
    /// Arrivals older than the window are discarded first; the request is
    /// denied if the remaining count has reached the limit and recorded
    /// otherwise.
    pub fn check(&self, client: &str, now: Instant) -> RateDecision {
        self.total_checks.fetch_add(1, Ordering::Relaxed);

        let entry = self.get_or_create(client);
        let mut arrivals = entry.arrivals.lock().unwrap();

        while let Some(front) = arrivals.front() {
            if now.duration_since(*front) >= self.window {
                arrivals.pop_front();
            } else {
                break;
            }
        }

        if arrivals.len() as u64 >= self.limit {
            self.total_denied.fetch_add(1, Ordering::Relaxed);
            let retry_after = arrivals.front().map_or(self.window, |front| {
                self.window.saturating_sub(now.duration_since(*front))
            });
            debug!(client, limit = self.limit, "rate limit exceeded");
            return RateDecision::denied(self.limit, retry_after);
        }

        arrivals.push_back(now);
        RateDecision::allowed(self.limit, self.limit - arrivals.len() as u64)
    }

    /// Drop clients whose entire window has expired.
    ///
    /// Takes the same per-client locks as the check path. Returns the
    /// number of clients evicted.
    pub fn cleanup(&self, now: Instant) -> usize {
        let mut clients = self.clients.write().unwrap();
        let before = clients.len();

        clients.retain(|_, entry| {
            let arrivals = entry.arrivals.lock().unwrap();
            arrivals
                .back()
                .map_or(false, |last| now.duration_since(*last) < self.window)
        });

        before - clients.len()
    }

    /// Number of clients with tracked state.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients.read().unwrap().len()
    }

    /// Total checks performed.
    #[must_use]
    pub fn total_checks(&self) -> u64 {
        self.total_checks.load(Ordering::Relaxed)
    }

    /// Total checks denied.
    #[must_use]
    pub fn total_denied(&self) -> u64 {
        self.total_denied.load(Ordering::Relaxed)
    }

    fn get_or_create(&self, client: &str) -> Arc<ClientWindow> {
        // Try read lock first
        {
            let clients = self.clients.read().unwrap();
            if let Some(entry) = clients.get(client) {
                return Arc::clone(entry);
            }
        }

        // Need to create - get write lock
        let mut clients = self.clients.write().unwrap();

        // Double-check after acquiring write lock
        if let Some(entry) = clients.get(client) {
            return Arc::clone(entry);
        }

        let entry = Arc::new(ClientWindow::default());
        clients.insert(client.to_string(), Arc::clone(&entry));
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_request_always_allowed() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let decision = limiter.check("client-a", Instant::now());
        assert!(decision.allowed);
        assert_eq!(decision.limit, 1);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_exact_limit_boundary() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60));
        let now = Instant::now();

        for i in 0..100 {
            let decision = limiter.check("client-a", now);
            assert!(decision.allowed, "request {i} should be allowed");
        }

        let decision = limiter.check("client-a", now);
        assert!(!decision.allowed, "request 101 should be denied");
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after.is_some());
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check("client-a", start).allowed);
        assert!(limiter.check("client-a", start).allowed);
        assert!(!limiter.check("client-a", start).allowed);

        // One second short of the window: the old arrivals still count.
        let almost = start + Duration::from_secs(59);
        assert!(!limiter.check("client-a", almost).allowed);

        // A full window later both arrivals have aged out.
        let later = start + Duration::from_secs(60);
        assert!(limiter.check("client-a", later).allowed);
    }

    #[test]
    fn test_denied_requests_are_not_recorded() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check("client-a", now).allowed);
        }

        // Hammering while denied must not extend the window's contents.
        for _ in 0..50 {
            assert!(!limiter.check("client-a", now).allowed);
        }

        let later = now + Duration::from_secs(60);
        assert!(limiter.check("client-a", later).allowed);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("client-a", now).allowed);
        assert!(!limiter.check("client-a", now).allowed);
        assert!(limiter.check("client-b", now).allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check("client-a", now).remaining, 2);
        assert_eq!(limiter.check("client-a", now).remaining, 1);
        assert_eq!(limiter.check("client-a", now).remaining, 0);
        assert!(!limiter.check("client-a", now).allowed);
    }

    #[test]
    fn test_retry_after_bounded_by_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check("client-a", start).allowed);

        let decision = limiter.check("client-a", start + Duration::from_secs(20));
        assert!(!decision.allowed);
        let retry_after = decision.retry_after.unwrap();
        assert_eq!(retry_after, Duration::from_secs(40));
    }

    #[test]
    fn test_cleanup_evicts_idle_clients() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check("idle", start);
        limiter.check("active", start);
        limiter.check("active", start + Duration::from_secs(55));
        assert_eq!(limiter.tracked_clients(), 2);

        let evicted = limiter.cleanup(start + Duration::from_secs(70));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_counters() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.check("client-a", now);
        limiter.check("client-a", now);
        limiter.check("client-a", now);

        assert_eq!(limiter.total_checks(), 3);
        assert_eq!(limiter.total_denied(), 2);
    }

    #[test]
    fn test_concurrent_same_client_never_exceeds_limit() {
        let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60)));
        let mut handles = vec![];

        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                let mut allowed = 0u64;
                for _ in 0..25 {
                    if limiter.check("shared-client", Instant::now()).allowed {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
    }
}
