//! Engine statistics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated on the inspection path.
///
/// All fields are relaxed atomics; reads taken while inspections are in
/// flight are approximate but never torn.
#[derive(Debug, Default)]
pub struct EngineStats {
    total_inspections: AtomicU64,
    allowed: AtomicU64,
    denied_blocked: AtomicU64,
    denied_rate_limited: AtomicU64,
    denied_rule: AtomicU64,
}

impl EngineStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allowed request.
    pub fn record_allowed(&self) {
        self.total_inspections.fetch_add(1, Ordering::Relaxed);
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request denied because the client was already blocked.
    pub fn record_blocked(&self) {
        self.total_inspections.fetch_add(1, Ordering::Relaxed);
        self.denied_blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request denied by the rate limiter.
    pub fn record_rate_limited(&self) {
        self.total_inspections.fetch_add(1, Ordering::Relaxed);
        self.denied_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request denied by a blocking rule.
    pub fn record_rule_block(&self) {
        self.total_inspections.fetch_add(1, Ordering::Relaxed);
        self.denied_rule.fetch_add(1, Ordering::Relaxed);
    }

    /// Total inspections performed.
    #[must_use]
    pub fn total_inspections(&self) -> u64 {
        self.total_inspections.load(Ordering::Relaxed)
    }

    /// Inspections that were allowed.
    #[must_use]
    pub fn allowed(&self) -> u64 {
        self.allowed.load(Ordering::Relaxed)
    }

    /// Denials against already-blocked clients.
    #[must_use]
    pub fn denied_blocked(&self) -> u64 {
        self.denied_blocked.load(Ordering::Relaxed)
    }

    /// Denials by the rate limiter.
    #[must_use]
    pub fn denied_rate_limited(&self) -> u64 {
        self.denied_rate_limited.load(Ordering::Relaxed)
    }

    /// Denials by a blocking rule.
    #[must_use]
    pub fn denied_rule(&self) -> u64 {
        self.denied_rule.load(Ordering::Relaxed)
    }

    /// Fraction of inspections that were denied (0.0 to 1.0).
    #[must_use]
    pub fn deny_rate(&self) -> f64 {
        let total = self.total_inspections();
        if total == 0 {
            return 0.0;
        }
        let denied = total - self.allowed();
        denied as f64 / total as f64
    }
}

/// Point-in-time view of engine state.
///
/// Safe to take concurrently with inspections; serializes to JSON for
/// host consumption.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    /// Rules in the active set.
    pub total_rules: usize,

    /// Clients currently blocked.
    pub blocked_clients: usize,

    /// Clients with tracked rate-limit state.
    pub tracked_clients: usize,

    /// Total inspections performed.
    pub total_inspections: u64,

    /// Inspections allowed.
    pub allowed: u64,

    /// Denials against already-blocked clients.
    pub denied_blocked: u64,

    /// Denials by the rate limiter.
    pub denied_rate_limited: u64,

    /// Denials by a blocking rule.
    pub denied_rule: u64,

    /// Fraction of inspections denied.
    pub deny_rate: f64,
}
