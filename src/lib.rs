//! # Rampart
//!
//! An embeddable web application firewall engine that inspects parsed
//! requests and decides, per client, whether they may proceed.
//!
//! ## Features
//!
//! - Regex rule matching over a canonical request signature
//! - Baseline rules for SQL injection, XSS, path traversal, command
//!   injection, and LDAP injection
//! - Per-client sliding-window rate limiting
//! - Automatic time-bounded client blocking with lazy expiry
//! - Runtime rule additions without pausing inspection
//! - Background sweeping of expired per-client state
//!
//! ## Inspection order
//!
//! [`InspectionEngine::inspect`] runs three checks in a fixed order and
//! stops at the first deny: the block list, the rate limiter, then the
//! rule set. Denials also feed back into the block list, so a client
//! that trips a rule or exhausts its rate budget is refused outright for
//! a configurable period. The engine is synchronous and lock-scoped per
//! client; share it behind an [`std::sync::Arc`] and call it from as
//! many request handlers as needed.

mod blocklist;
mod config;
mod engine;
mod error;
mod rate_limit;
mod rules;
mod stats;

pub use blocklist::BlockList;
pub use config::EngineConfig;
pub use engine::{
    Decision, InspectionEngine, InspectionRequest, SweepReport, Sweeper, ALLOWED, IP_BLOCKED,
    RATE_LIMIT_EXCEEDED,
};
pub use error::{WafError, WafResult};
pub use rate_limit::{RateDecision, RateLimiter};
pub use rules::{default_rules, Evaluation, Rule, RuleAction, RuleSet};
pub use stats::{EngineStats, StatsSnapshot};
