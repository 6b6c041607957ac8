//! Request inspection: signature composition, decisions, orchestration.

use crate::blocklist::BlockList;
use crate::config::EngineConfig;
use crate::error::{WafError, WafResult};
use crate::rate_limit::RateLimiter;
use crate::rules::{default_rules, Rule, RuleSet};
use crate::stats::{EngineStats, StatsSnapshot};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reason code for requests that pass every check.
pub const ALLOWED: &str = "ALLOWED";

/// Reason code for requests from a client on the block list.
pub const IP_BLOCKED: &str = "IP_BLOCKED";

/// Reason code for requests over the rate limit.
pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";

/// Reason recorded when a client is blocked by an operator call rather
/// than a policy violation.
const MANUAL_BLOCK: &str = "MANUAL";

/// A parsed request presented for inspection.
///
/// The host layer extracts these fields from the raw request; the engine
/// never touches protocol bytes. Headers and body are optional — absent
/// values are simply empty in the signature.
#[derive(Debug, Clone, Default)]
pub struct InspectionRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl InspectionRequest {
    /// Create a request with the given method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append headers from any string-pair collection.
    #[must_use]
    pub fn with_headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.headers.extend(headers);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers in the order they were added.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Compose the signature rules match against.
    ///
    /// Fixed order: method, path, headers, body, joined by single spaces.
    /// Headers render as `name:value` pairs sorted by name (duplicates
    /// keep their relative order), so the same fields always produce the
    /// same string regardless of how the caller's header map iterates.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut sorted: Vec<&(String, String)> = self.headers.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut signature = String::with_capacity(
            self.method.len() + self.path.len() + self.body.len() + self.headers.len() * 16 + 4,
        );
        signature.push_str(&self.method);
        signature.push(' ');
        signature.push_str(&self.path);
        for (name, value) in sorted {
            signature.push(' ');
            signature.push_str(name);
            signature.push(':');
            signature.push_str(value);
        }
        signature.push(' ');
        signature.push_str(&self.body);
        signature
    }
}

/// Outcome of inspecting one request.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Whether the request may proceed.
    pub allowed: bool,

    /// Stable reason code: [`ALLOWED`], [`IP_BLOCKED`],
    /// [`RATE_LIMIT_EXCEEDED`], or the id of the blocking rule.
    pub reason: String,

    /// Log-action rules that matched during evaluation.
    pub log_matches: Vec<String>,

    /// Time spent inside the engine, in microseconds.
    pub duration_us: u64,
}

impl Decision {
    fn allow(log_matches: Vec<String>, duration_us: u64) -> Self {
        Self {
            allowed: true,
            reason: ALLOWED.to_string(),
            log_matches,
            duration_us,
        }
    }

    fn deny(reason: impl Into<String>, log_matches: Vec<String>, duration_us: u64) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            log_matches,
            duration_us,
        }
    }
}

/// Counts of entries evicted by one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired block-list entries removed.
    pub blocks_evicted: usize,

    /// Idle rate-limit windows removed.
    pub windows_evicted: usize,
}

/// The request-inspection engine.
///
/// Owns one rule set, one rate limiter, and one block list; evaluates
/// every request in a fixed order and applies blocking side effects.
/// All methods take `&self`, so an engine is shared across request
/// handlers behind an `Arc` without extra locking.
///
/// Per request the checks run strictly in order — block list, rate
/// limit, rules — and the first deny is terminal:
///
/// 1. a blocked client is denied with [`IP_BLOCKED`];
/// 2. a client over the rate limit is blocked for
///    `rate_limit_block` and denied with [`RATE_LIMIT_EXCEEDED`];
/// 3. a request matching a Block rule gets the client blocked for
///    `rule_block` and denied with the rule's id;
/// 4. anything else is allowed with [`ALLOWED`].
#[derive(Debug)]
pub struct InspectionEngine {
    config: EngineConfig,
    rules: RwLock<Arc<RuleSet>>,
    limiter: RateLimiter,
    blocklist: BlockList,
    stats: EngineStats,
}

impl InspectionEngine {
    /// Build an engine, seeding the baseline rules unless the
    /// configuration disables them.
    ///
    /// # Errors
    ///
    /// [`WafError::InvalidConfig`] if the configuration fails validation;
    /// [`WafError::InvalidPattern`] if a baseline rule fails to compile.
    pub fn new(config: EngineConfig) -> WafResult<Self> {
        let rules = if config.use_default_rules {
            default_rules()?
        } else {
            Vec::new()
        };
        Self::with_rules(config, rules)
    }

    /// Build an engine with an explicit startup rule list, evaluated in
    /// the given order.
    ///
    /// # Errors
    ///
    /// [`WafError::InvalidConfig`] if the configuration fails validation.
    pub fn with_rules(config: EngineConfig, rules: Vec<Rule>) -> WafResult<Self> {
        config.validate().map_err(WafError::InvalidConfig)?;

        let limiter = RateLimiter::new(config.rate_limit, config.window);
        let mut set = RuleSet::new();
        for rule in rules {
            set.push(rule);
        }

        Ok(Self {
            config,
            rules: RwLock::new(Arc::new(set)),
            limiter,
            blocklist: BlockList::new(),
            stats: EngineStats::new(),
        })
    }

    /// Inspect one request from `client`.
    ///
    /// Synchronous and run-to-completion: no I/O, no suspension. Never
    /// panics on well-formed input; denials are values, not errors. Side
    /// effects are confined to the rate-limit window update and the
    /// block-list writes on deny.
    pub fn inspect(&self, client: &str, request: &InspectionRequest) -> Decision {
        let started = Instant::now();
        let now = started;

        // 1. Standing block?
        if self.blocklist.is_blocked(client, now) {
            self.stats.record_blocked();
            debug!(client, "request denied: client is blocked");
            return Decision::deny(IP_BLOCKED, Vec::new(), elapsed_us(started));
        }

        // 2. Rate limit.
        let rate = self.limiter.check(client, now);
        if !rate.allowed {
            self.blocklist
                .block(client, self.config.rate_limit_block, RATE_LIMIT_EXCEEDED, now);
            self.stats.record_rate_limited();
            return Decision::deny(RATE_LIMIT_EXCEEDED, Vec::new(), elapsed_us(started));
        }

        // 3. Rules, over the composed signature.
        let rules = self.rules_snapshot();
        let signature = request.signature();
        let evaluation = rules.evaluate(&signature);
        if let Some(rule_id) = evaluation.blocked_by {
            warn!(client, rule = %rule_id, "rule triggered");
            self.blocklist
                .block(client, self.config.rule_block, &rule_id, now);
            self.stats.record_rule_block();
            return Decision::deny(rule_id, evaluation.log_matches, elapsed_us(started));
        }

        self.stats.record_allowed();
        Decision::allow(evaluation.log_matches, elapsed_us(started))
    }

    /// Append a rule at runtime.
    ///
    /// Copy-on-write: inspections already in flight keep the snapshot
    /// they started with; the rule is visible to every inspection that
    /// starts afterwards.
    pub fn add_rule(&self, rule: Rule) {
        let mut rules = self.rules.write().unwrap();
        let mut updated = RuleSet::clone(&rules);
        updated.push(rule);
        *rules = Arc::new(updated);
    }

    /// Block a client directly, outside any policy trigger.
    pub fn block_client(&self, client: &str, duration: Duration) {
        self.blocklist
            .block(client, duration, MANUAL_BLOCK, Instant::now());
    }

    /// Point-in-time statistics snapshot, safe to take concurrently with
    /// inspections.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let now = Instant::now();
        StatsSnapshot {
            total_rules: self.rules_snapshot().len(),
            blocked_clients: self.blocklist.active_blocks(now),
            tracked_clients: self.limiter.tracked_clients(),
            total_inspections: self.stats.total_inspections(),
            allowed: self.stats.allowed(),
            denied_blocked: self.stats.denied_blocked(),
            denied_rate_limited: self.stats.denied_rate_limited(),
            denied_rule: self.stats.denied_rule(),
            deny_rate: self.stats.deny_rate(),
        }
    }

    /// Evict expired block entries and idle rate windows.
    ///
    /// Runs on the sweeper's schedule but is also callable directly.
    pub fn sweep(&self) -> SweepReport {
        let now = Instant::now();
        let report = SweepReport {
            blocks_evicted: self.blocklist.cleanup(now),
            windows_evicted: self.limiter.cleanup(now),
        };

        if report.blocks_evicted > 0 || report.windows_evicted > 0 {
            debug!(
                blocks = report.blocks_evicted,
                windows = report.windows_evicted,
                "sweep evicted expired entries"
            );
        }

        report
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn rules_snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules.read().unwrap())
    }
}

fn elapsed_us(started: Instant) -> u64 {
    started.elapsed().as_micros() as u64
}

/// Handle to the background sweep task.
///
/// The task periodically calls [`InspectionEngine::sweep`] so state for
/// long-idle clients does not accumulate. Dropping the handle leaves the
/// task running; call [`Sweeper::stop`] for a graceful shutdown.
#[derive(Debug)]
pub struct Sweeper {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the periodic sweep for `engine` on the current runtime,
    /// ticking every `config.sweep_interval`.
    #[must_use]
    pub fn spawn(engine: Arc<InspectionEngine>) -> Self {
        let (shutdown, mut rx) = mpsc::channel::<()>(1);
        let interval = engine.config.sweep_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.sweep();
                    }
                    _ = rx.recv() => {
                        debug!("sweeper shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the sweep task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
        let _ = self.handle.await;
    }
}
