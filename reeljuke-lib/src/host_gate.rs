//! Per-host slot gate bounding concurrent outbound requests.
//!
//! Every remote call acquires a slot for its target host before the request
//! goes out, so parallel scan workers cannot hammer one source site. Hosts
//! map to rule groups: a rule string of `pattern=N` pairs (regexes matched
//! against the host name) assigns each group a slot count, the longest
//! matching pattern wins, and a built-in `.*=1` rule catches everything
//! else. Acquiring suspends the caller until a slot is free and never fails
//! on its own; the returned guard releases the slot on drop, so release
//! happens exactly once on every path, including failure paths.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Default rule string: one in-flight request per host.
pub const DEFAULT_SLOT_RULES: &str = ".*=1";

struct GateRule {
    pattern: String,
    matcher: regex::Regex,
    limit: usize,
    slots: Arc<Semaphore>,
}

impl GateRule {
    fn new(pattern: &str, limit: usize) -> Option<Self> {
        let matcher = match regex::Regex::new(pattern) {
            Ok(m) => m,
            Err(_) => {
                log::debug!("slot rule {:?} is not a valid regex, ignored", pattern);
                return None;
            }
        };
        Some(Self {
            pattern: pattern.to_string(),
            matcher,
            limit,
            slots: Arc::new(Semaphore::new(limit)),
        })
    }
}

/// Counting limiter for outbound calls, one independent count per host.
pub struct HostGate {
    /// Rule 0 is always the `.*` fallback.
    rules: Vec<GateRule>,
    /// Host -> index of the rule it resolved to, cached on first use.
    resolved: Mutex<HashMap<String, usize>>,
}

impl Default for HostGate {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_RULES)
    }
}

impl HostGate {
    /// Build a gate from a rule string like `.*=1, imdb\.com=2`.
    ///
    /// Pairs are `regex=slots`; an explicit `.*` rule overrides the default
    /// fallback limit of 1. Invalid regexes are logged and skipped.
    pub fn new(rule_spec: &str) -> Self {
        log::debug!("using download slot rules: {}", rule_spec);

        let mut rules = Vec::new();
        let pair = regex::Regex::new(r",?\s*([^=,]+)=(\d+)").expect("rule pair pattern is valid");
        for caps in pair.captures_iter(rule_spec) {
            let pattern = caps[1].trim();
            let limit: usize = match caps[2].parse() {
                Ok(0) | Err(_) => continue,
                Ok(n) => n,
            };
            if let Some(rule) = GateRule::new(pattern, limit) {
                log::debug!("slot rule {}={}", rule.pattern, rule.limit);
                rules.push(rule);
            }
        }

        // The fallback rule sits at index 0; an explicit .* entry replaces it.
        if let Some(pos) = rules.iter().position(|r| r.pattern == ".*") {
            rules.swap(0, pos);
        } else {
            let fallback = GateRule::new(".*", 1).expect("fallback pattern is valid");
            rules.insert(0, fallback);
        }

        Self {
            rules,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a slot for `host`, waiting until one is free. The returned
    /// guard holds the slot until it is dropped.
    pub async fn slot(&self, host: &str) -> HostSlot {
        let slots = self.semaphore_for(host).await;
        let permit = slots
            .acquire_owned()
            .await
            .expect("host gate semaphores are never closed");
        HostSlot { _permit: permit }
    }

    /// Slot count the given host is limited to.
    pub async fn limit_for(&self, host: &str) -> usize {
        let index = self.resolve(host).await;
        self.rules[index].limit
    }

    async fn semaphore_for(&self, host: &str) -> Arc<Semaphore> {
        let index = self.resolve(host).await;
        self.rules[index].slots.clone()
    }

    /// Find the rule for a host: longest matching pattern wins, cached per
    /// host after the first lookup.
    async fn resolve(&self, host: &str) -> usize {
        let host = host.to_ascii_lowercase();
        let mut resolved = self.resolved.lock().await;
        if let Some(&index) = resolved.get(&host) {
            return index;
        }

        let mut best = 0;
        for (index, rule) in self.rules.iter().enumerate().skip(1) {
            if rule.matcher.is_match(&host) && rule.pattern.len() > self.rules[best].pattern.len() {
                best = index;
            }
        }
        log::debug!(
            "download host: {}; rule: {} ({} slots)",
            host,
            self.rules[best].pattern,
            self.rules[best].limit
        );
        resolved.insert(host, best);
        best
    }
}

/// An acquired host slot. Dropping the guard releases the slot.
#[must_use = "dropping the slot guard immediately releases it"]
pub struct HostSlot {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
#[path = "tests/host_gate_tests.rs"]
mod tests;
