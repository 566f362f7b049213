//! Per-identity and per-pair aggregation over an event sequence
//!
//! Each accepted event counts once per distinct identity, and once per
//! unordered pair of distinct identities drawn from all of its participants.
//! First-seen ordinals are recorded explicitly so later ordering never depends
//! on map iteration order.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::Identity;
use crate::normalize::TokenNormalizer;

/// Unordered pair of distinct identity names in canonical order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Canonicalize a pair; `(a, b)` and `(b, a)` produce the same key
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Occurrence count for one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTally {
    pub count: u64,
    /// Position of this identity among all identities, by first occurrence
    pub first_seen: usize,
    pub family: Option<String>,
}

/// Co-occurrence count for one pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTally {
    pub count: u64,
    /// Position of this pair among all pairs, by first increment
    pub first_seen: usize,
}

/// Bookkeeping about what the aggregation pass skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub events_seen: usize,
    pub events_counted: usize,
    /// Events whose `agents` field was absent or not a list
    pub events_malformed: usize,
    /// Events with no accepted participant after normalization
    pub events_empty: usize,
    pub tokens_rejected: usize,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub agents: BTreeMap<String, AgentTally>,
    pub pairs: BTreeMap<PairKey, PairTally>,
    pub stats: AggregateStats,
}

impl Aggregates {
    /// Occurrence count for an identity name, 0 when absent
    pub fn agent_count(&self, name: &str) -> u64 {
        self.agents.get(name).map(|t| t.count).unwrap_or(0)
    }

    /// Co-occurrence count for a pair, in either order, 0 when absent
    pub fn pair_count(&self, a: &str, b: &str) -> u64 {
        self.pairs
            .get(&PairKey::new(a, b))
            .map(|t| t.count)
            .unwrap_or(0)
    }

    fn record_agent(&mut self, identity: &Identity) {
        let next = self.agents.len();
        self.agents
            .entry(identity.name.clone())
            .or_insert_with(|| AgentTally {
                count: 0,
                first_seen: next,
                family: identity.family.clone(),
            })
            .count += 1;
    }

    fn record_pair(&mut self, key: PairKey) {
        let next = self.pairs.len();
        self.pairs
            .entry(key)
            .or_insert(PairTally {
                count: 0,
                first_seen: next,
            })
            .count += 1;
    }
}

/// Aggregates events through a normalizer
pub struct Aggregator<'a> {
    normalizer: &'a dyn TokenNormalizer,
}

impl<'a> Aggregator<'a> {
    pub fn new(normalizer: &'a dyn TokenNormalizer) -> Self {
        Self { normalizer }
    }

    /// Run one full pass over the events
    pub fn aggregate<'e, I>(&self, events: I) -> Aggregates
    where
        I: IntoIterator<Item = &'e Value>,
    {
        let mut aggregates = Aggregates::default();

        for event in events {
            aggregates.stats.events_seen += 1;

            let Some(tokens) = event.get("agents").and_then(Value::as_array) else {
                aggregates.stats.events_malformed += 1;
                continue;
            };

            let participants = self.participants(tokens, &mut aggregates.stats);
            if participants.is_empty() {
                aggregates.stats.events_empty += 1;
                continue;
            }

            aggregates.stats.events_counted += 1;
            for identity in &participants {
                aggregates.record_agent(identity);
            }

            if participants.len() < 2 {
                continue;
            }

            let mut names: Vec<&str> = participants.iter().map(|i| i.name.as_str()).collect();
            names.sort_unstable();
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    aggregates.record_pair(PairKey::new(a, b));
                }
            }
        }

        tracing::debug!(
            policy = self.normalizer.policy(),
            events_seen = aggregates.stats.events_seen,
            events_counted = aggregates.stats.events_counted,
            events_malformed = aggregates.stats.events_malformed,
            events_empty = aggregates.stats.events_empty,
            tokens_rejected = aggregates.stats.tokens_rejected,
            agents = aggregates.agents.len(),
            pairs = aggregates.pairs.len(),
            "Aggregated event log"
        );

        aggregates
    }

    /// Normalized, de-duplicated participants of one event in first-appearance order
    fn participants(&self, tokens: &[Value], stats: &mut AggregateStats) -> Vec<Identity> {
        let mut participants: Vec<Identity> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let identity = token.as_str().and_then(|raw| self.normalizer.normalize(raw));
            match identity {
                Some(identity) => {
                    if !participants.iter().any(|p| p.name == identity.name) {
                        participants.push(identity);
                    }
                }
                None => stats.tokens_rejected += 1,
            }
        }
        participants
    }
}
