//! Participant token normalization
//!
//! Maps a raw participant token to a canonical [`Identity`] or rejects it.
//! Rejection is silent: a rejected token simply contributes to no count.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::NormalizationConfig;
use crate::model::Identity;

/// Trait for token normalization policies
pub trait TokenNormalizer: Send + Sync {
    /// Policy identifier, used in logs
    fn policy(&self) -> &'static str;

    /// Resolve a raw token, or `None` to reject it
    fn normalize(&self, raw: &str) -> Option<Identity>;
}

/// Accepts any non-empty token not in a fixed exclusion set
#[derive(Debug, Clone)]
pub struct ExcludeListNormalizer {
    excluded: BTreeSet<String>,
}

impl ExcludeListNormalizer {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }
}

impl TokenNormalizer for ExcludeListNormalizer {
    fn policy(&self) -> &'static str {
        "exclude_list"
    }

    fn normalize(&self, raw: &str) -> Option<Identity> {
        if raw.is_empty() || self.excluded.contains(raw) {
            return None;
        }
        Some(Identity::new(raw))
    }
}

/// Resolves aliases, then accepts only allow-listed canonical names
#[derive(Debug, Clone)]
pub struct AllowListNormalizer {
    aliases: BTreeMap<String, String>,
    families: BTreeMap<String, String>,
}

impl AllowListNormalizer {
    /// Build from an alias map and `(name, family)` allow-list entries
    pub fn new<A, R>(aliases: A, roster: R) -> Self
    where
        A: IntoIterator<Item = (String, String)>,
        R: IntoIterator<Item = (String, String)>,
    {
        Self {
            aliases: aliases.into_iter().collect(),
            families: roster.into_iter().collect(),
        }
    }
}

impl TokenNormalizer for AllowListNormalizer {
    fn policy(&self) -> &'static str {
        "allow_list"
    }

    fn normalize(&self, raw: &str) -> Option<Identity> {
        let resolved = self.aliases.get(raw).map(String::as_str).unwrap_or(raw);
        self.families
            .get(resolved)
            .map(|family| Identity::with_family(resolved, family.as_str()))
    }
}

/// Build the normalizer selected by a deployment configuration
pub fn from_config(config: &NormalizationConfig) -> Box<dyn TokenNormalizer> {
    match config {
        NormalizationConfig::ExcludeList { exclude } => {
            Box::new(ExcludeListNormalizer::new(exclude.iter().cloned()))
        }
        NormalizationConfig::AllowList { aliases, agents } => Box::new(AllowListNormalizer::new(
            aliases.clone(),
            agents
                .iter()
                .map(|entry| (entry.name.clone(), entry.family.clone())),
        )),
    }
}
