//! Deployment configuration
//!
//! A deployment picks exactly one normalization policy, one tie-break order and
//! one event-totals policy. Configuration is read once at startup from a TOML,
//! YAML or JSON file (chosen by extension) and is immutable afterwards.
//!
//! ```toml
//! [normalization]
//! policy = "allow_list"
//!
//! [normalization.aliases]
//! "gpt-4o@agentvillage.org" = "GPT-4o"
//!
//! [[normalization.agents]]
//! name = "GPT-4o"
//! family = "gpt"
//!
//! [ordering]
//! tie_break = "name"
//!
//! [checks]
//! event_totals = "exact"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{GraphError, Result};

/// Conventional configuration file name looked up in the working root
pub const DEFAULT_CONFIG_FILE: &str = "collab-graph.toml";

/// Token excluded by default: an aggregate marker meaning "all participants"
pub const DEFAULT_EXCLUDED_TOKEN: &str = "all";

/// Full deployment configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub normalization: NormalizationConfig,
    pub ordering: OrderingConfig,
    pub checks: CheckConfig,
    pub provenance: ProvenanceConfig,
}

/// Token normalization policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case", deny_unknown_fields)]
pub enum NormalizationConfig {
    /// Accept every non-empty token except the excluded ones, verbatim
    ExcludeList {
        #[serde(default = "default_excluded")]
        exclude: Vec<String>,
    },
    /// Resolve aliases, then accept only allow-listed names
    AllowList {
        #[serde(default)]
        aliases: BTreeMap<String, String>,
        agents: Vec<RosterEntry>,
    },
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        NormalizationConfig::ExcludeList {
            exclude: default_excluded(),
        }
    }
}

fn default_excluded() -> Vec<String> {
    vec![DEFAULT_EXCLUDED_TOKEN.to_string()]
}

/// One allow-listed canonical name and its family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterEntry {
    pub name: String,
    pub family: String,
}

/// Secondary order among nodes or links with equal counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Order of first increment in the event stream
    #[default]
    FirstSeen,
    /// Identity name ascending; `(source, target)` ascending for links
    Name,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderingConfig {
    pub tie_break: TieBreak,
}

/// Relationship between summed node events and the declared event total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTotalsPolicy {
    /// Summed node events must be at least the declared total
    #[default]
    LowerBound,
    /// Summed node events must equal the declared total
    Exact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    pub event_totals: EventTotalsPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvenanceConfig {
    /// Label written to `metadata.source`
    pub source: Option<String>,
}

impl GraphConfig {
    /// Resolve the configuration for a run
    ///
    /// An explicit path must exist. Otherwise `collab-graph.toml` under `root`
    /// is used when present, and built-in defaults when not.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let path: Option<PathBuf> = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        };

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_path(&path)
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a configuration file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GraphError::file_error(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::parse(path, &content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration content, choosing the format by file extension
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let parsed = match extension.as_str() {
            "toml" => toml::from_str(content).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
            _ => {
                return Err(GraphError::config_error(format!(
                    "Unsupported config format: '{}'. Supported formats: toml, yaml, yml, json",
                    extension
                )))
            }
        };

        parsed.map_err(|e| {
            GraphError::config_error(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Check the configuration for internal consistency
    ///
    /// Labels that end up in the graph artifact must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.provenance.source.as_deref() == Some("") {
            return Err(GraphError::config_error("provenance source is empty"));
        }

        match &self.normalization {
            NormalizationConfig::ExcludeList { .. } => Ok(()),
            NormalizationConfig::AllowList { aliases, agents } => {
                if agents.is_empty() {
                    return Err(GraphError::config_error(
                        "allow_list policy requires at least one agent",
                    ));
                }

                let mut names = BTreeSet::new();
                for entry in agents {
                    if entry.name.is_empty() {
                        return Err(GraphError::config_error("allow-listed agent name is empty"));
                    }
                    if entry.family.is_empty() {
                        return Err(GraphError::config_error(format!(
                            "allow-listed agent '{}' has an empty family",
                            entry.name
                        )));
                    }
                    if !names.insert(entry.name.as_str()) {
                        return Err(GraphError::config_error(format!(
                            "agent '{}' is allow-listed more than once",
                            entry.name
                        )));
                    }
                }

                for (raw, target) in aliases {
                    if !names.contains(target.as_str()) {
                        return Err(GraphError::config_error(format!(
                            "alias '{}' resolves to '{}', which is not allow-listed",
                            raw, target
                        )));
                    }
                }

                Ok(())
            }
        }
    }
}
