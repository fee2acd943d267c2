//! Heap construction settings.
//!
//! ```text
//!   FITALLOC_POLICY       first | best | worst | next   (default: first)
//!   FITALLOC_ARENA_LIMIT  byte cap for the owned arena  (default: none)
//!   FITALLOC_REPORT       1 | true | yes | on           (default: off)
//! ```

use std::env;

use crate::{error::ConfigError, fit::FitPolicy};

pub const POLICY_VAR: &str = "FITALLOC_POLICY";
pub const ARENA_LIMIT_VAR: &str = "FITALLOC_ARENA_LIMIT";
pub const REPORT_VAR: &str = "FITALLOC_REPORT";

/// Smallest payload a split remainder must be able to hold.
pub const DEFAULT_MIN_SPLIT_PAYLOAD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
  pub policy: FitPolicy,
  pub min_split_payload: usize,
  pub arena_limit: Option<usize>,
  /// Print the statistics report when the heap is dropped.
  pub report_on_drop: bool,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      policy: FitPolicy::default(),
      min_split_payload: DEFAULT_MIN_SPLIT_PAYLOAD,
      arena_limit: None,
      report_on_drop: false,
    }
  }
}

impl HeapConfig {
  pub fn with_policy(policy: FitPolicy) -> Self {
    Self {
      policy,
      ..Self::default()
    }
  }

  /// Reads the settings from the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Reads the settings through `lookup`; unset keys keep their defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(policy) = lookup(POLICY_VAR) {
      config.policy = policy.parse()?;
    }

    if let Some(limit) = lookup(ARENA_LIMIT_VAR) {
      let parsed = limit
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
          key: ARENA_LIMIT_VAR,
          value: limit.clone(),
        })?;
      config.arena_limit = Some(parsed);
    }

    if let Some(report) = lookup(REPORT_VAR) {
      config.report_on_drop = match report.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
          return Err(ConfigError::InvalidValue {
            key: REPORT_VAR,
            value: report,
          });
        }
      };
    }

    Ok(config)
  }
}
