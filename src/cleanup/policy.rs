use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::duration;

/// A fully resolved retention rule.
///
/// Every field is populated, so nothing downstream needs to fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Policy {
    /// Number of newest pipelines that are always kept
    pub keep_last: usize,

    /// Minimum age (since last update) before a pipeline may be deleted
    #[serde(rename = "delete-older-than", with = "crate::duration::compact")]
    pub max_age: Duration,

    /// Pipeline statuses that are never deleted (e.g., "running")
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skip_statuses: BTreeSet<String>,
}

/// Per-target overrides. Unset fields inherit from the default [`Policy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetentionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_last: Option<usize>,

    #[serde(
        default,
        with = "crate::duration::compact_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub delete_older_than: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_statuses: Option<BTreeSet<String>>,
}

impl Policy {
    /// Whether pipelines with `status` are exempt from deletion.
    pub fn skips(&self, status: &str) -> bool {
        self.skip_statuses.contains(status)
    }

    /// Any pipeline outside the keep-last window is old enough.
    pub fn ignores_age(&self) -> bool {
        self.max_age <= Duration::zero()
    }
}

impl RetentionOptions {
    /// Fills every unset field from `defaults`.
    pub fn resolve(&self, defaults: &Policy) -> Policy {
        Policy {
            keep_last: self.keep_last.unwrap_or(defaults.keep_last),
            max_age: self.delete_older_than.unwrap_or(defaults.max_age),
            skip_statuses: self
                .skip_statuses
                .clone()
                .unwrap_or_else(|| defaults.skip_statuses.clone()),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let age = duration::format(&self.max_age);

        match (self.keep_last, self.ignores_age()) {
            (0, true) => write!(f, "Delete all pipelines")?,
            (0, false) => write!(f, "Delete all pipelines older than {age}")?,
            (keep, true) => write!(f, "Keep last {keep} pipelines")?,
            (keep, false) => write!(f, "Delete pipelines older than {age}, but keep last {keep}")?,
        }

        if !self.skip_statuses.is_empty() {
            let statuses: Vec<&str> = self.skip_statuses.iter().map(String::as_str).collect();
            write!(f, " (skipping {})", statuses.join(", "))?;
        }

        Ok(())
    }
}
