//! Configuration for the subgraph matching engine.
//!
//! This module exposes a small, stable surface for consumers (the
//! `ceci_subgraph` crate and the `ceci` command-line tool) to parameterize
//! how matching should behave.
//!
//! The main knobs are:
//! - intersection: which sorted-set intersection kernel the engine uses.
//!   `Hybrid` picks galloping for heavily skewed inputs and the fastest
//!   detected kernel otherwise.
//! - refinement_rounds: how many alternating structural pruning rounds run
//!   before the compact candidate space is built.
//! - limit: an optional cap on the number of embeddings. Enumeration stops
//!   as soon as the cap is reached and the outcome is marked truncated.
//! - partition: whether the pattern is split in two halves that are
//!   enumerated separately and joined.
//! - dedupe: whether every injective mapping counts, or only distinct sets
//!   of data vertices.
//!
//! Quick examples
//!
//! Default behaviour (hybrid kernel, three rounds, no cap, partitioned join):
//! ```ignore
//! use ceci_common::Config;
//! let cfg = Config::default();
//! ```
//!
//! Collapse automorphisms and stop after the first thousand embeddings:
//! ```ignore
//! use ceci_common::{Config, Dedupe};
//! let cfg = Config::builder().auto_morph().limit(Some(1000)).build();
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of alternating pruning rounds.
pub const DEFAULT_REFINEMENT_ROUNDS: usize = 3;

/// Global matching configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sorted-set intersection kernel.
    pub intersection: IntersectionStrategy,
    /// Number of alternating backward/forward pruning rounds.
    pub refinement_rounds: usize,
    /// Stop once this many embeddings have been found.
    pub limit: Option<u64>,
    /// Split the pattern into two halves and join them.
    pub partition: bool,
    /// How embeddings are counted under pattern automorphism.
    pub dedupe: Dedupe,
}

impl Config {
    /// Create a new configuration.
    pub const fn new(
        intersection: IntersectionStrategy,
        refinement_rounds: usize,
        limit: Option<u64>,
        partition: bool,
        dedupe: Dedupe,
    ) -> Self {
        Self {
            intersection,
            refinement_rounds,
            limit,
            partition,
            dedupe,
        }
    }

    /// Start building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        debug!("loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether a cap is set and `found` has reached it.
    pub fn limit_reached(&self, found: u64) -> bool {
        self.limit.is_some_and(|limit| found >= limit)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            IntersectionStrategy::Hybrid,
            DEFAULT_REFINEMENT_ROUNDS,
            None,
            true,
            Dedupe::None,
        )
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Select the intersection kernel.
    pub const fn intersection(mut self, strategy: IntersectionStrategy) -> Self {
        self.config.intersection = strategy;
        self
    }

    /// Set the number of pruning rounds.
    pub const fn refinement_rounds(mut self, rounds: usize) -> Self {
        self.config.refinement_rounds = rounds;
        self
    }

    /// Cap the number of embeddings.
    pub const fn limit(mut self, limit: Option<u64>) -> Self {
        self.config.limit = limit;
        self
    }

    /// Enable or disable the two-way partitioned join.
    pub const fn partition(mut self, partition: bool) -> Self {
        self.config.partition = partition;
        self
    }

    /// Set the dedupe mode.
    pub const fn dedupe(mut self, dedupe: Dedupe) -> Self {
        self.config.dedupe = dedupe;
        self
    }

    /// Count every injective mapping.
    pub const fn none(self) -> Self {
        self.dedupe(Dedupe::None)
    }

    /// Count distinct data-vertex sets only.
    pub const fn auto_morph(self) -> Self {
        self.dedupe(Dedupe::AutoMorph)
    }

    /// Finish building.
    pub fn build(self) -> Config {
        self.config
    }
}

/// Which sorted-set intersection kernel to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntersectionStrategy {
    /// Galloping for skewed inputs, otherwise the fastest detected kernel.
    #[default]
    Hybrid,
    /// Scalar two-pointer merge.
    Merge,
    /// Exponential search from the smaller side into the larger one.
    Galloping,
    /// Eight-lane block compare with a scalar tail.
    Block,
}

/// Control how embeddings are counted.
///
/// - None:
///     Every injective, label- and edge-preserving mapping counts. A
///     triangle pattern in a triangle data graph yields six embeddings.
/// - AutoMorph:
///     Two mappings are the same if they cover the same SET of data
///     vertices, regardless of which pattern vertex maps where. The
///     triangle example yields one embedding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dedupe {
    /// Count every mapping.
    #[default]
    None,
    /// Collapse mappings with the same image vertex set.
    AutoMorph,
}

impl Dedupe {
    /// True when mappings must be collapsed after enumeration.
    pub const fn collapses(&self) -> bool {
        matches!(self, Self::AutoMorph)
    }
}

/// Errors raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON for [`Config`].
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = Config::builder()
            .intersection(IntersectionStrategy::Galloping)
            .refinement_rounds(5)
            .limit(Some(10))
            .partition(false)
            .auto_morph()
            .build();

        assert_eq!(cfg.intersection, IntersectionStrategy::Galloping);
        assert_eq!(cfg.refinement_rounds, 5);
        assert_eq!(cfg.limit, Some(10));
        assert!(!cfg.partition);
        assert_eq!(cfg.dedupe, Dedupe::AutoMorph);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json_str(r#"{ "limit": 7, "intersection": "merge" }"#)
            .expect("valid json");
        assert_eq!(cfg.limit, Some(7));
        assert_eq!(cfg.intersection, IntersectionStrategy::Merge);
        assert_eq!(cfg.refinement_rounds, DEFAULT_REFINEMENT_ROUNDS);
        assert!(cfg.partition);
    }

    #[test]
    fn json_file_round_trip() {
        let cfg = Config::builder().auto_morph().partition(false).build();
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{}", serde_json::to_string(&cfg).expect("serialize")).expect("write");

        let loaded = Config::from_json_file(file.path()).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn limit_reached() {
        let cfg = Config::builder().limit(Some(3)).build();
        assert!(!cfg.limit_reached(2));
        assert!(cfg.limit_reached(3));
        assert!(!Config::default().limit_reached(u64::MAX));
    }
}
