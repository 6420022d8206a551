use std::path::PathBuf;

use ceci_common::{Config, ConfigError, Dedupe, IntersectionStrategy};
use clap::Parser;

/// CECI subgraph matcher - count pattern embeddings in a data graph
#[derive(Parser, Debug)]
#[command(name = "ceci")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Data graph in the t/v/e text format
    #[arg(short = 'd', long)]
    pub data: PathBuf,

    /// One or more pattern graphs in the same format
    #[arg(short = 'p', long, num_args = 1.., required = true)]
    pub pattern: Vec<PathBuf>,

    /// JSON configuration file; flags below override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Set intersection kernel
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Stop counting after this many embeddings
    #[arg(short = 'l', long)]
    pub limit: Option<u64>,

    /// Enumerate the whole pattern in one trie instead of joining two halves
    #[arg(long, default_value_t = false)]
    pub no_partition: bool,

    /// How pattern automorphisms are counted
    #[arg(long, value_enum)]
    pub dedupe: Option<DedupeArg>,

    /// Print results as CSV
    #[arg(long, default_value_t = false)]
    pub csv: bool,
}

impl Args {
    /// Convert command-line arguments into internal configuration
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let base = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        let mut builder = Config::builder()
            .intersection(base.intersection)
            .refinement_rounds(base.refinement_rounds)
            .limit(base.limit)
            .partition(base.partition && !self.no_partition)
            .dedupe(base.dedupe);
        if let Some(strategy) = &self.strategy {
            builder = builder.intersection(strategy.clone().into());
        }
        if self.limit.is_some() {
            builder = builder.limit(self.limit);
        }
        if let Some(dedupe) = &self.dedupe {
            builder = builder.dedupe(dedupe.clone().into());
        }
        Ok(builder.build())
    }
}

/// Command-line argument wrapper for IntersectionStrategy
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum StrategyArg {
    /// Galloping for skewed sizes, block or merge otherwise
    #[value(name = "auto")]
    Auto,
    /// Scalar two-pointer merge
    #[value(name = "merge")]
    Merge,
    /// Exponential search from the shorter side
    #[value(name = "galloping")]
    Galloping,
    /// Eight-lane block compare
    #[value(name = "block")]
    Block,
}

impl From<StrategyArg> for IntersectionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => Self::Hybrid,
            StrategyArg::Merge => Self::Merge,
            StrategyArg::Galloping => Self::Galloping,
            StrategyArg::Block => Self::Block,
        }
    }
}

/// Command-line argument wrapper for Dedupe
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum DedupeArg {
    /// Count every injective mapping
    #[value(name = "none")]
    None,
    /// Count each data vertex set once
    #[value(name = "auto-morph")]
    AutoMorph,
}

impl From<DedupeArg> for Dedupe {
    fn from(arg: DedupeArg) -> Self {
        match arg {
            DedupeArg::None => Self::None,
            DedupeArg::AutoMorph => Self::AutoMorph,
        }
    }
}
