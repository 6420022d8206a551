//! Labelled subgraph isomorphism over undirected graphs.
//!
//! A match runs in phases, each of which may prove that no embedding exists
//! and stop early:
//!
//! 1. label, degree and neighbourhood-label-frequency filtering;
//! 2. pruning rounds over the flat candidate lists;
//! 3. construction of a compact candidate space grouped by tree parent;
//! 4. reverse refinement of that space to a fixpoint;
//! 5. enumeration, either from one trie or as a join of two half tries.
//!
//! ```
//! use ceci_common::Config;
//! use ceci_subgraph::{Graph, SubgraphMatcher};
//!
//! let triangle = Graph::from_edges(vec![0, 0, 0], &[(0, 1), (1, 2), (0, 2)]).unwrap();
//! let outcome = SubgraphMatcher::new(&triangle, &triangle, &Config::default())
//!     .count()
//!     .unwrap();
//! assert_eq!(outcome.count, 6);
//! ```

pub mod candidates;
pub mod context;
pub mod embedding;
pub mod enumerate;
pub mod error;
pub mod graph;
pub mod intersect;
pub mod order;
pub mod partition;
pub mod profiling;
pub mod refine;

use ceci_common::Config;
use tracing::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub use candidates::{CandidateGenerator, CandidateSets};
pub use context::{MatchContext, MatchStats};
pub use embedding::Embedding;
pub use enumerate::{Enumerator, Tally};
pub use error::{GraphError, MatchError};
pub use graph::{Graph, Label, VertexId};
pub use intersect::SetIntersector;
pub use order::{MAX_PATTERN_VERTICES, OrderBuilder, PatternTree};
pub use partition::{PartitionPlan, Partitioner};
pub use refine::{CandidateRefiner, CandidateSpace};

use crate::profiling::Timer;

/// Phase that proved the absence of embeddings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Label, degree or NLF filtering.
    Filtering,
    /// Pruning rounds over the flat candidates.
    Pruning,
    /// Building the compact candidate space.
    CandidateSpace,
    /// Reverse refinement of the candidate space.
    Refinement,
}

/// How a match finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Counted from a single trie.
    Enumerated,
    /// Counted by joining two half tries.
    Joined,
    /// Some pattern vertex ran out of candidates.
    EarlyExit(Phase),
}

/// Result of [`SubgraphMatcher::count`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Embeddings found, at most the configured limit.
    pub count: u64,
    /// How the match finished.
    pub termination: Termination,
    /// The configured limit stopped counting early.
    pub truncated: bool,
    /// Counters collected along the way.
    pub stats: MatchStats,
}

impl MatchOutcome {
    fn exhausted(phase: Phase, ctx: MatchContext) -> Self {
        debug!(?phase, "no embeddings");
        Self {
            count: 0,
            termination: Termination::EarlyExit(phase),
            truncated: false,
            stats: ctx.into_stats(),
        }
    }
}

/// Everything up to enumeration.
struct Prepared {
    tree: PatternTree,
    space: CandidateSpace,
    flat: Vec<Vec<VertexId>>,
}

enum Preparation {
    Ready(Prepared),
    Exhausted(Phase),
}

/// Matches one pattern against one data graph under a [`Config`].
pub struct SubgraphMatcher<'data, 'pattern, 'cfg> {
    data: &'data Graph,
    pattern: &'pattern Graph,
    config: &'cfg Config,
    intersector: SetIntersector,
}

impl<'data, 'pattern, 'cfg> SubgraphMatcher<'data, 'pattern, 'cfg> {
    /// Matcher with the intersection kernel named by `config`.
    pub fn new(data: &'data Graph, pattern: &'pattern Graph, config: &'cfg Config) -> Self {
        Self {
            data,
            pattern,
            config,
            intersector: SetIntersector::new(config.intersection),
        }
    }

    /// Use `intersector` instead of the one derived from the config.
    #[must_use]
    pub const fn with_intersector(mut self, intersector: SetIntersector) -> Self {
        self.intersector = intersector;
        self
    }

    fn prepare(&self, ctx: &mut MatchContext) -> Result<Preparation, MatchError> {
        let _timer = Timer::new("match::prepare");
        order::validate_pattern(self.pattern)?;

        let generator = CandidateGenerator::new(self.data, self.pattern);
        let mut candidates = generator.generate();
        ctx.stats.nlf_candidates = candidates.total();
        if let Some(u) = candidates.first_empty() {
            debug!(vertex = u, "no nlf candidates");
            return Ok(Preparation::Exhausted(Phase::Filtering));
        }

        let root = generator.select_root();
        ctx.stats.root = Some(root);
        let tree = OrderBuilder::new(self.pattern).build(root);

        let refiner = CandidateRefiner::new(self.data, self.pattern, &tree, self.intersector);
        ctx.stats.pruning_rounds = refiner.prune(&mut candidates, self.config.refinement_rounds, ctx);
        if let Some(u) = candidates.first_empty() {
            debug!(vertex = u, "pruned out");
            return Ok(Preparation::Exhausted(Phase::Pruning));
        }

        let mut space = match refiner.build_space(&candidates, ctx) {
            Ok(space) => space,
            Err(u) => {
                debug!(vertex = u, "candidate space empty");
                return Ok(Preparation::Exhausted(Phase::CandidateSpace));
            }
        };
        ctx.stats.space_entries = space.entries();

        refiner.refine(&mut space, ctx);
        if let Some(u) = space.first_empty() {
            debug!(vertex = u, "refined out");
            return Ok(Preparation::Exhausted(Phase::Refinement));
        }
        let flat = space.flatten();
        ctx.stats.refined_candidates = flat.iter().map(Vec::len).sum();
        Ok(Preparation::Ready(Prepared { tree, space, flat }))
    }

    /// Count embeddings of the pattern in the data graph. With
    /// [`ceci_common::Dedupe::AutoMorph`] embeddings onto the same data
    /// vertex set count once.
    pub fn count(&self) -> Result<MatchOutcome, MatchError> {
        let mut ctx = MatchContext::new(self.data.vertex_count());
        let prepared = match self.prepare(&mut ctx)? {
            Preparation::Ready(p) => p,
            Preparation::Exhausted(phase) => return Ok(MatchOutcome::exhausted(phase, ctx)),
        };

        let sizes: Vec<usize> = prepared.flat.iter().map(Vec::len).collect();
        let collapse = self.config.dedupe.collapses();
        // A capped count walks the whole pattern depth-first.
        let plan = Partitioner::new(self.pattern, &prepared.tree, &sizes)
            .split(self.config.partition && !collapse && self.config.limit.is_none());
        ctx.stats.partition_sizes = (plan.first.len(), plan.second.len());

        let enumerator = Enumerator::new(
            self.data,
            self.pattern,
            &prepared.tree,
            &prepared.space,
            &prepared.flat,
            self.intersector,
        );
        let tally = if collapse {
            enumerator.distinct_subgraphs(&plan, self.config.limit, &mut ctx)
        } else {
            enumerator.count(&plan, self.config.limit, &mut ctx)
        };
        debug!(count = tally.count, truncated = tally.truncated, "match done");
        Ok(MatchOutcome {
            count: tally.count,
            termination: if tally.joined {
                Termination::Joined
            } else {
                Termination::Enumerated
            },
            truncated: tally.truncated,
            stats: ctx.into_stats(),
        })
    }

    /// Every embedding, up to the configured limit. With
    /// [`ceci_common::Dedupe::AutoMorph`] only the first embedding onto each
    /// data vertex set is kept.
    pub fn find_embeddings(&self) -> Result<Vec<Embedding>, MatchError> {
        let mut ctx = MatchContext::new(self.data.vertex_count());
        let prepared = match self.prepare(&mut ctx)? {
            Preparation::Ready(p) => p,
            Preparation::Exhausted(_) => return Ok(Vec::new()),
        };
        let sizes: Vec<usize> = prepared.flat.iter().map(Vec::len).collect();
        let plan = Partitioner::new(self.pattern, &prepared.tree, &sizes).split(false);
        let enumerator = Enumerator::new(
            self.data,
            self.pattern,
            &prepared.tree,
            &prepared.space,
            &prepared.flat,
            self.intersector,
        );
        let (rows, _) = if self.config.dedupe.collapses() {
            enumerator.distinct_embeddings(&plan, self.config.limit, &mut ctx)
        } else {
            enumerator.embeddings(&plan, self.config.limit, &mut ctx)
        };
        Ok(rows)
    }
}

/// Shorthand for `SubgraphMatcher::new(data, pattern, config).count()`.
pub fn count_embeddings(data: &Graph, pattern: &Graph, config: &Config) -> Result<MatchOutcome, MatchError> {
    SubgraphMatcher::new(data, pattern, config).count()
}

/// Count several patterns against one data graph. Each pattern gets its own
/// context; results keep the input order.
pub fn count_many(data: &Graph, patterns: &[Graph], config: &Config) -> Vec<Result<MatchOutcome, MatchError>> {
    #[cfg(feature = "rayon")]
    let iter = patterns.par_iter();

    #[cfg(not(feature = "rayon"))]
    let iter = patterns.iter();

    iter.map(|pattern| count_embeddings(data, pattern, config)).collect()
}
