
use std::collections::HashSet;

use ceci_common::{Config, IntersectionStrategy};
use ceci_subgraph::{CandidateGenerator, Graph, SetIntersector, SubgraphMatcher, VertexId};
use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use test_harness::brute_force;

fn ascending(values: Vec<u16>) -> Vec<u32> {
    let mut out: Vec<u32> = values.into_iter().map(u32::from).collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[test]
fn kernels_agree_with_hash_intersection() {
    fn prop(a: Vec<u16>, b: Vec<u16>) -> bool {
        let (a, b) = (ascending(a), ascending(b));
        let lookup: HashSet<u32> = b.iter().copied().collect();
        let expected: Vec<u32> = a.iter().copied().filter(|x| lookup.contains(x)).collect();
        [
            IntersectionStrategy::Merge,
            IntersectionStrategy::Galloping,
            IntersectionStrategy::Block,
            IntersectionStrategy::Hybrid,
        ]
        .into_iter()
        .flat_map(|s| [SetIntersector::new(s), SetIntersector::portable(s)])
        .all(|ix| {
            ix.intersect(&a, &b) == expected
                && ix.intersect_count(&b, &a) == expected.len()
                && ix.intersects(&a, &b) == !expected.is_empty()
        })
    }
    QuickCheck::new().tests(300).quickcheck(prop as fn(Vec<u16>, Vec<u16>) -> bool);
}

/// Small connected labelled graph.
#[derive(Clone, Debug)]
struct SmallGraph {
    labels: Vec<u32>,
    edges: Vec<(VertexId, VertexId)>,
}

impl SmallGraph {
    fn build(&self) -> Graph {
        Graph::from_edges(self.labels.clone(), &self.edges).expect("generated graphs are valid")
    }

    fn arbitrary_sized(g: &mut Gen, min: usize, max: usize, labels: u32, density: u8) -> Self {
        let n = min + usize::arbitrary(g) % (max - min + 1);
        let labels: Vec<u32> = (0..n).map(|_| u32::arbitrary(g) % labels).collect();
        let mut edges = Vec::new();
        // Spanning path keeps it connected.
        for v in 1..n as VertexId {
            let parent = u32::arbitrary(g) % v;
            edges.push((parent, v));
        }
        for a in 0..n as VertexId {
            for b in a + 1..n as VertexId {
                if u8::arbitrary(g) % 100 < density && !edges.contains(&(a, b)) && !edges.contains(&(b, a)) {
                    edges.push((a, b));
                }
            }
        }
        Self { labels, edges }
    }
}

#[derive(Clone, Debug)]
struct Instance {
    data: SmallGraph,
    pattern: SmallGraph,
}

impl Arbitrary for Instance {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            data: SmallGraph::arbitrary_sized(g, 4, 11, 2, 35),
            pattern: SmallGraph::arbitrary_sized(g, 1, 5, 2, 30),
        }
    }
}

#[test]
fn engine_matches_backtracking() {
    fn prop(instance: Instance) -> TestResult {
        let data = instance.data.build();
        let pattern = instance.pattern.build();
        let expected = brute_force(&data, &pattern);
        for partition in [true, false] {
            let config = Config::builder().partition(partition).build();
            let outcome = match SubgraphMatcher::new(&data, &pattern, &config).count() {
                Ok(o) => o,
                Err(e) => return TestResult::error(e.to_string()),
            };
            if outcome.count != expected.len() as u64 {
                return TestResult::error(format!(
                    "partition={partition}: expected {}, got {}",
                    expected.len(),
                    outcome.count
                ));
            }
        }
        let distinct: HashSet<Vec<VertexId>> = expected
            .iter()
            .map(|row| {
                let mut s = row.clone();
                s.sort_unstable();
                s
            })
            .collect();
        let config = Config::builder().auto_morph().build();
        match SubgraphMatcher::new(&data, &pattern, &config).count() {
            Ok(o) if o.count == distinct.len() as u64 => {}
            Ok(o) => return TestResult::error(format!("auto-morph: expected {}, got {}", distinct.len(), o.count)),
            Err(e) => return TestResult::error(e.to_string()),
        }
        let found: HashSet<Vec<VertexId>> = match SubgraphMatcher::new(&data, &pattern, &Config::default())
            .find_embeddings()
        {
            Ok(rows) => rows.iter().map(|e| e.as_slice().to_vec()).collect(),
            Err(e) => return TestResult::error(e.to_string()),
        };
        let expected: HashSet<Vec<VertexId>> = expected.into_iter().collect();
        TestResult::from_bool(found == expected)
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(Instance) -> TestResult);
}

#[test]
fn nlf_filter_keeps_every_true_image() {
    fn prop(instance: Instance) -> bool {
        let data = instance.data.build();
        let pattern = instance.pattern.build();
        let candidates = CandidateGenerator::new(&data, &pattern).generate();
        brute_force(&data, &pattern).iter().all(|row| {
            row.iter()
                .enumerate()
                .all(|(u, v)| candidates.get(u as VertexId).binary_search(v).is_ok())
        })
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(Instance) -> bool);
}

#[test]
fn edges_round_trip_through_text() {
    fn prop(instance: Instance) -> bool {
        let g = instance.data.build();
        let mut text = format!("t {} {}\n", g.vertex_count(), g.edge_count());
        for v in 0..g.vertex_count() as VertexId {
            text.push_str(&format!("v {v} {} {}\n", g.label(v), g.degree(v)));
        }
        for (a, b) in g.edges() {
            text.push_str(&format!("e {a} {b}\n"));
        }
        let parsed: Graph = match text.parse() {
            Ok(p) => p,
            Err(_) => return false,
        };
        parsed.edges().collect::<Vec<_>>() == g.edges().collect::<Vec<_>>()
            && (0..g.vertex_count() as VertexId).all(|v| parsed.label(v) == g.label(v))
    }
    QuickCheck::new().tests(100).quickcheck(prop as fn(Instance) -> bool);
}

#[test]
fn nlf_candidates_dominate_their_pattern_vertex() {
    fn prop(instance: Instance) -> TestResult {
        let data = instance.data.build();
        let pattern = instance.pattern.build();
        let candidates = CandidateGenerator::new(&data, &pattern).generate();
        for u in 0..pattern.vertex_count() as VertexId {
            for &v in candidates.get(u) {
                if data.label(v) != pattern.label(u) {
                    return TestResult::error(format!("{v} kept for {u} with label {}", data.label(v)));
                }
                if data.degree(v) < pattern.degree(u) {
                    return TestResult::error(format!("{v} kept for {u} with degree {}", data.degree(v)));
                }
                if let Some(entry) = pattern.nlf(u).iter().find(|e| data.nlf_count(v, e.label) < e.count) {
                    return TestResult::error(format!("{v} kept for {u} short on label {}", entry.label));
                }
            }
        }
        TestResult::passed()
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(Instance) -> TestResult);
}

#[test]
fn edge_lookup_matches_edge_list_for_every_pair() {
    fn prop(instance: Instance) -> TestResult {
        let g = instance.data.build();
        let edges: HashSet<(VertexId, VertexId)> = instance
            .data
            .edges
            .iter()
            .flat_map(|&(a, b)| [(a, b), (b, a)])
            .collect();
        let n = g.vertex_count() as VertexId;
        for a in 0..n {
            for b in 0..n {
                if g.check_edge_existence(a, b) != edges.contains(&(a, b)) {
                    return TestResult::error(format!("edge lookup wrong for ({a}, {b})"));
                }
            }
        }
        TestResult::from_bool(!g.check_edge_existence(0, n))
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(Instance) -> TestResult);
}
