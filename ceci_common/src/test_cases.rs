//! Common test cases and definitions for the CECI workspace.
//!
//! Each case pairs a pattern graph with a data graph, both written in the
//! plain-text graph format understood by `ceci_subgraph::Graph`, together
//! with the configuration used for the search and the expected count.

use crate::config::{Config, Dedupe};

/// A graph fixture stored in the text graph format.
#[derive(Debug, Clone, Copy)]
pub struct GraphFixture {
    /// Human readable name.
    pub name: &'static str,
    /// `t`/`v`/`e` lines.
    pub text: &'static str,
}

/// A complete test case definition.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// The name of the test case.
    pub name: &'static str,
    /// The configuration for the search.
    pub config: Config,
    /// The pattern to search for.
    pub pattern: &'static GraphFixture,
    /// The graph to search in.
    pub data: &'static GraphFixture,
    /// The expected number of embeddings.
    pub expected_matches: u64,
}

// #####################
// GRAPHS
// #####################

/// Triangle, every vertex labelled 0.
pub static TRIANGLE: GraphFixture = GraphFixture {
    name: "triangle",
    text: "t 3 3
v 0 0 2
v 1 0 2
v 2 0 2
e 0 1
e 0 2
e 1 2
",
};

/// Triangle labelled 0, 1, 2.
pub static TRIANGLE_012: GraphFixture = GraphFixture {
    name: "triangle_012",
    text: "t 3 3
v 0 0 2
v 1 1 2
v 2 2 2
e 0 1
e 1 2
e 0 2
",
};

/// Path on three vertices, every vertex labelled 0.
pub static PATH_3: GraphFixture = GraphFixture {
    name: "path_3",
    text: "t 3 2
v 0 0 1
v 1 0 2
v 2 0 1
e 0 1
e 1 2
",
};

/// Path on three vertices labelled 0, 1, 0.
pub static PATH_3_ALTERNATING: GraphFixture = GraphFixture {
    name: "path_3_alternating",
    text: "t 3 2
v 0 0 1
v 1 1 2
v 2 0 1
e 0 1
e 1 2
",
};

/// Path on five vertices labelled 0, 1, 0, 1, 0.
pub static PATH_5_ALTERNATING: GraphFixture = GraphFixture {
    name: "path_5_alternating",
    text: "t 5 4
v 0 0 1
v 1 1 2
v 2 0 2
v 3 1 2
v 4 0 1
e 0 1
e 1 2
e 2 3
e 3 4
",
};

/// Star with a centre of degree four, every vertex labelled 0.
pub static STAR_4: GraphFixture = GraphFixture {
    name: "star_4",
    text: "t 5 4
v 0 0 4
v 1 0 1
v 2 0 1
v 3 0 1
v 4 0 1
e 0 1
e 0 2
e 0 3
e 0 4
",
};

/// Two components: a 0-1-2 labelled triangle and a 0-1-2-0 labelled path.
pub static SPLIT_COMPONENTS: GraphFixture = GraphFixture {
    name: "split_components",
    text: "t 7 6
v 0 0 2
v 1 1 2
v 2 2 2
v 3 0 1
v 4 1 2
v 5 2 2
v 6 0 1
e 0 1
e 1 2
e 0 2
e 3 4
e 4 5
e 5 6
",
};

/// Cycle on four vertices, every vertex labelled 0.
pub static CYCLE_4: GraphFixture = GraphFixture {
    name: "cycle_4",
    text: "t 4 4
v 0 0 2
v 1 0 2
v 2 0 2
v 3 0 2
e 0 1
e 1 2
e 2 3
e 3 0
",
};

/// Complete graph on four vertices, every vertex labelled 0.
pub static K4: GraphFixture = GraphFixture {
    name: "k4",
    text: "t 4 6
v 0 0 3
v 1 0 3
v 2 0 3
v 3 0 3
e 0 1
e 0 2
e 0 3
e 1 2
e 1 3
e 2 3
",
};

/// Three by three grid, every vertex labelled 0.
pub static GRID_3X3: GraphFixture = GraphFixture {
    name: "grid_3x3",
    text: "t 9 12
v 0 0 2
v 1 0 3
v 2 0 2
v 3 0 3
v 4 0 4
v 5 0 3
v 6 0 2
v 7 0 3
v 8 0 2
e 0 1
e 1 2
e 3 4
e 4 5
e 6 7
e 7 8
e 0 3
e 3 6
e 1 4
e 4 7
e 2 5
e 5 8
",
};

/// Two triangles sharing a label-0 centre; the other vertices are label 1.
pub static BOWTIE: GraphFixture = GraphFixture {
    name: "bowtie",
    text: "t 5 6
v 0 0 4
v 1 1 2
v 2 1 2
v 3 1 2
v 4 1 2
e 0 1
e 0 2
e 1 2
e 0 3
e 0 4
e 3 4
",
};

/// Every fixture graph, for loader tests.
pub static ALL_GRAPHS: [&GraphFixture; 11] = [
    &TRIANGLE,
    &TRIANGLE_012,
    &PATH_3,
    &PATH_3_ALTERNATING,
    &PATH_5_ALTERNATING,
    &STAR_4,
    &SPLIT_COMPONENTS,
    &CYCLE_4,
    &K4,
    &GRID_3X3,
    &BOWTIE,
];

fn case(
    name: &'static str,
    pattern: &'static GraphFixture,
    data: &'static GraphFixture,
    dedupe: Dedupe,
    expected_matches: u64,
) -> TestCase {
    TestCase {
        name,
        config: Config::builder().dedupe(dedupe).build(),
        pattern,
        data,
        expected_matches,
    }
}

lazy_static::lazy_static! {
    /// Every named case with its expected embedding count.
    pub static ref ALL_TEST_CASES: Vec<TestCase> = vec![
        case("triangle_in_triangle", &TRIANGLE, &TRIANGLE, Dedupe::None, 6),
        case("triangle_in_triangle_auto_morph", &TRIANGLE, &TRIANGLE, Dedupe::AutoMorph, 1),
        case("alternating_path", &PATH_3_ALTERNATING, &PATH_5_ALTERNATING, Dedupe::None, 4),
        case("alternating_path_auto_morph", &PATH_3_ALTERNATING, &PATH_5_ALTERNATING, Dedupe::AutoMorph, 2),
        case("star_in_path", &STAR_4, &PATH_5_ALTERNATING, Dedupe::None, 0),
        case("triangle_in_split_components", &TRIANGLE_012, &SPLIT_COMPONENTS, Dedupe::None, 1),
        case("path_in_triangle", &PATH_3, &TRIANGLE, Dedupe::None, 6),
        case("path_in_triangle_auto_morph", &PATH_3, &TRIANGLE, Dedupe::AutoMorph, 1),
        case("triangle_in_k4", &TRIANGLE, &K4, Dedupe::None, 24),
        case("triangle_in_k4_auto_morph", &TRIANGLE, &K4, Dedupe::AutoMorph, 4),
        case("cycle_in_k4", &CYCLE_4, &K4, Dedupe::None, 24),
        case("cycle_in_k4_auto_morph", &CYCLE_4, &K4, Dedupe::AutoMorph, 1),
        case("cycle_in_grid", &CYCLE_4, &GRID_3X3, Dedupe::None, 32),
        case("cycle_in_grid_auto_morph", &CYCLE_4, &GRID_3X3, Dedupe::AutoMorph, 4),
        case("triangle_in_grid", &TRIANGLE, &GRID_3X3, Dedupe::None, 0),
        case("bowtie_in_bowtie", &BOWTIE, &BOWTIE, Dedupe::None, 8),
        case("bowtie_in_bowtie_auto_morph", &BOWTIE, &BOWTIE, Dedupe::AutoMorph, 1),
    ];
}

/// Look up a named case.
pub fn test_case(name: &str) -> Option<&'static TestCase> {
    ALL_TEST_CASES.iter().find(|tc| tc.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rstest::rstest;

    use super::*;

    #[test]
    fn case_names_are_unique() {
        let names: HashSet<_> = ALL_TEST_CASES.iter().map(|tc| tc.name).collect();
        assert_eq!(names.len(), ALL_TEST_CASES.len());
    }

    #[rstest]
    #[case::triangle("triangle_in_triangle", 6)]
    #[case::grid("cycle_in_grid", 32)]
    fn lookup_by_name(#[case] name: &str, #[case] expected: u64) {
        let tc = test_case(name).expect("case exists");
        assert_eq!(tc.expected_matches, expected);
    }

    #[test]
    fn unknown_case_is_none() {
        assert!(test_case("no_such_case").is_none());
    }
}
