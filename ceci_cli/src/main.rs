//! CECI subgraph matcher CLI
//!
//! Loads a data graph and one or more pattern graphs, counts the embeddings
//! of each pattern and prints one result line per pattern.

#[global_allocator]
/// Global allocator using jemalloc for better performance in parallel workloads.
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod args;

use std::io;
use std::path::{Path, PathBuf};

use ceci_common::Config;
use ceci_subgraph::{Graph, MatchError, MatchOutcome, SubgraphMatcher, Termination, profiling};
use clap::Parser;
use rayon::prelude::*;
use tracing::{error, info};

use args::Args;

struct Row {
    pattern: PathBuf,
    result: Result<MatchOutcome, MatchError>,
}

fn termination_name(t: Termination) -> String {
    match t {
        Termination::Enumerated => "enumerated".to_owned(),
        Termination::Joined => "joined".to_owned(),
        Termination::EarlyExit(phase) => format!("early-exit:{phase:?}").to_lowercase(),
    }
}

fn run(data: &Graph, path: &Path, config: &Config) -> Result<MatchOutcome, MatchError> {
    let pattern = Graph::load(path)?;
    SubgraphMatcher::new(data, &pattern, config).count()
}

fn write_csv(rows: &[Row]) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = csv::Writer::from_writer(io::stdout());
    out.write_record(["pattern", "count", "termination", "truncated", "error"])?;
    for row in rows {
        let pattern = row.pattern.display().to_string();
        match &row.result {
            Ok(o) => out.write_record([
                pattern,
                o.count.to_string(),
                termination_name(o.termination),
                o.truncated.to_string(),
                String::new(),
            ])?,
            Err(e) => out.write_record([pattern, String::new(), String::new(), String::new(), e.to_string()])?,
        }
    }
    out.flush()?;
    Ok(())
}

fn write_text(rows: &[Row], config: &Config) {
    for row in rows {
        match &row.result {
            Ok(o) => {
                let capped = if o.truncated || config.limit_reached(o.count) {
                    " (limit reached)"
                } else {
                    ""
                };
                println!(
                    "{}: {}{capped} [{}]",
                    row.pattern.display(),
                    o.count,
                    termination_name(o.termination)
                );
            }
            Err(e) => println!("{}: error: {e}", row.pattern.display()),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    info!("Loading data graph: {}", args.data.display());
    let data = Graph::load(&args.data)?;
    info!(
        vertices = data.vertex_count(),
        edges = data.edge_count(),
        labels = data.label_count(),
        "data graph loaded"
    );

    let rows: Vec<Row> = args
        .pattern
        .par_iter()
        .map(|path| Row {
            pattern: path.clone(),
            result: run(&data, path, &config),
        })
        .collect();

    for row in &rows {
        if let Err(e) = &row.result {
            error!("{}: {e}", row.pattern.display());
        }
    }

    if args.csv {
        write_csv(&rows)?;
    } else {
        write_text(&rows, &config);
    }
    profiling::report();
    Ok(())
}
