//! Scenario runner for the gridtactics displacement pipeline.
//!
//! Loads a JSON scenario (board, actors, requests, config), runs one
//! resolution pass and prints the resolved batch, the event log, final actor
//! state and the board hash as JSON on stdout. Logs go to stderr; set
//! `RUST_LOG=debug` or `RUST_LOG=gridtactics_core=trace` for pipeline detail.
//!
//! ```text
//! gridtactics-sim crates/gridtactics-sim/scenarios/domino_row.json
//! ```

mod scenario;

use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: gridtactics-sim <scenario.json>")?;
    let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let scenario = Scenario::from_json(&text).with_context(|| format!("loading {path}"))?;
    info!(
        path = %path,
        actors = scenario.actors.len(),
        requests = scenario.requests.len(),
        "scenario loaded"
    );

    let report = scenario.run().with_context(|| format!("running {path}"))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
