//! swx - fetch and reconcile published space-weather index series
//!
//! Usage: swx <sunspots|kp> [--list]
//!
//! Fetches the archived and current-period series for the chosen dataset,
//! merges them (archive authoritative), and writes the result as JSON
//! lines to stdout, or to the path in SWX_OUT.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use swx_cli::{build_source, run_fetch, run_list, Dataset};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    swx_obs::init("swx");

    let cfg = swx_config::AppConfig::load().context("failed to load configuration")?;

    let mut args = std::env::args().skip(1);
    let dataset: Dataset = match args.next() {
        Some(arg) => arg.parse()?,
        None => bail!("usage: swx <sunspots|kp> [--list]"),
    };
    let list = args.next().as_deref() == Some("--list");

    let source = build_source(dataset, &cfg)?;

    if list {
        return run_list(source.as_ref()).await;
    }

    let out = std::env::var("SWX_OUT").ok().map(PathBuf::from);
    let count = run_fetch(source.as_ref(), out.as_deref()).await?;
    info!(records = count, "series written");

    Ok(())
}
