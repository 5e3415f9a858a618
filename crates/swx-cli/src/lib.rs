use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use swx_config::AppConfig;
use swx_core::{DateConflict, Series};
use swx_gfz::GfzSource;
use swx_silso::SilsoSource;
use swx_source::{fetch_merged, HttpFetcher, SeriesSource};
use tracing::warn;

/// Which published series to retrieve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Sunspots,
    Kp,
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sunspots" => Ok(Dataset::Sunspots),
            "kp" => Ok(Dataset::Kp),
            other => bail!("unknown dataset '{}', expected 'sunspots' or 'kp'", other),
        }
    }
}

/// Build the configured source for a dataset
pub fn build_source(dataset: Dataset, cfg: &AppConfig) -> Result<Box<dyn SeriesSource>> {
    let fetcher = HttpFetcher::new(cfg.http_timeout()).context("failed to build HTTP client")?;
    Ok(match dataset {
        Dataset::Sunspots => Box::new(SilsoSource::new(fetcher, cfg.silso_base_url())),
        Dataset::Kp => Box::new(GfzSource::new(fetcher, cfg.gfz_base_url())),
    })
}

/// Fetch archive + current concurrently, merge, and emit the series.
/// Returns the number of records written.
pub async fn run_fetch(source: &dyn SeriesSource, out: Option<&Path>) -> Result<usize> {
    let merged = fetch_merged(source).await?;
    log_conflicts(&merged.conflicts);
    write_series(&merged.series, out)?;
    Ok(merged.series.len())
}

/// Print the source's available remote filenames
pub async fn run_list(source: &dyn SeriesSource) -> Result<()> {
    let names = source
        .list_resources()
        .await
        .with_context(|| format!("{}: listing failed", source.name()))?;
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

pub fn log_conflicts(conflicts: &[DateConflict]) {
    for conflict in conflicts {
        warn!(
            date = %conflict.date,
            provenance = %conflict.provenance,
            "duplicate date within one authority level, first occurrence kept"
        );
    }
}

/// Write the series as one JSON object per line, to a file or stdout
pub fn write_series(series: &Series, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            emit(series, std::io::BufWriter::new(file))
        }
        None => emit(series, std::io::stdout().lock()),
    }
}

fn emit<W: Write>(series: &Series, mut writer: W) -> Result<()> {
    for record in &series.records {
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
