//! Remote series retrieval and text-table parsing
//!
//! This crate turns a remote text resource plus a declared column schema
//! into a typed batch of observations. Transport failures, row-shape
//! mismatches, and field conversion failures are distinguished so that a
//! successful fetch with zero rows is never confused with a failed fetch.

pub mod fetch;
pub mod format;
pub mod reader;

pub use fetch::*;
pub use format::*;
pub use reader::*;

use anyhow::Context;
use swx_core::{default_priority, merge_batches, Batch, Merged};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("schema mismatch on line {line}: expected {expected} columns, found {found}")]
    SchemaMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("parse error on line {line}, field '{field}': {reason}")]
    ParseError {
        line: usize,
        field: String,
        reason: String,
    },

    #[error("bad resource: {0}")]
    BadResource(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::SourceUnavailable(err.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// A remote provider of dated observation batches
#[async_trait::async_trait]
pub trait SeriesSource: Send + Sync {
    /// Source name/identifier
    fn name(&self) -> &str;

    /// List available remote filenames
    async fn list_resources(&self) -> SourceResult<Vec<String>>;

    /// Fetch the archived (reprocessed, authoritative) series
    async fn fetch_archive(&self) -> SourceResult<Batch>;

    /// Fetch the provisional current-period series
    async fn fetch_current(&self) -> SourceResult<Batch>;

    /// Fetch one calendar year of the series
    async fn fetch_year(&self, year: i32) -> SourceResult<Batch>;
}

/// Fetch a source's archived and current-period batches concurrently and
/// reconcile them with the default authority ordering.
///
/// The archive must be reachable. A failed current-period fetch degrades to
/// an archive-only series; the reconciler itself never sees the failure.
pub async fn fetch_merged(source: &dyn SeriesSource) -> anyhow::Result<Merged> {
    let (archive, current) = tokio::join!(source.fetch_archive(), source.fetch_current());

    let archive = archive.with_context(|| format!("{}: archive fetch failed", source.name()))?;
    let mut batches = vec![archive];
    match current {
        Ok(batch) => batches.push(batch),
        Err(e) => warn!(
            source = source.name(),
            error = %e,
            "current-period fetch failed, continuing with archive only"
        ),
    }

    let merged = merge_batches(&batches, &default_priority())?;
    Ok(merged)
}
