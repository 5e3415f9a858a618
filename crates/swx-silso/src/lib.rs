//! SILSO sunspot number source (Royal Observatory of Belgium)
//!
//! Two published resources feed the daily series:
//! - `SN_d_tot_V2.0.txt`: the archived daily total sunspot number since
//!   1818, reprocessed monthly and treated as authoritative.
//! - `EISN/EISN_current.txt`: the estimated international sunspot number
//!   for the running month, provisional by definition.

use chrono::Datelike;
use swx_core::{Batch, Definitiveness, FieldDecl, FieldKind, Merged, Provenance};
use swx_source::{
    parse_batch, ColumnSpec, DateColumns, HttpFetcher, SeriesSource, SourceResult, TableFormat,
    TableSchema,
};

pub const ARCHIVE_FILE: &str = "SN_d_tot_V2.0.txt";
pub const CURRENT_FILE: &str = "EISN/EISN_current.txt";

/// `-1` in the sunspot column marks a day with no observation
const NO_OBSERVATION: f64 = -1.0;

pub struct SilsoSource {
    fetcher: HttpFetcher,
    base_url: String,
}

impl SilsoSource {
    pub fn new(fetcher: HttpFetcher, base_url: String) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url, file)
    }

    /// Columns of `SN_d_tot_V2.0.txt`: year month day decimal-date
    /// sunspot-number std-dev n-obs definitive-marker. The decimal date is
    /// redundant with the calendar columns and the per-row marker is
    /// superseded by batch-level definitiveness.
    pub fn archive_schema() -> TableSchema {
        TableSchema::new(
            TableFormat::whitespace(),
            DateColumns {
                year: 0,
                month: 1,
                day: 2,
            },
            vec![
                ColumnSpec::new(3, FieldDecl::ignored("decimal_date")),
                ColumnSpec::new(4, FieldDecl::value("sunspot_number", FieldKind::Float)),
                ColumnSpec::new(5, FieldDecl::quality("std_dev", FieldKind::Float)),
                ColumnSpec::new(6, FieldDecl::quality("n_obs", FieldKind::Integer)),
                ColumnSpec::new(7, FieldDecl::ignored("definitive_marker")),
            ],
        )
        .with_placeholder("sunspot_number", NO_OBSERVATION)
    }

    /// Columns of `EISN_current.txt`: year month day decimal-date eisn
    /// std-dev n-calc n-avail.
    pub fn current_schema() -> TableSchema {
        TableSchema::new(
            TableFormat::whitespace(),
            DateColumns {
                year: 0,
                month: 1,
                day: 2,
            },
            vec![
                ColumnSpec::new(3, FieldDecl::ignored("decimal_date")),
                ColumnSpec::new(4, FieldDecl::value("sunspot_number", FieldKind::Float)),
                ColumnSpec::new(5, FieldDecl::quality("std_dev", FieldKind::Float)),
                ColumnSpec::new(6, FieldDecl::quality("n_calc", FieldKind::Integer)),
                ColumnSpec::new(7, FieldDecl::quality("n_obs", FieldKind::Integer)),
            ],
        )
        .with_placeholder("sunspot_number", NO_OBSERVATION)
    }

    /// Fetch and reconcile the archived and current-month series
    pub async fn fetch_daily_series(&self) -> anyhow::Result<Merged> {
        swx_source::fetch_merged(self).await
    }
}

#[async_trait::async_trait]
impl SeriesSource for SilsoSource {
    fn name(&self) -> &str {
        "silso"
    }

    async fn list_resources(&self) -> SourceResult<Vec<String>> {
        self.fetcher.list_resources(&self.base_url, ".txt").await
    }

    async fn fetch_archive(&self) -> SourceResult<Batch> {
        let text = self.fetcher.fetch_text(&self.url(ARCHIVE_FILE)).await?;
        parse_batch(
            &text,
            &Self::archive_schema(),
            Provenance::Archive,
            Definitiveness::Definitive,
        )
    }

    async fn fetch_current(&self) -> SourceResult<Batch> {
        let text = self.fetcher.fetch_text(&self.url(CURRENT_FILE)).await?;
        parse_batch(
            &text,
            &Self::current_schema(),
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
        )
    }

    async fn fetch_year(&self, year: i32) -> SourceResult<Batch> {
        // SILSO publishes no per-year daily files; one year is a slice of
        // the archive.
        let text = self.fetcher.fetch_text(&self.url(ARCHIVE_FILE)).await?;
        let full = parse_batch(
            &text,
            &Self::archive_schema(),
            Provenance::YearlyFile,
            Definitiveness::Definitive,
        )?;
        let records = full
            .records
            .into_iter()
            .filter(|r| r.date.year() == year)
            .collect();
        Ok(Batch::new(
            full.provenance,
            full.definitiveness,
            full.schema,
            records,
        ))
    }
}
