//! GFZ Potsdam geomagnetic Kp/ap index source
//!
//! Resources under the GFZ file service share one row format:
//! `YYYY MM DD days days_m Kp1..Kp8 ap1..ap8 Ap D`. Three variants feed
//! the series:
//! - `Kp_ap_since_1932.txt`: the full reprocessed archive.
//! - `Kp_ap_nowcast.txt`: the provisional nowcast for recent days.
//! - `Kp_ap_YYYY.txt`: one calendar year.

use swx_core::{Batch, Definitiveness, FieldDecl, FieldKind, Merged, Provenance};
use swx_source::{
    parse_batch, ColumnSpec, DateColumns, HttpFetcher, SeriesSource, SourceResult, TableFormat,
    TableSchema,
};

pub const ARCHIVE_FILE: &str = "Kp_ap_since_1932.txt";
pub const CURRENT_FILE: &str = "Kp_ap_nowcast.txt";

/// `-1` in the daily Ap column marks a day not yet measured
const NOT_MEASURED: f64 = -1.0;

pub struct GfzSource {
    fetcher: HttpFetcher,
    base_url: String,
}

impl GfzSource {
    pub fn new(fetcher: HttpFetcher, base_url: String) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url, file)
    }

    pub fn yearly_file(year: i32) -> String {
        format!("Kp_ap_{}.txt", year)
    }

    /// Shared schema of the Kp/ap files. The `days`/`days_m` epoch columns
    /// duplicate the calendar date and the trailing `D` marker is superseded
    /// by batch-level definitiveness.
    pub fn table_schema() -> TableSchema {
        let mut columns = vec![
            ColumnSpec::new(3, FieldDecl::ignored("days")),
            ColumnSpec::new(4, FieldDecl::ignored("days_m")),
        ];
        for slot in 1..=8 {
            columns.push(ColumnSpec::new(
                4 + slot,
                FieldDecl::value(&format!("kp{}", slot), FieldKind::Float),
            ));
        }
        for slot in 1..=8 {
            columns.push(ColumnSpec::new(
                12 + slot,
                FieldDecl::value(&format!("ap{}", slot), FieldKind::Integer),
            ));
        }
        columns.push(ColumnSpec::new(21, FieldDecl::value("Ap", FieldKind::Integer)));
        columns.push(ColumnSpec::new(22, FieldDecl::ignored("D")));

        TableSchema::new(
            TableFormat::whitespace().with_comments('#'),
            DateColumns {
                year: 0,
                month: 1,
                day: 2,
            },
            columns,
        )
        .with_placeholder("Ap", NOT_MEASURED)
    }

    /// Fetch and reconcile the archived and nowcast series
    pub async fn fetch_kp_series(&self) -> anyhow::Result<Merged> {
        swx_source::fetch_merged(self).await
    }
}

#[async_trait::async_trait]
impl SeriesSource for GfzSource {
    fn name(&self) -> &str {
        "gfz"
    }

    async fn list_resources(&self) -> SourceResult<Vec<String>> {
        let names = self.fetcher.list_resources(&self.base_url, ".txt").await?;
        Ok(names
            .into_iter()
            .filter(|n| n.starts_with("Kp_ap_"))
            .collect())
    }

    async fn fetch_archive(&self) -> SourceResult<Batch> {
        let text = self.fetcher.fetch_text(&self.url(ARCHIVE_FILE)).await?;
        parse_batch(
            &text,
            &Self::table_schema(),
            Provenance::Archive,
            Definitiveness::Definitive,
        )
    }

    async fn fetch_current(&self) -> SourceResult<Batch> {
        let text = self.fetcher.fetch_text(&self.url(CURRENT_FILE)).await?;
        parse_batch(
            &text,
            &Self::table_schema(),
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
        )
    }

    async fn fetch_year(&self, year: i32) -> SourceResult<Batch> {
        let text = self
            .fetcher
            .fetch_text(&self.url(&Self::yearly_file(year)))
            .await?;
        parse_batch(
            &text,
            &Self::table_schema(),
            Provenance::YearlyFile,
            Definitiveness::Definitive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swx_core::{default_priority, merge_batches, FieldValue};

    // Two archive days and one not-yet-measured nowcast day, in the
    // published column layout.
    const ARCHIVE_FIXTURE: &str = "\
#YYYY MM DD days days_m Kp1 Kp2 Kp3 Kp4 Kp5 Kp6 Kp7 Kp8 ap1 ap2 ap3 ap4 ap5 ap6 ap7 ap8 Ap D
2024 01 01 45290.0 45290.5 2.000 2.333 1.667 1.000 0.667 1.333 2.000 2.667 7 9 6 4 3 5 7 12 7 1
2024 01 02 45291.0 45291.5 3.000 3.333 2.667 2.000 1.667 2.333 3.000 3.667 15 18 12 7 6 9 15 22 13 1
";

    const NOWCAST_FIXTURE: &str = "\
#YYYY MM DD days days_m Kp1 Kp2 Kp3 Kp4 Kp5 Kp6 Kp7 Kp8 ap1 ap2 ap3 ap4 ap5 ap6 ap7 ap8 Ap D
2024 01 02 45291.0 45291.5 4.000 4.333 3.667 3.000 2.667 3.333 4.000 4.667 27 32 22 15 12 18 27 39 24 0
2024 01 03 45292.0 45292.5 -1.000 -1.000 -1.000 -1.000 -1.000 -1.000 -1.000 -1.000 -1 -1 -1 -1 -1 -1 -1 -1 -1 0
";

    fn archive_batch() -> Batch {
        parse_batch(
            ARCHIVE_FIXTURE,
            &GfzSource::table_schema(),
            Provenance::Archive,
            Definitiveness::Definitive,
        )
        .unwrap()
    }

    fn nowcast_batch() -> Batch {
        parse_batch(
            NOWCAST_FIXTURE,
            &GfzSource::table_schema(),
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_archive_fixture() {
        let batch = archive_batch();
        assert_eq!(batch.len(), 2);

        let first = &batch.records[0];
        assert_eq!(first.fields["kp1"], FieldValue::Float(2.0));
        assert_eq!(first.fields["kp8"], FieldValue::Float(2.667));
        assert_eq!(first.fields["ap1"], FieldValue::Integer(7));
        assert_eq!(first.fields["Ap"], FieldValue::Integer(7));
        assert!(!first.fields.contains_key("days"));
        assert!(!first.fields.contains_key("D"));
    }

    #[test]
    fn test_merged_kp_series() {
        let merged =
            merge_batches(&[archive_batch(), nowcast_batch()], &default_priority()).unwrap();
        let records = &merged.series.records;

        // Jan 2 overlaps: the reprocessed archive value wins over the
        // nowcast. Jan 3 is an Ap=-1 placeholder row: dropped.
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date.to_string(), "2024-01-02");
        assert_eq!(records[1].fields["Ap"], FieldValue::Integer(13));
        assert_eq!(records[1].definitive, Definitiveness::Definitive);
    }

    #[test]
    fn test_yearly_filename() {
        assert_eq!(GfzSource::yearly_file(2023), "Kp_ap_2023.txt");
    }
}
