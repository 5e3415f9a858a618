//! Schema-driven conversion of text tables into typed batches

use crate::format::TableFormat;
use crate::{SourceError, SourceResult};
use chrono::NaiveDate;
use std::collections::HashMap;
use swx_core::{
    Batch, Definitiveness, FieldDecl, FieldKind, FieldRole, FieldValue, Observation,
    PlaceholderRule, Provenance, RecordSchema,
};

/// Column indices holding the calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateColumns {
    pub year: usize,
    pub month: usize,
    pub day: usize,
}

/// Binding of one column index to a field declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub index: usize,
    pub decl: FieldDecl,
}

impl ColumnSpec {
    pub fn new(index: usize, decl: FieldDecl) -> Self {
        Self { index, decl }
    }
}

/// Complete description of one published table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub format: TableFormat,
    pub date: DateColumns,
    pub columns: Vec<ColumnSpec>,
    pub placeholder: Option<PlaceholderRule>,
}

impl TableSchema {
    pub fn new(format: TableFormat, date: DateColumns, columns: Vec<ColumnSpec>) -> Self {
        Self {
            format,
            date,
            columns,
            placeholder: None,
        }
    }

    pub fn with_placeholder(mut self, field: &str, value: f64) -> Self {
        self.placeholder = Some(PlaceholderRule {
            field: field.to_string(),
            value,
        });
        self
    }

    /// Minimum column count a data row must provide
    pub fn expected_columns(&self) -> usize {
        let date_max = self.date.year.max(self.date.month).max(self.date.day);
        let col_max = self.columns.iter().map(|c| c.index).max().unwrap_or(0);
        date_max.max(col_max) + 1
    }

    /// The record schema batches parsed with this table carry
    pub fn record_schema(&self) -> RecordSchema {
        RecordSchema {
            fields: self.columns.iter().map(|c| c.decl.clone()).collect(),
            placeholder: self.placeholder.clone(),
        }
    }
}

/// Parse a fetched text body into a batch.
///
/// Header and comment lines are skipped; blank lines are ignored. A body
/// with zero data lines yields an empty batch, which is valid output and
/// distinct from a fetch failure.
pub fn parse_batch(
    text: &str,
    schema: &TableSchema,
    provenance: Provenance,
    definitiveness: Definitiveness,
) -> SourceResult<Batch> {
    let expected = schema.expected_columns();
    let mut records = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if idx < schema.format.skip_header {
            continue;
        }
        if raw.trim().is_empty() || schema.format.is_comment(raw) {
            continue;
        }

        let cols = schema.format.layout.split(raw);
        if cols.len() < expected {
            return Err(SourceError::SchemaMismatch {
                line: line_no,
                expected,
                found: cols.len(),
            });
        }

        let year: i32 = parse_numeric(cols[schema.date.year], "year", line_no)?;
        let month: u32 = parse_numeric(cols[schema.date.month], "month", line_no)?;
        let day: u32 = parse_numeric(cols[schema.date.day], "day", line_no)?;
        let date =
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| SourceError::ParseError {
                line: line_no,
                field: "date".to_string(),
                reason: format!("invalid calendar date {}-{}-{}", year, month, day),
            })?;

        let mut fields = HashMap::with_capacity(schema.columns.len());
        for col in &schema.columns {
            if col.decl.role == FieldRole::Ignored {
                continue;
            }
            let value = convert_field(cols[col.index], &col.decl, line_no)?;
            fields.insert(col.decl.name.clone(), value);
        }

        records.push(Observation {
            date,
            fields,
            definitive: definitiveness,
            provenance,
        });
    }

    Ok(Batch::new(
        provenance,
        definitiveness,
        schema.record_schema(),
        records,
    ))
}

fn convert_field(raw: &str, decl: &FieldDecl, line: usize) -> SourceResult<FieldValue> {
    if raw.is_empty() {
        // Blank fixed-width column: no observation for this field.
        return Ok(FieldValue::Missing);
    }
    match decl.kind {
        FieldKind::Float => raw
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|e| SourceError::ParseError {
                line,
                field: decl.name.clone(),
                reason: format!("'{}': {}", raw, e),
            }),
        FieldKind::Integer => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| SourceError::ParseError {
                line,
                field: decl.name.clone(),
                reason: format!("'{}': {}", raw, e),
            }),
    }
}

fn parse_numeric<T: std::str::FromStr>(raw: &str, field: &str, line: usize) -> SourceResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| SourceError::ParseError {
        line,
        field: field.to_string(),
        reason: format!("'{}': {}", raw, e),
    })
}
