//! Series reconciliation
//!
//! Merges one or more batches into a single chronologically ordered series.
//! Records from a higher-authority batch replace lower-authority records for
//! the same date regardless of the order the batches were fetched in. The
//! merge is a pure function: no I/O, no shared state.

use crate::types::{
    Batch, FieldDecl, FieldKind, FieldValue, ObsDate, Observation, Provenance, Series,
};
use std::collections::{btree_map::Entry, BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("incompatible schema: field '{field}' declared as {left:?} and {right:?}")]
    IncompatibleSchema {
        field: String,
        left: FieldKind,
        right: FieldKind,
    },

    #[error("no batches supplied to merge")]
    EmptyMergeResult,
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Two records of equal authority claimed the same date with differing values.
///
/// Resolved deterministically (first occurrence kept); reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConflict {
    pub date: ObsDate,
    pub provenance: Provenance,
}

/// Merge output: the series plus duplicate-date diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub series: Series,
    pub conflicts: Vec<DateConflict>,
}

/// Merge `batches` into one series.
///
/// `priority` ranks provenance tags from lowest to highest authority;
/// tags absent from the list rank below every listed tag. Fails with
/// `EmptyMergeResult` only when zero batches are supplied; batches that are
/// themselves empty are no-op contributions and an all-empty input yields a
/// valid empty series.
pub fn merge_batches(batches: &[Batch], priority: &[Provenance]) -> MergeResult<Merged> {
    if batches.is_empty() {
        return Err(MergeError::EmptyMergeResult);
    }

    let unified = unified_schema(batches)?;

    // Fold into a date-keyed map, higher authority winning each date.
    let mut winning: BTreeMap<ObsDate, (usize, &Observation, &Batch)> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for batch in batches {
        let rank = authority_rank(batch.provenance, priority);
        for record in &batch.records {
            match winning.entry(record.date) {
                Entry::Vacant(slot) => {
                    slot.insert((rank, record, batch));
                }
                Entry::Occupied(mut slot) => {
                    let (held_rank, held, _) = *slot.get();
                    if rank > held_rank {
                        slot.insert((rank, record, batch));
                    } else if rank == held_rank && record.fields != held.fields {
                        conflicts.push(DateConflict {
                            date: record.date,
                            provenance: batch.provenance,
                        });
                    }
                }
            }
        }
    }

    let mut records = Vec::with_capacity(winning.len());
    for (date, (_, record, batch)) in winning {
        if is_placeholder_row(record, batch) {
            continue;
        }

        let mut fields = HashMap::with_capacity(unified.len());
        for decl in &unified {
            let value = record
                .fields
                .get(&decl.name)
                .cloned()
                .unwrap_or(FieldValue::Missing);
            fields.insert(decl.name.clone(), value);
        }

        records.push(Observation {
            date,
            fields,
            // Definitiveness follows the batch that won the date, never the
            // row's own claim.
            definitive: batch.definitiveness,
            provenance: batch.provenance,
        });
    }

    Ok(Merged {
        series: Series { records },
        conflicts,
    })
}

/// Union of non-ignored fields across all batches, in order of first
/// appearance. Fails if the same name is declared with two kinds.
fn unified_schema(batches: &[Batch]) -> MergeResult<Vec<FieldDecl>> {
    let mut unified: Vec<FieldDecl> = Vec::new();
    for batch in batches {
        for decl in batch.schema.output_fields() {
            match unified.iter().find(|u| u.name == decl.name) {
                Some(existing) if existing.kind != decl.kind => {
                    return Err(MergeError::IncompatibleSchema {
                        field: decl.name.clone(),
                        left: existing.kind,
                        right: decl.kind,
                    });
                }
                Some(_) => {}
                None => unified.push(decl.clone()),
            }
        }
    }
    Ok(unified)
}

fn authority_rank(provenance: Provenance, priority: &[Provenance]) -> usize {
    priority
        .iter()
        .position(|p| *p == provenance)
        .map(|i| i + 1)
        .unwrap_or(0)
}

fn is_placeholder_row(record: &Observation, batch: &Batch) -> bool {
    match &batch.schema.placeholder {
        Some(rule) => record
            .fields
            .get(&rule.field)
            .and_then(FieldValue::as_f64)
            .is_some_and(|v| v == rule.value),
        None => false,
    }
}

/// Default authority ordering: current-period lowest, archive highest.
/// Both providers reprocess their archives, so the archive supersedes a
/// more recently fetched current-period value for the same date.
pub fn default_priority() -> Vec<Provenance> {
    vec![
        Provenance::CurrentPeriod,
        Provenance::YearlyFile,
        Provenance::Archive,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Definitiveness, RecordSchema};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> ObsDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        d: ObsDate,
        value: f64,
        definitive: Definitiveness,
        provenance: Provenance,
    ) -> Observation {
        let mut fields = HashMap::new();
        fields.insert("value".to_string(), FieldValue::Float(value));
        Observation {
            date: d,
            fields,
            definitive,
            provenance,
        }
    }

    fn value_schema() -> RecordSchema {
        RecordSchema::new(vec![FieldDecl::value("value", FieldKind::Float)])
    }

    fn archive_batch(records: Vec<Observation>) -> Batch {
        Batch::new(
            Provenance::Archive,
            Definitiveness::Definitive,
            value_schema(),
            records,
        )
    }

    fn current_batch(records: Vec<Observation>) -> Batch {
        Batch::new(
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
            value_schema(),
            records,
        )
    }

    #[test]
    fn test_merge_zero_batches_fails() {
        let err = merge_batches(&[], &default_priority()).unwrap_err();
        assert!(matches!(err, MergeError::EmptyMergeResult));
    }

    #[test]
    fn test_all_empty_batches_yield_empty_series() {
        let batches = [archive_batch(vec![]), current_batch(vec![])];
        let merged = merge_batches(&batches, &default_priority()).unwrap();
        assert!(merged.series.is_empty());
        assert!(merged.conflicts.is_empty());
    }

    #[test]
    fn test_authority_precedence() {
        let d = date(2020, 1, 1);
        let a = archive_batch(vec![record(
            d,
            10.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);
        let b = current_batch(vec![record(
            d,
            20.0,
            Definitiveness::Provisional,
            Provenance::CurrentPeriod,
        )]);

        // Lower-authority batch listed first; archive still wins.
        let merged = merge_batches(&[b, a], &default_priority()).unwrap();
        assert_eq!(merged.series.len(), 1);
        assert_eq!(
            merged.series.records[0].fields["value"],
            FieldValue::Float(10.0)
        );
        assert_eq!(
            merged.series.records[0].definitive,
            Definitiveness::Definitive
        );
    }

    #[test]
    fn test_archived_overlapping_current_scenario() {
        let archived = archive_batch(vec![record(
            date(2020, 1, 1),
            12.3,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);
        let current = current_batch(vec![
            record(
                date(2020, 1, 1),
                15.0,
                Definitiveness::Provisional,
                Provenance::CurrentPeriod,
            ),
            record(
                date(2020, 2, 1),
                9.1,
                Definitiveness::Provisional,
                Provenance::CurrentPeriod,
            ),
        ]);

        let merged = merge_batches(&[archived, current], &default_priority()).unwrap();
        let records = &merged.series.records;
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].date, date(2020, 1, 1));
        assert_eq!(records[0].fields["value"], FieldValue::Float(12.3));
        assert_eq!(records[0].definitive, Definitiveness::Definitive);

        assert_eq!(records[1].date, date(2020, 2, 1));
        assert_eq!(records[1].fields["value"], FieldValue::Float(9.1));
        assert_eq!(records[1].definitive, Definitiveness::Provisional);
    }

    #[test]
    fn test_unique_ascending_dates() {
        // Out-of-order input, overlapping dates across batches.
        let a = archive_batch(vec![
            record(
                date(2020, 3, 1),
                3.0,
                Definitiveness::Definitive,
                Provenance::Archive,
            ),
            record(
                date(2020, 1, 1),
                1.0,
                Definitiveness::Definitive,
                Provenance::Archive,
            ),
        ]);
        let b = current_batch(vec![
            record(
                date(2020, 2, 1),
                2.0,
                Definitiveness::Provisional,
                Provenance::CurrentPeriod,
            ),
            record(
                date(2020, 1, 1),
                99.0,
                Definitiveness::Provisional,
                Provenance::CurrentPeriod,
            ),
        ]);

        let merged = merge_batches(&[a, b], &default_priority()).unwrap();
        let dates: Vec<ObsDate> = merged.series.records.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![date(2020, 1, 1), date(2020, 2, 1), date(2020, 3, 1)]
        );
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_schema_union_pads_missing() {
        let schema_ab = RecordSchema::new(vec![
            FieldDecl::value("a", FieldKind::Float),
            FieldDecl::quality("b", FieldKind::Integer),
        ]);
        let schema_ac = RecordSchema::new(vec![
            FieldDecl::value("a", FieldKind::Float),
            FieldDecl::quality("c", FieldKind::Integer),
        ]);

        let mut fields_ab = HashMap::new();
        fields_ab.insert("a".to_string(), FieldValue::Float(1.0));
        fields_ab.insert("b".to_string(), FieldValue::Integer(2));
        let mut fields_ac = HashMap::new();
        fields_ac.insert("a".to_string(), FieldValue::Float(3.0));
        fields_ac.insert("c".to_string(), FieldValue::Integer(4));

        let left = Batch::new(
            Provenance::Archive,
            Definitiveness::Definitive,
            schema_ab,
            vec![Observation {
                date: date(2020, 1, 1),
                fields: fields_ab,
                definitive: Definitiveness::Definitive,
                provenance: Provenance::Archive,
            }],
        );
        let right = Batch::new(
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
            schema_ac,
            vec![Observation {
                date: date(2020, 1, 2),
                fields: fields_ac,
                definitive: Definitiveness::Provisional,
                provenance: Provenance::CurrentPeriod,
            }],
        );

        let merged = merge_batches(&[left, right], &default_priority()).unwrap();
        let records = &merged.series.records;

        assert_eq!(records[0].fields["b"], FieldValue::Integer(2));
        assert_eq!(records[0].fields["c"], FieldValue::Missing);
        assert_eq!(records[1].fields["b"], FieldValue::Missing);
        assert_eq!(records[1].fields["c"], FieldValue::Integer(4));
    }

    #[test]
    fn test_incompatible_schema_fails() {
        let left = Batch::new(
            Provenance::Archive,
            Definitiveness::Definitive,
            RecordSchema::new(vec![FieldDecl::value("ap", FieldKind::Float)]),
            vec![],
        );
        let right = Batch::new(
            Provenance::CurrentPeriod,
            Definitiveness::Provisional,
            RecordSchema::new(vec![FieldDecl::value("ap", FieldKind::Integer)]),
            vec![],
        );

        let err = merge_batches(&[left, right], &default_priority()).unwrap_err();
        assert!(matches!(err, MergeError::IncompatibleSchema { .. }));
    }

    #[test]
    fn test_idempotence() {
        let a = archive_batch(vec![
            record(
                date(2020, 1, 1),
                1.0,
                Definitiveness::Definitive,
                Provenance::Archive,
            ),
            record(
                date(2020, 1, 2),
                2.0,
                Definitiveness::Definitive,
                Provenance::Archive,
            ),
        ]);

        let once = merge_batches(std::slice::from_ref(&a), &default_priority()).unwrap();
        let rebatched = Batch::new(
            Provenance::Archive,
            Definitiveness::Definitive,
            value_schema(),
            once.series.records.clone(),
        );
        let twice = merge_batches(&[rebatched], &default_priority()).unwrap();

        assert_eq!(once.series, twice.series);
    }

    #[test]
    fn test_empty_batch_tolerance() {
        let a = archive_batch(vec![record(
            date(2020, 1, 1),
            1.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);
        let empty = current_batch(vec![]);

        let with_empty = merge_batches(&[a.clone(), empty], &default_priority()).unwrap();
        let alone = merge_batches(&[a], &default_priority()).unwrap();
        assert_eq!(with_empty.series, alone.series);
    }

    #[test]
    fn test_same_authority_conflict_keeps_first() {
        let d = date(2020, 1, 1);
        let first = archive_batch(vec![record(
            d,
            5.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);
        let second = archive_batch(vec![record(
            d,
            6.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);

        let merged = merge_batches(&[first, second], &default_priority()).unwrap();
        assert_eq!(
            merged.series.records[0].fields["value"],
            FieldValue::Float(5.0)
        );
        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(merged.conflicts[0].date, d);
    }

    #[test]
    fn test_same_authority_identical_rows_no_conflict() {
        let d = date(2020, 1, 1);
        let first = archive_batch(vec![record(
            d,
            5.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);
        let second = archive_batch(vec![record(
            d,
            5.0,
            Definitiveness::Definitive,
            Provenance::Archive,
        )]);

        let merged = merge_batches(&[first, second], &default_priority()).unwrap();
        assert_eq!(merged.series.len(), 1);
        assert!(merged.conflicts.is_empty());
    }

    #[test]
    fn test_placeholder_rows_dropped() {
        let schema = value_schema().with_placeholder("value", -1.0);
        let batch = Batch::new(
            Provenance::Archive,
            Definitiveness::Definitive,
            schema,
            vec![
                record(
                    date(2020, 1, 1),
                    -1.0,
                    Definitiveness::Definitive,
                    Provenance::Archive,
                ),
                record(
                    date(2020, 1, 2),
                    7.0,
                    Definitiveness::Definitive,
                    Provenance::Archive,
                ),
            ],
        );

        let merged = merge_batches(&[batch], &default_priority()).unwrap();
        assert_eq!(merged.series.len(), 1);
        assert_eq!(merged.series.records[0].date, date(2020, 1, 2));
    }

    #[test]
    fn test_definitiveness_overrides_row_claim() {
        // A current-period row claiming to be definitive is still provisional
        // in the merged output.
        let batch = current_batch(vec![record(
            date(2020, 1, 1),
            3.0,
            Definitiveness::Definitive,
            Provenance::CurrentPeriod,
        )]);

        let merged = merge_batches(&[batch], &default_priority()).unwrap();
        assert_eq!(
            merged.series.records[0].definitive,
            Definitiveness::Provisional
        );
    }
}
