//! Core data types for space-weather index series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Calendar date of an observation (the natural key of a record)
pub type ObsDate = NaiveDate;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Float,
    Integer,
}

/// Role of a column in the output schema
///
/// `Ignored` columns are parsed positionally but excluded from the unified
/// output schema entirely (redundant or placeholder columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Value,
    Quality,
    Ignored,
}

/// Declaration of one named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    pub role: FieldRole,
}

impl FieldDecl {
    pub fn value(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role: FieldRole::Value,
        }
    }

    pub fn quality(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role: FieldRole::Quality,
        }
    }

    pub fn ignored(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Float,
            role: FieldRole::Ignored,
        }
    }
}

/// Sentinel marking an entire row as "no observation"
///
/// A record whose named field equals `value` is a placeholder row and is
/// dropped from the merged output rather than kept as a zero-like value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderRule {
    pub field: String,
    pub value: f64,
}

/// Schema of the records in one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub fields: Vec<FieldDecl>,
    pub placeholder: Option<PlaceholderRule>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldDecl>) -> Self {
        Self {
            fields,
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

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that survive into the unified output (everything not `Ignored`)
    pub fn output_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter().filter(|f| f.role != FieldRole::Ignored)
    }
}

/// A measurement value with explicit absence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Missing,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Missing => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Float(v) => Some(*v as i64),
            FieldValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

/// Whether a value is finalized or still subject to revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Definitiveness {
    Definitive,
    Provisional,
}

/// Which kind of source batch a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Archive,
    CurrentPeriod,
    YearlyFile,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Archive => write!(f, "archive"),
            Provenance::CurrentPeriod => write!(f, "current_period"),
            Provenance::YearlyFile => write!(f, "yearly_file"),
        }
    }
}

/// One dated measurement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub date: ObsDate,

    /// Measurements and quality metadata (field name -> value)
    #[serde(flatten)]
    pub fields: HashMap<String, FieldValue>,

    pub definitive: Definitiveness,
    pub provenance: Provenance,
}

/// An immutable sequence of records sharing one schema and provenance tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub provenance: Provenance,
    pub definitiveness: Definitiveness,
    pub schema: RecordSchema,
    pub records: Vec<Observation>,
}

impl Batch {
    pub fn new(
        provenance: Provenance,
        definitiveness: Definitiveness,
        schema: RecordSchema,
        records: Vec<Observation>,
    ) -> Self {
        Self {
            provenance,
            definitiveness,
            schema,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The reconciled result: unique dates, strictly ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub records: Vec<Observation>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<ObsDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<ObsDate> {
        self.records.last().map(|r| r.date)
    }
}
