//! Untyped records as returned by the marketplace API.
//!
//! The Orders API hands back loosely-typed JSON objects. Rather than modelling
//! every optional sub-object, the harvester keeps them as raw maps and pulls
//! out only the fields it needs, reporting the exact field on failure.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// A single order or order-item object, before normalization.
pub type RawRecord = Map<String, Value>;

/// Format of `PurchaseDate` on raw order records.
pub const PURCHASE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A raw record could not be mapped onto the order model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{record} record is missing required field '{field}'")]
    MissingField { record: &'static str, field: String },

    #[error("{record} record has invalid value for '{field}': {value}")]
    InvalidField {
        record: &'static str,
        field: String,
        value: String,
    },
}

/// Field accessor over a [`RawRecord`].
///
/// Paths are dotted (`OrderTotal.Amount`). A JSON `null` counts as absent.
pub(crate) struct Fields<'a> {
    record: &'static str,
    raw: &'a RawRecord,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(record: &'static str, raw: &'a RawRecord) -> Self {
        Self { record, raw }
    }

    /// Whether the path resolves to a non-null value.
    pub(crate) fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub(crate) fn string(&self, path: &str) -> Result<String, MappingError> {
        match self.require(path)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.invalid(path, other)),
        }
    }

    /// Integers arrive either as JSON numbers or as numeric strings
    /// (`ProductInfo.NumberOfItems` is a string in the Orders API).
    pub(crate) fn integer(&self, path: &str) -> Result<i64, MappingError> {
        let value = self.require(path)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(path, value))
    }

    pub(crate) fn decimal(&self, path: &str) -> Result<Decimal, MappingError> {
        let value = self.require(path)?;
        let parsed = match value {
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(path, value))
    }

    pub(crate) fn timestamp(&self, path: &str, format: &str) -> Result<NaiveDateTime, MappingError> {
        let value = self.require(path)?;
        match value {
            Value::String(s) => NaiveDateTime::parse_from_str(s, format)
                .map_err(|_| self.invalid(path, value)),
            other => Err(self.invalid(path, other)),
        }
    }

    fn lookup(&self, path: &str) -> Option<&'a Value> {
        let mut parts = path.split('.');
        let mut current = self.raw.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    fn require(&self, path: &str) -> Result<&'a Value, MappingError> {
        self.lookup(path).ok_or_else(|| MappingError::MissingField {
            record: self.record,
            field: path.to_string(),
        })
    }

    fn invalid(&self, path: &str, value: &Value) -> MappingError {
        MappingError::InvalidField {
            record: self.record,
            field: path.to_string(),
            value: value.to_string(),
        }
    }
}
