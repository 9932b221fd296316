use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::DatabaseInfo;

/// Identifies one measure inside one database
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureRef {
    pub table_name: String,
    #[serde(rename = "name")]
    pub measure_name: String,
}

impl MeasureRef {
    pub fn new(table_name: impl Into<String>, measure_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            measure_name: measure_name.into(),
        }
    }
}

impl fmt::Display for MeasureRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.table_name, self.measure_name)
    }
}

/// An edited measure expression produced by the formatting collaborator.
///
/// `etag` is the fingerprint of the snapshot the edit was rendered against.
/// `errors` carries formatter diagnostics; an entry with any error is never
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedMeasureChange {
    #[serde(flatten)]
    pub measure: MeasureRef,
    pub expression: String,
    pub etag: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl FormattedMeasureChange {
    pub fn new(
        measure: MeasureRef,
        expression: impl Into<String>,
        etag: impl Into<String>,
    ) -> Self {
        Self {
            measure,
            expression: expression.into(),
            etag: etag.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    #[serde(flatten)]
    pub measure: MeasureRef,
    pub expression: String,
}

/// All measures of a database together with the ETag they were read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMeasures {
    pub database: DatabaseInfo,
    pub measures: Vec<MeasureDefinition>,
}
