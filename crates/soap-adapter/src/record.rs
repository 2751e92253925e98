//! # Record Results
//!
//! A remote operation may touch several records at once and report success or
//! failure for each of them individually. [`RecordResult`] is the parsed form of
//! that multi-record outcome. It is plain data: deciding what a failure *means*
//! is the job of the [`fault`](crate::fault) module.

use serde::{Deserialize, Serialize};

/// A single `(status code, message)` pair reported for a failed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    #[serde(rename = "statusCode")]
    pub status_code: String,
    pub message: String,
}

impl RecordError {
    pub fn new(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            message: message.into(),
        }
    }
}

/// Outcome for one record touched by a remote call.
///
/// A successful record never carries errors and a failed record always carries
/// at least one. The constructors are the only way to build an outcome, so the
/// rule holds for every value in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    success: bool,
    errors: Vec<RecordError>,
}

impl RecordOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: RecordError) -> Self {
        Self {
            success: false,
            errors: vec![error],
        }
    }

    /// Adds another error to a failed record. Has no effect on a successful one.
    pub fn with_error(mut self, error: RecordError) -> Self {
        if !self.success {
            self.errors.push(error);
        }
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }
}

#[derive(Deserialize)]
struct RawOutcome {
    success: bool,
    #[serde(default)]
    errors: Vec<RecordError>,
}

impl<'de> Deserialize<'de> for RecordOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawOutcome::deserialize(deserializer)?;
        match (raw.success, raw.errors.is_empty()) {
            (true, true) => Ok(Self::succeeded()),
            (true, false) => Err(serde::de::Error::custom(
                "successful record must not carry errors",
            )),
            (false, true) => Err(serde::de::Error::custom(
                "failed record must carry at least one error",
            )),
            (false, false) => Ok(Self {
                success: false,
                errors: raw.errors,
            }),
        }
    }
}

/// Ordered per-record outcomes of a single remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordResult {
    records: Vec<RecordOutcome>,
}

impl RecordResult {
    pub fn new(records: Vec<RecordOutcome>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RecordOutcome] {
        &self.records
    }

    pub fn failed_records(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.records.iter().filter(|r| !r.success)
    }

    pub fn successful_records(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.records.iter().filter(|r| r.success)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RecordOutcome> for RecordResult {
    fn from_iter<I: IntoIterator<Item = RecordOutcome>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
