//! In-memory dataset catalog
//!
//! The catalog owns every loaded dataset and is the only collaborator that
//! resolves a dataset identifier for the query engine. Ingestion here is
//! deliberately thin: callers hand over a JSON array of already-flat
//! records, which is deserialized into the typed model for the declared
//! kind. Anything that fails to deserialize rejects the whole dataset.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::schema::RecordKind;

use super::errors::{DatasetError, DatasetResult};
use super::record::{Record, Room, Section};

/// A loaded dataset: one kind, many records
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: RecordKind,
    pub records: Vec<Record>,
}

/// Summary row returned by `list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub id: String,
    pub kind: RecordKind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
}

/// In-memory catalog of datasets keyed by id
///
/// BTreeMap keeps `list` output deterministic without a sort pass.
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: BTreeMap<String, Dataset>,
}

/// True if `id` is usable as a dataset identifier: non-blank and free of
/// the qualified-key separator
pub fn is_valid_dataset_id(id: &str) -> bool {
    !id.contains('_') && !id.trim().is_empty()
}

impl DatasetStore {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dataset from a raw JSON record array.
    ///
    /// Returns the full list of loaded ids after insertion.
    pub fn add(&mut self, id: &str, kind: RecordKind, payload: &Value) -> DatasetResult<Vec<String>> {
        if !is_valid_dataset_id(id) {
            return Err(DatasetError::InvalidId(id.to_string()));
        }
        if self.datasets.contains_key(id) {
            return Err(DatasetError::AlreadyExists(id.to_string()));
        }

        let records = Self::parse_records(kind, payload)?;
        self.datasets.insert(
            id.to_string(),
            Dataset {
                kind,
                records,
            },
        );
        Ok(self.datasets.keys().cloned().collect())
    }

    /// Removes a dataset, returning its id
    pub fn remove(&mut self, id: &str) -> DatasetResult<String> {
        if !is_valid_dataset_id(id) {
            return Err(DatasetError::InvalidId(id.to_string()));
        }
        if self.datasets.remove(id).is_none() {
            return Err(DatasetError::NotFound(id.to_string()));
        }
        Ok(id.to_string())
    }

    /// Resolves an id to its dataset
    pub fn get(&self, id: &str) -> DatasetResult<&Dataset> {
        self.datasets
            .get(id)
            .ok_or_else(|| DatasetError::NotFound(id.to_string()))
    }

    /// Lists all loaded datasets
    pub fn list(&self) -> Vec<DatasetSummary> {
        self.datasets
            .iter()
            .map(|(id, ds)| DatasetSummary {
                id: id.clone(),
                kind: ds.kind,
                num_rows: ds.records.len(),
            })
            .collect()
    }

    fn parse_records(kind: RecordKind, payload: &Value) -> DatasetResult<Vec<Record>> {
        let invalid = |reason: String| DatasetError::InvalidRecords {
            kind: kind.as_str().to_string(),
            reason,
        };

        if !payload.is_array() {
            return Err(invalid("payload is not a JSON array".to_string()));
        }

        match kind {
            RecordKind::Sections => {
                let sections: Vec<Section> = serde_json::from_value(payload.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(sections.into_iter().map(Record::Section).collect())
            }
            RecordKind::Rooms => {
                let rooms: Vec<Room> = serde_json::from_value(payload.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(rooms.into_iter().map(Record::Room).collect())
            }
        }
    }
}
