//! JSON-backed patient record storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PatientError, Result};

/// One timestamped set of health measurements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    /// When the measurements were recorded.
    pub timestamp: DateTime<Utc>,
    /// Measurement name to value, e.g. `"Blood Sugar (Fasting)" -> "180 mg/dL"`.
    pub data: BTreeMap<String, String>,
}

/// A patient record with its measurement history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Unique patient identifier.
    pub patient_id: String,
    /// Patient's full name.
    pub name: String,
    /// Patient's age in years.
    pub age: u32,
    /// Patient's gender.
    pub gender: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Measurement history, oldest first.
    pub measurements: Vec<Measurement>,
}

/// A flat-file store of patient records.
///
/// Records live in a single JSON file; every mutation persists the whole
/// store. The store is owned by one process — there is no locking against
/// concurrent writers.
#[derive(Debug)]
pub struct PatientStore {
    path: PathBuf,
    records: BTreeMap<String, PatientRecord>,
}

impl PatientStore {
    /// Open the store at the given file path, loading existing records.
    ///
    /// A missing file starts an empty store; parent directories are
    /// created as needed on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, records })
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of patients on record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no patients.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Add a new patient.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::DuplicateId`] if the ID is already taken.
    pub fn add_patient(
        &mut self,
        patient_id: impl Into<String>,
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
    ) -> Result<()> {
        let patient_id = patient_id.into();
        if self.records.contains_key(&patient_id) {
            return Err(PatientError::DuplicateId(patient_id));
        }

        let record = PatientRecord {
            patient_id: patient_id.clone(),
            name: name.into(),
            age,
            gender: gender.into(),
            created_at: Utc::now(),
            measurements: Vec::new(),
        };
        self.records.insert(patient_id.clone(), record);
        self.save()?;
        info!(patient_id = %patient_id, "patient added");
        Ok(())
    }

    /// Append a timestamped measurement set to a patient's history.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] for an unknown patient ID.
    pub fn add_measurements(
        &mut self,
        patient_id: &str,
        data: BTreeMap<String, String>,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(patient_id)
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))?;
        record.measurements.push(Measurement { timestamp: Utc::now(), data });
        self.save()?;
        info!(patient_id, "measurements recorded");
        Ok(())
    }

    /// Look up a patient by ID.
    pub fn get(&self, patient_id: &str) -> Option<&PatientRecord> {
        self.records.get(patient_id)
    }

    /// All patient IDs on record, in sorted order.
    pub fn patient_ids(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    /// Format one patient as a summary block for display and indexing.
    ///
    /// Only the most recent measurement set is projected — this is the
    /// sole shape the RAG core expects from patient data.
    pub fn summary(&self, patient_id: &str) -> Option<String> {
        let record = self.get(patient_id)?;

        let mut summary = format!(
            "Patient ID: {}\nName: {}\nAge: {} years\nGender: {}\n",
            record.patient_id, record.name, record.age, record.gender
        );

        if let Some(latest) = record.measurements.last() {
            summary.push_str("\nLatest Measurements:\n");
            summary.push_str(&format!("Date: {}\n", latest.timestamp.to_rfc3339()));
            for (key, value) in &latest.data {
                summary.push_str(&format!("- {key}: {value}\n"));
            }
        }

        Some(summary)
    }

    /// Summaries for every patient, one block each, in ID order.
    pub fn all_summaries(&self) -> Vec<String> {
        self.records.keys().filter_map(|id| self.summary(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurements(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn temp_store() -> (tempfile::TempDir, PatientStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PatientStore::open(dir.path().join("patients.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn add_and_get_patient() {
        let (_dir, mut store) = temp_store();
        store.add_patient("P001", "John Doe", 45, "Male").unwrap();

        let record = store.get("P001").unwrap();
        assert_eq!(record.name, "John Doe");
        assert_eq!(record.age, 45);
        assert!(record.measurements.is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let (_dir, mut store) = temp_store();
        store.add_patient("P001", "John Doe", 45, "Male").unwrap();
        let err = store.add_patient("P001", "Jane Doe", 39, "Female").unwrap_err();
        assert!(matches!(err, PatientError::DuplicateId(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn measurements_require_existing_patient() {
        let (_dir, mut store) = temp_store();
        let err = store
            .add_measurements("P404", measurements(&[("Heart Rate", "72 bpm")]))
            .unwrap_err();
        assert!(matches!(err, PatientError::NotFound(_)));
    }

    #[test]
    fn summary_projects_only_latest_measurements() {
        let (_dir, mut store) = temp_store();
        store.add_patient("P001", "John Doe", 45, "Male").unwrap();
        store
            .add_measurements("P001", measurements(&[("Blood Sugar (Fasting)", "120 mg/dL")]))
            .unwrap();
        store
            .add_measurements("P001", measurements(&[("Blood Sugar (Fasting)", "180 mg/dL")]))
            .unwrap();

        let summary = store.summary("P001").unwrap();
        assert!(summary.contains("Patient ID: P001"));
        assert!(summary.contains("Name: John Doe"));
        assert!(summary.contains("- Blood Sugar (Fasting): 180 mg/dL"));
        assert!(!summary.contains("120 mg/dL"));
    }

    #[test]
    fn summary_without_measurements_omits_section() {
        let (_dir, mut store) = temp_store();
        store.add_patient("P001", "John Doe", 45, "Male").unwrap();
        let summary = store.summary("P001").unwrap();
        assert!(!summary.contains("Latest Measurements"));
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");

        {
            let mut store = PatientStore::open(&path).unwrap();
            store.add_patient("P001", "John Doe", 45, "Male").unwrap();
            store
                .add_measurements("P001", measurements(&[("Blood Pressure", "120/80 mmHg")]))
                .unwrap();
        }

        let reopened = PatientStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let record = reopened.get("P001").unwrap();
        assert_eq!(record.measurements.len(), 1);
        assert_eq!(record.measurements[0].data["Blood Pressure"], "120/80 mmHg");
    }

    #[test]
    fn all_summaries_covers_every_patient() {
        let (_dir, mut store) = temp_store();
        store.add_patient("P001", "John Doe", 45, "Male").unwrap();
        store.add_patient("P002", "Jane Roe", 52, "Female").unwrap();

        let summaries = store.all_summaries();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].contains("P001"));
        assert!(summaries[1].contains("P002"));
    }
}
