//! # medrag-patient
//!
//! Flat-file patient record storage for the MedRAG question-answering
//! system.
//!
//! [`PatientStore`] keeps patient records and timestamped measurement
//! history in a single JSON file and formats per-patient summary blocks —
//! the shape the RAG core indexes alongside literature abstracts. Only the
//! most recent measurement set is projected into a summary.
//!
//! ```rust,ignore
//! use medrag_patient::PatientStore;
//!
//! let mut store = PatientStore::open("patient_data/patients.json")?;
//! store.add_patient("P001", "John Doe", 45, "Male")?;
//! store.add_measurements("P001", measurements)?;
//! for summary in store.all_summaries() {
//!     println!("{summary}");
//! }
//! ```

pub mod error;
pub mod store;

pub use error::{PatientError, Result};
pub use store::{Measurement, PatientRecord, PatientStore};
