//! Normalizes JUnit-style XML test reports.
//!
//! Reports are parsed into a forest of untyped [`xml::Node`]s, which
//! [`junit::classify`] turns into a flat list of [`junit::Suite`]s with
//! derived [`junit::Totals`].

pub mod error;
pub mod ingest;
pub mod junit;
pub mod xml;

pub use error::IngestError;
pub use ingest::{ingest, ingest_dir, ingest_file, ingest_files, ingest_paths};
