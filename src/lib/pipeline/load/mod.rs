//! Count matrix + metadata to AnnData loading pipeline
//!
//! # Key Components
//!
//! - [`counts`]: Reading the cells × genes count matrix
//! - [`metadata`]: Reading and aligning per-cell metadata
//! - [`summary`]: Shape and frequency-table summaries
//! - [`anndata_ops`]: The annotated-matrix container and H5AD I/O
//! - [`spike_in`]: Spike-in control annotation
//! - [`validation`]: Input validation functions

pub mod anndata_ops;
pub mod counts;
pub mod metadata;
pub mod spike_in;
pub mod summary;
pub mod validation;

pub use anndata_ops::{read_anndata_h5ad, write_anndata_h5ad, AnnDataContainer};
pub use counts::{load_count_matrix, read_count_matrix, CountMatrix};
pub use metadata::{load_metadata, read_metadata, CellMetadata};
pub use spike_in::{annotate_spike_ins, detect_spike_ins, DEFAULT_SPIKE_IN_MARKER};
pub use summary::{summarize, write_frequency_tables, DatasetSummary, FrequencyTable};
pub use validation::{validate_input_files, validate_output_path, ValidationConfig};

pub use crate::core::error::{LoaderError, Result};
