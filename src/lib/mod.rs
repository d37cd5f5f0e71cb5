//! tmload: single-cell CSV to AnnData loader
//!
//! The library turns a cells × genes count matrix plus per-cell metadata (both
//! delimited text) into an annotated matrix and writes it as `.h5ad`.
//!
//! # Modules
//!
//! - [`core`]: Errors, file helpers, CSV readers/writers and sparse matrix helpers
//! - [`pipeline`]: The loading pipeline (counts, metadata, summary, spike-ins, H5AD I/O)
//! - [`utils`]: Flat re-exports of commonly used helpers

pub mod core;
pub mod pipeline;
pub mod utils;
