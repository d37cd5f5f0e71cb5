//! Count matrix + metadata loading
//!
//! Reads the cells × genes count matrix and the cell metadata, prints the
//! dataset shape and frequency tables of selected metadata columns, flags
//! spike-in genes and writes the result as an `.h5ad` file.
//!
//! # Pipeline Steps
//!
//! 1. Load the count matrix and the metadata table
//! 2. Print the summary (and optionally write it as TSV)
//! 3. Align metadata to the count rows
//! 4. Mark spike-in genes in `var`
//! 5. Write the AnnData file

mod args;
mod pipeline;

pub use args::LoadArgs;
pub use pipeline::run_load;
