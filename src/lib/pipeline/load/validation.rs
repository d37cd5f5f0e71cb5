//! Input validation utilities
//!
//! Checks performed before any data is loaded: configuration values, input
//! file presence and the output path.

use crate::core::error::{LoaderError, Result};
use crate::core::fs::has_extension;
use std::path::Path;

/// Configuration values that must be sane before the pipeline starts.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Substring identifying spike-in genes.
    pub spike_in_marker: String,
    /// Metadata columns summarised as frequency tables.
    pub summary_columns: Vec<String>,
    /// Field delimiter of both input tables.
    pub delimiter: u8,
}

impl ValidationConfig {
    /// Validate all configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the spike-in marker is empty
    /// - a summary column name is empty or repeated
    /// - the delimiter is a quote, a newline or a non-ASCII byte
    pub fn validate(&self) -> Result<()> {
        if self.spike_in_marker.is_empty() {
            return Err(LoaderError::InvalidInput(
                "spike-in marker must not be empty".to_string(),
            ));
        }

        for (i, column) in self.summary_columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(LoaderError::InvalidInput(
                    "summary column names must not be empty".to_string(),
                ));
            }
            if self.summary_columns[..i].contains(column) {
                return Err(LoaderError::InvalidInput(format!(
                    "summary column '{}' given more than once",
                    column
                )));
            }
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(LoaderError::InvalidInput(format!(
                "unsupported delimiter byte: {:#04x}",
                self.delimiter
            )));
        }

        Ok(())
    }
}

/// Validate that both input tables exist.
///
/// `-` is accepted for the count matrix and means stdin.
pub fn validate_input_files(counts: &Path, metadata: &Path) -> Result<()> {
    if counts.as_os_str() != "-" && !counts.is_file() {
        return Err(LoaderError::FileNotFound(format!(
            "Count matrix not found: {}",
            counts.display()
        )));
    }

    if !metadata.is_file() {
        return Err(LoaderError::FileNotFound(format!(
            "Metadata file not found: {}",
            metadata.display()
        )));
    }

    Ok(())
}

/// Validate the output path and clear any previous output.
///
/// The path must end in `.h5ad`. An existing file at the path is removed.
pub fn validate_output_path(output: &Path) -> Result<()> {
    if !has_extension(output, "h5ad") {
        return Err(LoaderError::InvalidInput(format!(
            "Output file must have .h5ad extension: {}",
            output.display()
        )));
    }

    if output.is_dir() {
        return Err(LoaderError::InvalidInput(format!(
            "Output path is a directory: {}",
            output.display()
        )));
    }

    if output.exists() {
        std::fs::remove_file(output).map_err(|e| {
            LoaderError::InvalidInput(format!(
                "Failed to remove existing output file '{}': {}",
                output.display(),
                e
            ))
        })?;
    }

    Ok(())
}
