//! Per-cell metadata loading and alignment
//!
//! Metadata shares the count matrix layout: first column = cell identifier,
//! header row = attribute names. Column types are inferred from the text so
//! that numeric attributes land in the obs table as numbers.

use crate::core::error::{LoaderError, Result};
use crate::core::io::get_reader;
use crate::pipeline::load::counts::ensure_unique;
use log::{debug, info, warn};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::io::Read;
use std::path::Path;

/// Cell metadata: identifiers plus one DataFrame column per attribute.
#[derive(Debug, Clone)]
pub struct CellMetadata {
    pub cell_names: Vec<String>,
    pub frame: DataFrame,
}

impl CellMetadata {
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_names.len()
    }

    /// Values of one attribute rendered as text, in row order.
    ///
    /// Missing values (null, NaN in a float column, blank text) are `None`.
    pub fn column_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .frame
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?
            .as_materialized_series();

        if let Ok(floats) = series.f64() {
            return Ok(floats
                .into_iter()
                .map(|value| value.filter(|x| !x.is_nan()).map(|x| x.to_string()))
                .collect());
        }

        let as_text = series.cast(&DataType::String)?;
        Ok(as_text
            .str()?
            .into_iter()
            .map(|value| value.filter(|text| !text.is_empty()).map(str::to_string))
            .collect())
    }

    /// Reorder the metadata rows to follow `cell_names`.
    ///
    /// Every requested cell must be present; rows for cells that are not
    /// requested are dropped.
    pub fn align_to(&self, cell_names: &[String]) -> Result<DataFrame> {
        let positions: FxHashMap<&str, usize> = self
            .cell_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let mut indices = Vec::with_capacity(cell_names.len());
        let mut missing = Vec::new();
        for name in cell_names {
            match positions.get(name.as_str()) {
                Some(&idx) => indices.push(idx as IdxSize),
                None => missing.push(name),
            }
        }

        if let Some(first) = missing.first() {
            return Err(LoaderError::MetadataMismatch {
                missing: missing.len(),
                example: first.to_string(),
            });
        }

        let dropped = self.n_cells() - indices.len();
        if dropped > 0 {
            warn!(
                "Dropping {} metadata row(s) for cells absent from the count matrix",
                dropped
            );
        }

        if self.frame.width() == 0 {
            return Ok(DataFrame::empty());
        }

        let idx = IdxCa::from_vec("idx".into(), indices);
        self.frame
            .take(&idx)
            .map_err(|e| LoaderError::DataProcessing(format!("Failed to align metadata: {}", e)))
    }
}

/// Load the metadata table from disk (gzip-compressed input is accepted).
pub fn load_metadata<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<CellMetadata> {
    let path = path.as_ref();
    info!("Loading metadata from: {}", path.display());
    let reader = get_reader(path, delimiter, true)?;
    let metadata = read_metadata(reader, &path.display().to_string())?;
    info!(
        "Loaded metadata: {} cells × {} attributes",
        metadata.n_cells(),
        metadata.frame.width()
    );
    Ok(metadata)
}

/// Parse metadata from an already configured CSV reader.
pub fn read_metadata<R: Read>(
    mut reader: csv::Reader<R>,
    source_name: &str,
) -> Result<CellMetadata> {
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoaderError::EmptyData(format!(
            "{} has no header row",
            source_name
        )));
    }

    let attribute_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    ensure_unique("metadata column", &attribute_names)?;

    let mut cell_names = Vec::new();
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); attribute_names.len()];
    for record in reader.records() {
        let record = record?;
        cell_names.push(record.get(0).unwrap_or_default().to_string());
        for (column, field) in raw_columns.iter_mut().zip(record.iter().skip(1)) {
            column.push(field.to_string());
        }
    }
    ensure_unique("cell", &cell_names)?;

    let columns: Vec<Column> = attribute_names
        .iter()
        .zip(raw_columns)
        .map(|(name, values)| infer_column(name, values))
        .collect();

    for column in &columns {
        debug!("Metadata column '{}' typed as {}", column.name(), column.dtype());
    }

    let frame = DataFrame::new(columns)?;
    Ok(CellMetadata { cell_names, frame })
}

/// Type a raw text column: Int64, then Float64 (empty -> NaN), else String.
fn infer_column(name: &str, values: Vec<String>) -> Column {
    if let Some(ints) = values
        .iter()
        .map(|v| v.trim().parse::<i64>().ok())
        .collect::<Option<Vec<i64>>>()
    {
        return Series::new(name.into(), ints).into_column();
    }

    if let Some(floats) = values
        .iter()
        .map(|v| match v.trim() {
            "" => Some(f64::NAN),
            text => text.parse::<f64>().ok(),
        })
        .collect::<Option<Vec<f64>>>()
    {
        if !values.is_empty() && floats.iter().any(|x| !x.is_nan()) {
            return Series::new(name.into(), floats).into_column();
        }
    }

    Series::new(name.into(), values).into_column()
}
