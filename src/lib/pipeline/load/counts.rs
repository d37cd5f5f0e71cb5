//! Count matrix loading
//!
//! The count file is a delimited table with one row per cell and one column per
//! gene. The first column carries the cell identifiers and the header row
//! carries the gene identifiers (its first field names the index and is
//! ignored). Zero counts are not stored.

use crate::core::error::{LoaderError, Result};
use crate::core::io::get_reader;
use crate::core::sparse::SparseOps;
use itertools::Itertools;
use log::{debug, info};
use nalgebra_sparse::CsrMatrix;
use rustc_hash::FxHashSet;
use std::io::Read;
use std::path::Path;

/// Cells × genes count matrix with its axis identifiers.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    pub cell_names: Vec<String>,
    pub gene_names: Vec<String>,
    pub matrix: CsrMatrix<f64>,
}

impl CountMatrix {
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_names.len()
    }

    #[inline]
    pub fn n_genes(&self) -> usize {
        self.gene_names.len()
    }
}

/// Load a count matrix from disk (gzip-compressed input is accepted).
pub fn load_count_matrix<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<CountMatrix> {
    let path = path.as_ref();
    info!("Loading count matrix from: {}", path.display());
    let reader = get_reader(path, delimiter, true)?;
    let counts = read_count_matrix(reader, &path.display().to_string())?;

    let (density, nnz, _) = SparseOps::get_density_stats(&counts.matrix);
    info!(
        "Loaded count matrix: {} cells × {} genes, {} non-zeros ({:.2}% dense)",
        counts.n_cells(),
        counts.n_genes(),
        nnz,
        density * 100.0
    );

    let totals = SparseOps::compute_row_sums(&counts.matrix);
    if let Some((min, max)) = totals.iter().copied().minmax().into_option() {
        debug!("Counts per cell range from {} to {}", min, max);
    }
    Ok(counts)
}

/// Parse a count matrix from an already configured CSV reader.
///
/// `source_name` is only used in error messages.
pub fn read_count_matrix<R: Read>(
    mut reader: csv::Reader<R>,
    source_name: &str,
) -> Result<CountMatrix> {
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoaderError::EmptyData(format!(
            "{} has no header row",
            source_name
        )));
    }

    let gene_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    ensure_unique("gene", &gene_names)?;
    let n_genes = gene_names.len();

    let mut cell_names = Vec::new();
    let mut seen_cells = FxHashSet::default();
    let mut triplets = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let cell = record.get(0).unwrap_or_default().to_string();
        if !seen_cells.insert(cell.clone()) {
            return Err(LoaderError::DuplicateIdentifier {
                axis: "cell".to_string(),
                name: cell,
            });
        }

        let row_idx = cell_names.len();
        for (col_idx, field) in record.iter().skip(1).enumerate() {
            let value = parse_count(field).ok_or_else(|| LoaderError::Parse {
                source_name: source_name.to_string(),
                line,
                message: format!(
                    "invalid count '{}' for cell '{}', gene '{}'",
                    field, cell, gene_names[col_idx]
                ),
            })?;
            if value != 0.0 {
                triplets.push((row_idx, col_idx, value));
            }
        }

        cell_names.push(cell);
    }

    debug!(
        "Parsed {} rows with {} non-zero entries from {}",
        cell_names.len(),
        triplets.len(),
        source_name
    );

    let matrix = SparseOps::from_triplets(cell_names.len(), n_genes, triplets)?;

    Ok(CountMatrix {
        cell_names,
        gene_names,
        matrix,
    })
}

fn parse_count(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

/// Reject duplicate identifiers along one axis.
pub(crate) fn ensure_unique(axis: &str, names: &[String]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(LoaderError::DuplicateIdentifier {
                axis: axis.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}
