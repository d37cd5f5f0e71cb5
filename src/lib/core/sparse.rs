//! Sparse count-matrix helpers built on nalgebra_sparse

use crate::core::error::{LoaderError, Result};
use itertools::Itertools;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

pub struct SparseOps;

impl SparseOps {
    /// Create a CSR matrix from `(row, col, value)` triplets via COO.
    ///
    /// Duplicate coordinates are summed by the COO to CSR conversion.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: Vec<(usize, usize, f64)>,
    ) -> Result<CsrMatrix<f64>> {
        if nrows == 0 || ncols == 0 || triplets.is_empty() {
            return Ok(CsrMatrix::zeros(nrows, ncols));
        }

        for &(row, col, _) in &triplets {
            if row >= nrows || col >= ncols {
                return Err(LoaderError::InvalidInput(format!(
                    "Index ({}, {}) exceeds matrix dimensions ({}, {})",
                    row, col, nrows, ncols
                )));
            }
        }

        let (row_indices, col_indices, values): (Vec<_>, Vec<_>, Vec<_>) =
            triplets.into_iter().multiunzip();

        let coo = CooMatrix::try_from_triplets(nrows, ncols, row_indices, col_indices, values)
            .map_err(|e| LoaderError::SparseMatrix(format!("COO creation failed: {:?}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Per-row totals (total counts per cell).
    pub fn compute_row_sums(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        matrix
            .row_iter()
            .map(|row| row.values().iter().sum())
            .collect()
    }

    /// Per-column totals (total counts per gene).
    pub fn compute_col_sums(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        let mut sums = vec![0.0; matrix.ncols()];
        for (_, col, &val) in matrix.triplet_iter() {
            sums[col] += val;
        }
        sums
    }

    /// Get matrix density statistics: (density, nnz, total elements)
    pub fn get_density_stats(matrix: &CsrMatrix<f64>) -> (f64, usize, usize) {
        let total_elements = matrix.nrows() * matrix.ncols();
        let nnz = matrix.nnz();
        let density = if total_elements > 0 {
            nnz as f64 / total_elements as f64
        } else {
            0.0
        };
        (density, nnz, total_elements)
    }

    /// Convert an f32 CSR matrix to f64 while keeping its sparsity pattern.
    pub fn f32_to_f64(matrix: &CsrMatrix<f32>) -> Result<CsrMatrix<f64>> {
        let (row_offsets, col_indices, values) = matrix.csr_data();
        CsrMatrix::try_from_csr_data(
            matrix.nrows(),
            matrix.ncols(),
            row_offsets.to_vec(),
            col_indices.to_vec(),
            values.iter().map(|&x| x as f64).collect(),
        )
        .map_err(|e| LoaderError::SparseMatrix(format!("Failed to convert f32 to f64: {:?}", e)))
    }

    /// Convert a u32 CSR matrix to f64 while keeping its sparsity pattern.
    pub fn u32_to_f64(matrix: &CsrMatrix<u32>) -> Result<CsrMatrix<f64>> {
        let (row_offsets, col_indices, values) = matrix.csr_data();
        CsrMatrix::try_from_csr_data(
            matrix.nrows(),
            matrix.ncols(),
            row_offsets.to_vec(),
            col_indices.to_vec(),
            values.iter().map(|&x| x as f64).collect(),
        )
        .map_err(|e| LoaderError::SparseMatrix(format!("Failed to convert u32 to f64: {:?}", e)))
    }

    /// Approximate in-memory footprint of a CSR matrix in bytes.
    pub fn estimate_size(matrix: &CsrMatrix<f64>) -> usize {
        let (row_offsets, col_indices, values) = matrix.csr_data();
        std::mem::size_of_val(row_offsets)
            + std::mem::size_of_val(col_indices)
            + std::mem::size_of_val(values)
    }
}

/// Densify a single row for assertions.
#[cfg(test)]
pub(crate) fn dense_row(matrix: &CsrMatrix<f64>, row_idx: usize) -> Vec<f64> {
    let mut dense = vec![0.0; matrix.ncols()];
    let row = matrix.row(row_idx);
    for (&col, &val) in row.col_indices().iter().zip(row.values()) {
        dense[col] = val;
    }
    dense
}
