//! AnnData container assembly and H5AD I/O

use crate::core::error::{LoaderError, Result};
use crate::core::fs::make_parent_dirs;
use crate::core::sparse::SparseOps;
use crate::pipeline::load::counts::CountMatrix;
use crate::pipeline::load::metadata::CellMetadata;
use crate::pipeline::load::validation::validate_output_path;
use anndata::data::array::dataframe::DataFrameIndex;
use anndata::{data::*, traits::AnnDataOp, AnnData, Backend};
use anndata_hdf5::H5;
use log::{debug, info};
use nalgebra_sparse::CsrMatrix;
use polars::prelude::*;
use std::convert::TryFrom;
use std::path::Path;

/// In-memory annotated matrix: X plus per-cell (obs) and per-gene (var) tables.
#[derive(Debug, Clone)]
pub struct AnnDataContainer {
    pub obs: DataFrame,
    pub var: DataFrame,
    pub x: CsrMatrix<f64>,
    pub n_obs: usize,
    pub n_vars: usize,
    pub obs_names: Vec<String>,
    pub var_names: Vec<String>,
}

impl AnnDataContainer {
    /// Pair a count matrix with its metadata.
    ///
    /// Metadata rows are aligned to the count-matrix cell order. A cell that
    /// has no metadata row fails the assembly; metadata rows for cells that are
    /// not in the count matrix are dropped.
    pub fn assemble(counts: CountMatrix, metadata: &CellMetadata) -> Result<Self> {
        let obs = metadata.align_to(&counts.cell_names)?;

        let CountMatrix {
            cell_names,
            gene_names,
            matrix,
        } = counts;

        let container = Self {
            obs,
            var: DataFrame::empty(),
            n_obs: cell_names.len(),
            n_vars: gene_names.len(),
            x: matrix,
            obs_names: cell_names,
            var_names: gene_names,
        };
        container.validate_dimensions()?;

        info!(
            "Assembled AnnData: {} obs × {} vars, {} obs columns",
            container.n_obs,
            container.n_vars,
            container.obs.width()
        );
        Ok(container)
    }

    /// Check that names, X and the annotation tables agree on shape.
    ///
    /// An obs/var table without columns is accepted as "no annotations".
    pub fn validate_dimensions(&self) -> Result<()> {
        if self.obs_names.len() != self.n_obs {
            return Err(LoaderError::DimensionMismatch {
                expected: format!("obs_names length = {}", self.n_obs),
                actual: format!("obs_names length = {}", self.obs_names.len()),
            });
        }

        if self.var_names.len() != self.n_vars {
            return Err(LoaderError::DimensionMismatch {
                expected: format!("var_names length = {}", self.n_vars),
                actual: format!("var_names length = {}", self.var_names.len()),
            });
        }

        if self.x.nrows() != self.n_obs || self.x.ncols() != self.n_vars {
            return Err(LoaderError::DimensionMismatch {
                expected: format!("X matrix {}×{}", self.n_obs, self.n_vars),
                actual: format!("X matrix {}×{}", self.x.nrows(), self.x.ncols()),
            });
        }

        if self.obs.width() > 0 && self.obs.height() != self.n_obs {
            return Err(LoaderError::DimensionMismatch {
                expected: format!("obs height = {}", self.n_obs),
                actual: format!("obs height = {}", self.obs.height()),
            });
        }

        if self.var.width() > 0 && self.var.height() != self.n_vars {
            return Err(LoaderError::DimensionMismatch {
                expected: format!("var height = {}", self.n_vars),
                actual: format!("var height = {}", self.var.height()),
            });
        }

        Ok(())
    }

    /// Boolean var column, if present and boolean.
    pub fn spike_in_mask(&self, column: &str) -> Option<Vec<bool>> {
        let series = self.var.column(column).ok()?.as_materialized_series();
        let flags = series.bool().ok()?;
        Some(flags.into_iter().map(|v| v.unwrap_or(false)).collect())
    }
}

/// Write the container to an `.h5ad` file, replacing any existing file.
pub fn write_anndata_h5ad<P: AsRef<Path>>(adata: &AnnDataContainer, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Writing AnnData to: {}", path.display());

    adata.validate_dimensions()?;
    make_parent_dirs(path)?;
    validate_output_path(path)?;

    info!(
        "Memory usage: obs={} KB, var={} KB, X={} KB",
        estimate_dataframe_size(&adata.obs) / 1024,
        estimate_dataframe_size(&adata.var) / 1024,
        SparseOps::estimate_size(&adata.x) / 1024
    );

    let h5_adata = AnnData::<H5>::new(path)?;

    let obs_index: DataFrameIndex = adata.obs_names.iter().cloned().collect();
    let var_index: DataFrameIndex = adata.var_names.iter().cloned().collect();
    h5_adata.set_obs_names(obs_index)?;
    h5_adata.set_var_names(var_index)?;

    // A zero-sized X is left unset; the shape is carried by the names.
    if adata.n_obs > 0 && adata.n_vars > 0 {
        h5_adata.set_x(adata.x.clone())?;
        info!(
            "  - Written X matrix: {}×{} with {} non-zeros",
            adata.x.nrows(),
            adata.x.ncols(),
            adata.x.nnz()
        );
    } else {
        debug!("Skipping X for empty shape {}×{}", adata.n_obs, adata.n_vars);
    }

    if adata.obs.width() > 0 {
        h5_adata.set_obs(adata.obs.clone())?;
        info!(
            "  - Written obs annotations: {} rows, {} columns",
            adata.obs.height(),
            adata.obs.width()
        );
    }

    if adata.var.width() > 0 {
        h5_adata.set_var(adata.var.clone())?;
        info!(
            "  - Written var annotations: {} rows, {} columns",
            adata.var.height(),
            adata.var.width()
        );
    }

    h5_adata.close()?;

    info!(
        "Successfully wrote AnnData with shape: {} × {}",
        adata.n_obs, adata.n_vars
    );
    Ok(())
}

/// Read an `.h5ad` file back into a container.
///
/// Zero-sized shapes are accepted and come back with an all-zero X. An obs or
/// var table that cannot be read, or whose height disagrees with the names,
/// fails the read.
pub fn read_anndata_h5ad<P: AsRef<Path>>(path: P) -> Result<AnnDataContainer> {
    let path = path.as_ref();
    info!("Reading H5AD file: {}", path.display());

    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }

    let adata = AnnData::<H5>::open(H5::open(path).map_err(|e| {
        LoaderError::DataProcessing(format!("Failed to open H5 file: {:?}", e))
    })?)?;

    let n_obs = adata.n_obs();
    let n_vars = adata.n_vars();
    info!("AnnData shape: {} obs × {} vars", n_obs, n_vars);

    let obs_names = adata.obs_names().into_vec();
    let var_names = adata.var_names().into_vec();
    let obs = read_annotation_frame("obs", adata.read_obs(), n_obs)?;
    let var = read_annotation_frame("var", adata.read_var(), n_vars)?;
    let x = read_x_matrix(&adata)?.unwrap_or_else(|| CsrMatrix::zeros(n_obs, n_vars));

    adata.close()?;

    let container = AnnDataContainer {
        obs,
        var,
        x,
        n_obs,
        n_vars,
        obs_names,
        var_names,
    };
    container.validate_dimensions()?;
    Ok(container)
}

fn read_annotation_frame(
    axis: &str,
    frame: anyhow::Result<DataFrame>,
    expected_height: usize,
) -> Result<DataFrame> {
    let df = frame.map_err(|e| {
        LoaderError::DataProcessing(format!("Failed to read {} DataFrame: {}", axis, e))
    })?;

    if df.width() > 0 && df.height() != expected_height {
        return Err(LoaderError::DimensionMismatch {
            expected: format!("{} height = {}", axis, expected_height),
            actual: format!("{} height = {}", axis, df.height()),
        });
    }

    debug!(
        "Read {} DataFrame: {} rows, {} columns",
        axis,
        df.height(),
        df.width()
    );
    Ok(df)
}

fn read_x_matrix(adata: &AnnData<H5>) -> Result<Option<CsrMatrix<f64>>> {
    let mut x_elem = match adata.x().extract() {
        Some(elem) => elem,
        None => {
            debug!("No X matrix found");
            return Ok(None);
        }
    };

    let shape = x_elem.shape();
    if shape.ndim() == 0 || shape.as_ref().contains(&0) {
        debug!("Empty X matrix shape: {:?}", shape.as_ref());
        return Ok(None);
    }

    let matrix = convert_array_to_csr_f64(x_elem.data()?)?;
    info!(
        "Read X matrix: {}×{} with {} non-zeros",
        matrix.nrows(),
        matrix.ncols(),
        matrix.nnz()
    );
    Ok(Some(matrix))
}

fn convert_array_to_csr_f64(array_data: ArrayData) -> Result<CsrMatrix<f64>> {
    if let Ok(matrix) = CsrMatrix::<f64>::try_from(array_data.clone()) {
        return Ok(matrix);
    }

    if let Ok(matrix_f32) = CsrMatrix::<f32>::try_from(array_data.clone()) {
        return SparseOps::f32_to_f64(&matrix_f32);
    }

    if let Ok(matrix_u32) = CsrMatrix::<u32>::try_from(array_data.clone()) {
        return SparseOps::u32_to_f64(&matrix_u32);
    }

    Err(LoaderError::DataProcessing(format!(
        "Unsupported array data type for X matrix: {:?}",
        array_data.data_type()
    )))
}

fn estimate_dataframe_size(df: &DataFrame) -> usize {
    df.get_columns()
        .iter()
        .map(|column| column.as_materialized_series().estimated_size())
        .sum()
}
