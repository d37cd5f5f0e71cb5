//! Spike-in control annotation
//!
//! Spike-in genes (ERCC controls in Smart-seq2 data) are recognised purely by
//! name: any gene identifier containing the marker substring is flagged. The
//! match is case-sensitive and unanchored.

use crate::core::error::{LoaderError, Result};
use crate::core::sparse::SparseOps;
use crate::pipeline::load::anndata_ops::AnnDataContainer;
use log::{debug, info};
use polars::prelude::*;

/// Name marker used by the ERCC spike-in controls.
pub const DEFAULT_SPIKE_IN_MARKER: &str = "ERCC";

/// Flag every gene whose identifier contains `marker`.
pub fn detect_spike_ins<S: AsRef<str>>(gene_names: &[S], marker: &str) -> Vec<bool> {
    gene_names
        .iter()
        .map(|name| name.as_ref().contains(marker))
        .collect()
}

/// Attach the spike-in flags as var column `marker` and return how many genes
/// were flagged. An existing column of the same name is replaced.
pub fn annotate_spike_ins(adata: &mut AnnDataContainer, marker: &str) -> Result<usize> {
    if marker.is_empty() {
        return Err(LoaderError::InvalidInput(
            "spike-in marker must not be empty".to_string(),
        ));
    }

    let mask = detect_spike_ins(&adata.var_names, marker);
    let spike_count = mask.iter().filter(|&&flag| flag).count();
    debug!(
        "Spike-in scan over {} genes with marker '{}' found {}",
        mask.len(),
        marker,
        spike_count
    );

    log_spike_in_share(adata, &mask);

    let column = Series::new(marker.into(), mask).into_column();
    if adata.var.width() == 0 {
        adata.var = DataFrame::new(vec![column])?;
    } else {
        adata.var.with_column(column)?;
    }

    Ok(spike_count)
}

fn log_spike_in_share(adata: &AnnDataContainer, mask: &[bool]) {
    let col_sums = SparseOps::compute_col_sums(&adata.x);
    let total: f64 = col_sums.iter().sum();
    if total <= 0.0 {
        return;
    }
    let spike_total: f64 = col_sums
        .iter()
        .zip(mask)
        .filter(|(_, flag)| **flag)
        .map(|(sum, _)| sum)
        .sum();
    info!(
        "Spike-ins account for {:.2}% of {} total counts",
        100.0 * spike_total / total,
        total
    );
}
