//! Print the layout of an existing `.h5ad` file.

use anyhow::Result;
use log::info;
use polars::prelude::DataFrame;
use std::io::{self, Write};
use std::path::PathBuf;
use structopt::StructOpt;

use tmload_lib::core::sparse::SparseOps;
use tmload_lib::pipeline::load::{
    read_anndata_h5ad, AnnDataContainer, LoaderError, DEFAULT_SPIKE_IN_MARKER,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "inspect")]
#[structopt(about = "Show shape, annotations and spike-in count of an AnnData file")]
pub struct InspectArgs {
    #[structopt(long, short = "i", parse(from_os_str), help = "AnnData (.h5ad) file to inspect")]
    pub input: PathBuf,

    #[structopt(
        long,
        default_value = DEFAULT_SPIKE_IN_MARKER,
        help = "Boolean var column holding the spike-in flags"
    )]
    pub spike_in_column: String,
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    info!("Inspecting {}", args.input.display());
    let adata = read_anndata_h5ad(&args.input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    describe(&adata, &args.spike_in_column, &mut out)?;
    Ok(())
}

fn describe<W: Write>(
    adata: &AnnDataContainer,
    spike_in_column: &str,
    out: &mut W,
) -> Result<(), LoaderError> {
    writeln!(out, "AnnData object with n_obs × n_vars = {} × {}", adata.n_obs, adata.n_vars)?;
    writeln!(out, "    obs: {}", join_columns(&adata.obs))?;
    writeln!(out, "    var: {}", join_columns(&adata.var))?;

    let (density, nnz, _) = SparseOps::get_density_stats(&adata.x);
    writeln!(out, "    X: {} non-zeros, density {:.4}", nnz, density)?;

    match adata.spike_in_mask(spike_in_column) {
        Some(mask) => {
            let found = mask.iter().filter(|flag| **flag).count();
            writeln!(out, "Found {} many Spike-Ins in the data", found)?;
        }
        None => writeln!(out, "No boolean var column named '{}'", spike_in_column)?,
    }
    out.flush()?;
    Ok(())
}

fn join_columns(frame: &DataFrame) -> String {
    let names: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|name| format!("'{}'", name))
        .collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CsrMatrix;
    use tempfile::tempdir;
    use tmload_lib::pipeline::load::{annotate_spike_ins, write_anndata_h5ad};

    fn container() -> AnnDataContainer {
        let x: CsrMatrix<f64> =
            SparseOps::from_triplets(2, 3, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 2, 2.0)]).unwrap();
        let mut adata = AnnDataContainer {
            obs: DataFrame::empty(),
            var: DataFrame::empty(),
            x,
            n_obs: 2,
            n_vars: 3,
            obs_names: vec!["A1".to_string(), "A2".to_string()],
            var_names: vec!["Actb".to_string(), "ERCC-00002".to_string(), "Gapdh".to_string()],
        };
        annotate_spike_ins(&mut adata, "ERCC").unwrap();
        adata
    }

    #[test]
    fn describes_shape_and_spike_ins() {
        let mut out = Vec::new();
        describe(&container(), "ERCC", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("AnnData object with n_obs × n_vars = 2 × 3\n"));
        assert!(text.contains("    obs: -\n"));
        assert!(text.contains("    var: 'ERCC'\n"));
        assert!(text.contains("3 non-zeros"));
        assert!(text.ends_with("Found 1 many Spike-Ins in the data\n"));
    }

    #[test]
    fn reports_missing_spike_in_column() {
        let mut out = Vec::new();
        describe(&container(), "Spike", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("No boolean var column named 'Spike'\n"));
    }

    #[test]
    fn inspects_file_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brain_AnnData.h5ad");
        write_anndata_h5ad(&container(), &path).unwrap();

        let args = InspectArgs::from_iter_safe(["inspect", "-i", path.to_str().unwrap()]).unwrap();
        assert_eq!(args.spike_in_column, "ERCC");
        run_inspect(args).unwrap();
    }

    #[test]
    fn describes_file_without_cells() {
        let mut adata = AnnDataContainer {
            obs: DataFrame::empty(),
            var: DataFrame::empty(),
            x: CsrMatrix::zeros(0, 2),
            n_obs: 0,
            n_vars: 2,
            obs_names: Vec::new(),
            var_names: vec!["Actb".to_string(), "ERCC-00002".to_string()],
        };
        annotate_spike_ins(&mut adata, "ERCC").unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.h5ad");
        write_anndata_h5ad(&adata, &path).unwrap();

        let mut out = Vec::new();
        describe(&read_anndata_h5ad(&path).unwrap(), "ERCC", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("AnnData object with n_obs × n_vars = 0 × 2\n"));
        assert!(text.ends_with("Found 1 many Spike-Ins in the data\n"));
    }
}
