use anyhow::Result;
use log::{error, info};
use std::io::{self, Write};

use tmload_lib::pipeline::load::{
    annotate_spike_ins, load_count_matrix, load_metadata, summarize, write_anndata_h5ad,
    write_frequency_tables, AnnDataContainer, LoaderError,
};

use super::args::{LoadArgs, LoadConfig};

/// What a completed load produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub n_cells: usize,
    pub n_genes: usize,
    pub spike_ins: usize,
}

pub fn run_load(args: LoadArgs) -> Result<()> {
    let config: LoadConfig = args.into();
    info!("Starting tmload pipeline");
    info!("Configuration: {:?}", config);

    config.validate()?;
    info!("Input validation passed");

    if config.dry_run {
        info!("Dry run completed successfully - all validations passed");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute_pipeline(&config, &mut out) {
        Ok(report) => {
            info!(
                "Load completed: {} cells × {} genes, {} spike-ins",
                report.n_cells, report.n_genes, report.spike_ins
            );
            info!("Output written to: {}", config.output.display());
            Ok(())
        }
        Err(err) => {
            error!("Load failed: {}", err);
            Err(err.into())
        }
    }
}

/// Run every step once, top to bottom. Console output goes to `out`.
fn execute_pipeline<W: Write>(config: &LoadConfig, out: &mut W) -> Result<LoadReport, LoaderError> {
    let counts = load_count_matrix(&config.counts, config.delimiter)?;
    let metadata = load_metadata(&config.metadata, config.delimiter)?;

    let summary = summarize(&counts, &metadata, &config.summary_columns)?;
    write!(out, "{}", summary)?;
    out.flush()?;

    if let Some(path) = &config.summary_out {
        write_frequency_tables(path, &summary.tables)?;
    }

    info!("Assembling annotated matrix...");
    let mut adata = AnnDataContainer::assemble(counts, &metadata)?;

    info!(
        "Annotating spike-ins with marker '{}'...",
        config.spike_in_marker
    );
    let spike_ins = annotate_spike_ins(&mut adata, &config.spike_in_marker)?;
    writeln!(out, "Found {} many Spike-Ins in the data", spike_ins)?;
    out.flush()?;

    write_anndata_h5ad(&adata, &config.output)?;

    Ok(LoadReport {
        n_cells: adata.n_obs,
        n_genes: adata.n_vars,
        spike_ins,
    })
}
