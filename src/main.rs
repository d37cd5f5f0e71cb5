//! tmload - Tabula Muris count matrix loader
//!
//! Turns a single-cell count matrix (cells as rows, genes as columns) and a
//! per-cell metadata table into an AnnData `.h5ad` file. Along the way it
//! prints the dataset shape and frequency tables of selected metadata
//! columns, and flags ERCC spike-in controls in the gene annotations.
//!
//! # Tools
//!
//! - `load`: Load CSV inputs, summarise them and write `.h5ad`
//! - `inspect`: Print the layout of an existing `.h5ad` file
//!
//! # Usage
//!
//! ```bash
//! # Tutorial defaults: ./TM_Data/brain_{counts,metadata}.csv -> ./brain_AnnData.h5ad
//! tmload load
//!
//! # Explicit paths and a different set of summary columns
//! tmload load --counts counts.csv.gz --metadata meta.csv -o out/brain.h5ad \
//!     --summary-column cell_ontology_class --summary-column subtissue
//!
//! # Check the result
//! tmload inspect -i brain_AnnData.h5ad
//! ```

extern crate tmload_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use structopt::StructOpt;
use tmload_lib::utils;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Load single-cell count matrices and metadata into AnnData
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Load a count matrix and metadata, summarise them and write .h5ad
    Load(commands::LoadArgs),
    /// Print shape, annotations and spike-in count of an .h5ad file
    Inspect(commands::InspectArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Load(args) => commands::run_load(args)?,
            Subcommand::Inspect(args) => commands::run_inspect(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
