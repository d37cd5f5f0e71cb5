use std::path::PathBuf;
use structopt::StructOpt;
use tmload_lib::core::fs::has_extension;
use tmload_lib::pipeline::load::{
    validate_input_files, LoaderError, ValidationConfig, DEFAULT_SPIKE_IN_MARKER,
};

pub const DEFAULT_COUNTS_PATH: &str = "./TM_Data/brain_counts.csv";
pub const DEFAULT_METADATA_PATH: &str = "./TM_Data/brain_metadata.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "./brain_AnnData.h5ad";
pub const DEFAULT_SUMMARY_COLUMNS: &[&str] = &["subtissue", "mouse.sex"];

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "load",
    about = "Load a CSV count matrix and cell metadata into an AnnData (.h5ad) file"
)]
pub struct LoadArgs {
    /// Count matrix (cells as rows, genes as columns, first column = cell id).
    #[structopt(long, parse(from_os_str), default_value = DEFAULT_COUNTS_PATH)]
    pub counts: PathBuf,

    /// Cell metadata table (first column = cell id).
    #[structopt(long, parse(from_os_str), default_value = DEFAULT_METADATA_PATH)]
    pub metadata: PathBuf,

    /// Output AnnData file; must end in `.h5ad` and is overwritten.
    #[structopt(long, short = "o", parse(from_os_str), default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Substring that marks spike-in control genes. Also names the var column.
    #[structopt(long, default_value = DEFAULT_SPIKE_IN_MARKER)]
    pub spike_in_marker: String,

    /// Metadata column to print a frequency table for. Repeat the flag for
    /// several columns; each value is taken verbatim. Defaults to `subtissue`
    /// and `mouse.sex`.
    #[structopt(long = "summary-column", number_of_values = 1)]
    pub summary_columns: Vec<String>,

    /// Field delimiter of both input tables (a single character, or `tab`).
    #[structopt(long, default_value = ",", parse(try_from_str = parse_delimiter))]
    pub delimiter: u8,

    /// Also write the frequency tables as TSV (gzip when the path ends in `.gz`).
    #[structopt(long, parse(from_os_str))]
    pub summary_out: Option<PathBuf>,

    /// Validate inputs and stop before loading anything.
    #[structopt(long)]
    pub dry_run: bool,
}

fn parse_delimiter(text: &str) -> Result<u8, String> {
    match text {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let bytes = text.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    text
                ))
            }
        }
    }
}

/// Normalised configuration derived from [`LoadArgs`].
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub counts: PathBuf,
    pub metadata: PathBuf,
    pub output: PathBuf,
    pub spike_in_marker: String,
    pub summary_columns: Vec<String>,
    pub delimiter: u8,
    pub summary_out: Option<PathBuf>,
    pub dry_run: bool,
}

impl From<LoadArgs> for LoadConfig {
    fn from(args: LoadArgs) -> LoadConfig {
        LoadConfig {
            counts: args.counts,
            metadata: args.metadata,
            output: args.output,
            spike_in_marker: args.spike_in_marker,
            summary_columns: if args.summary_columns.is_empty() {
                DEFAULT_SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect()
            } else {
                args.summary_columns
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .collect()
            },
            delimiter: args.delimiter,
            summary_out: args.summary_out,
            dry_run: args.dry_run,
        }
    }
}

impl LoadConfig {
    /// Validate configuration values, input presence and the output extension.
    ///
    /// Nothing is written or removed here, so this is safe for `--dry-run`.
    pub fn validate(&self) -> Result<(), LoaderError> {
        ValidationConfig {
            spike_in_marker: self.spike_in_marker.clone(),
            summary_columns: self.summary_columns.clone(),
            delimiter: self.delimiter,
        }
        .validate()?;

        validate_input_files(&self.counts, &self.metadata)?;

        if !has_extension(&self.output, "h5ad") {
            return Err(LoaderError::InvalidInput(format!(
                "Output file must have .h5ad extension: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> LoadConfig {
        let mut full = vec!["load"];
        full.extend_from_slice(argv);
        LoadArgs::from_iter_safe(full).unwrap().into()
    }

    #[test]
    fn defaults_match_tutorial_layout() {
        let config = parse(&[]);
        assert_eq!(config.counts, PathBuf::from(DEFAULT_COUNTS_PATH));
        assert_eq!(config.metadata, PathBuf::from(DEFAULT_METADATA_PATH));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.spike_in_marker, "ERCC");
        assert_eq!(config.summary_columns, vec!["subtissue", "mouse.sex"]);
        assert_eq!(config.delimiter, b',');
        assert!(config.summary_out.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse(&[
            "--counts",
            "c.csv.gz",
            "--summary-column",
            "cell_ontology_class",
            "--delimiter",
            "tab",
            "--spike-in-marker",
            "Spike",
            "--dry-run",
        ]);
        assert_eq!(config.counts, PathBuf::from("c.csv.gz"));
        assert_eq!(config.summary_columns, vec!["cell_ontology_class"]);
        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.spike_in_marker, "Spike");
        assert!(config.dry_run);
    }

    #[test]
    fn summary_columns_repeat_and_keep_commas() {
        let config = parse(&[
            "--summary-column",
            "subtissue",
            "--summary-column",
            "plate,barcode",
        ]);
        assert_eq!(config.summary_columns, vec!["subtissue", "plate,barcode"]);
    }

    #[test]
    fn delimiter_must_be_single_character() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
