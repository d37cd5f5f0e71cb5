//! Descriptive statistics printed before assembly: dataset shape and
//! frequency tables of categorical metadata columns.

use crate::core::error::Result;
use crate::core::fs::make_parent_dirs;
use crate::core::io::get_writer;
use crate::pipeline::load::counts::CountMatrix;
use crate::pipeline::load::metadata::CellMetadata;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Separator printed between consecutive frequency tables.
pub const TABLE_SEPARATOR: &str = "----------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// Distinct values of one column with their counts.
///
/// Entries are ordered by descending count; ties are ordered by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    pub column: String,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn from_values<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for value in values {
            *counts.entry(value.as_ref().to_string()).or_insert(0) += 1;
        }

        let mut entries: Vec<FrequencyEntry> = counts
            .into_iter()
            .map(|(value, count)| FrequencyEntry { value, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

        Self {
            column: column.to_string(),
            entries,
        }
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

impl fmt::Display for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.column)?;
        let width = self
            .entries
            .iter()
            .map(|e| e.value.chars().count())
            .max()
            .unwrap_or(0);
        for entry in &self.entries {
            writeln!(f, "{:<width$}    {}", entry.value, entry.count, width = width)?;
        }
        Ok(())
    }
}

/// Shape of the count matrix plus the requested frequency tables.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub n_cells: usize,
    pub n_genes: usize,
    pub tables: Vec<FrequencyTable>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Number of Unique Cells: {}", self.n_cells)?;
        writeln!(f, "Number of Genes: {}", self.n_genes)?;
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                writeln!(f, "{}", TABLE_SEPARATOR)?;
            }
            write!(f, "{}", table)?;
        }
        Ok(())
    }
}

/// Summarise the dataset.
///
/// Frequency tables cover every metadata row as loaded. Missing values are
/// left out of the tables.
pub fn summarize(
    counts: &CountMatrix,
    metadata: &CellMetadata,
    columns: &[String],
) -> Result<DatasetSummary> {
    let tables = columns
        .iter()
        .map(|column| -> Result<FrequencyTable> {
            let values = metadata.column_values(column)?;
            let table = FrequencyTable::from_values(column, values.into_iter().flatten());
            let skipped = metadata.n_cells() - table.total();
            if skipped > 0 {
                debug!("Skipped {} missing value(s) in column '{}'", skipped, column);
            }
            Ok(table)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DatasetSummary {
        n_cells: counts.n_cells(),
        n_genes: counts.n_genes(),
        tables,
    })
}

#[derive(Debug, Serialize)]
struct FrequencyRecord<'a> {
    column: &'a str,
    value: &'a str,
    count: usize,
}

/// Write frequency tables as TSV (`column`, `value`, `count`).
pub fn write_frequency_tables<P: AsRef<Path>>(path: P, tables: &[FrequencyTable]) -> Result<()> {
    let path = path.as_ref();
    make_parent_dirs(path)?;
    let mut writer = get_writer(path, true, b'\t')?;
    for table in tables {
        for entry in &table.entries {
            writer.serialize(FrequencyRecord {
                column: &table.column,
                value: &entry.value,
                count: entry.count,
            })?;
        }
    }
    writer.flush()?;
    info!("Frequency tables written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::load::counts::read_count_matrix;
    use crate::pipeline::load::metadata::read_metadata;
    use tempfile::tempdir;

    fn reader(text: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new().from_reader(text.as_bytes())
    }

    fn count_of(table: &FrequencyTable, value: &str) -> Option<usize> {
        table
            .entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.count)
    }

    #[test]
    fn counts_are_sorted_descending() {
        let values = [
            "Cortex", "Hippocampus", "Cortex", "Striatum", "Cortex", "Hippocampus", "Cortex",
            "Hippocampus", "Cortex", "Striatum",
        ];
        let table = FrequencyTable::from_values("subtissue", values);

        let got: Vec<(&str, usize)> = table
            .entries
            .iter()
            .map(|e| (e.value.as_str(), e.count))
            .collect();
        assert_eq!(got, vec![("Cortex", 5), ("Hippocampus", 3), ("Striatum", 2)]);
        assert_eq!(table.total(), values.len());
        assert_eq!(count_of(&table, "Striatum"), Some(2));
        assert_eq!(count_of(&table, "Cerebellum"), None);
    }

    #[test]
    fn ties_are_broken_by_label() {
        let table = FrequencyTable::from_values("mouse.sex", ["M", "F", "M", "F"]);
        let labels: Vec<&str> = table.entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(labels, vec!["F", "M"]);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = FrequencyTable::from_values("subtissue", Vec::<String>::new());
        assert!(table.entries.is_empty());
        assert_eq!(table.total(), 0);
        assert_eq!(table.to_string(), "subtissue\n");
    }

    #[test]
    fn display_pads_labels() {
        let table = FrequencyTable::from_values("mouse.sex", ["M", "M", "Fem"]);
        assert_eq!(table.to_string(), "mouse.sex\nM      2\nFem    1\n");
    }

    #[test]
    fn summary_reports_shape_and_tables() {
        let counts = read_count_matrix(reader("cell,g1,g2,g3\nc1,1,0,0\nc2,0,2,0\n"), "c").unwrap();
        let meta = read_metadata(
            reader("cell,subtissue,mouse.sex\nc1,Cortex,M\nc2,Striatum,M\n"),
            "m",
        )
        .unwrap();
        let columns = vec!["subtissue".to_string(), "mouse.sex".to_string()];
        let summary = summarize(&counts, &meta, &columns).unwrap();

        assert_eq!(summary.n_cells, 2);
        assert_eq!(summary.n_genes, 3);
        assert_eq!(summary.tables.len(), 2);
        assert_eq!(count_of(&summary.tables[1], "M"), Some(2));

        let text = summary.to_string();
        assert!(text.starts_with("Number of Unique Cells: 2\nNumber of Genes: 3\n"));
        assert!(text.contains("subtissue\n"));
        assert!(text.contains(TABLE_SEPARATOR));
    }

    #[test]
    fn zero_rows_summarise_cleanly() {
        let counts = read_count_matrix(reader("cell,g1\n"), "c").unwrap();
        let meta = read_metadata(reader("cell,subtissue,mouse.sex\n"), "m").unwrap();
        let columns = vec!["subtissue".to_string(), "mouse.sex".to_string()];
        let summary = summarize(&counts, &meta, &columns).unwrap();

        assert_eq!(summary.n_cells, 0);
        assert!(summary.tables.iter().all(|t| t.entries.is_empty()));
    }

    #[test]
    fn missing_values_are_left_out_of_tables() {
        let counts = read_count_matrix(reader("cell,g1\nc1,1\nc2,1\nc3,1\n"), "c").unwrap();
        let meta = read_metadata(
            reader("cell,subtissue,score\nc1,Cortex,0.5\nc2,,\nc3,Cortex,0.5\n"),
            "m",
        )
        .unwrap();
        let columns = vec!["subtissue".to_string(), "score".to_string()];
        let summary = summarize(&counts, &meta, &columns).unwrap();

        assert_eq!(summary.tables[0].entries.len(), 1);
        assert_eq!(count_of(&summary.tables[0], "Cortex"), Some(2));
        assert_eq!(summary.tables[1].entries.len(), 1);
        assert_eq!(count_of(&summary.tables[1], "0.5"), Some(2));
        assert_eq!(count_of(&summary.tables[1], "NaN"), None);
    }

    #[test]
    fn missing_summary_column_is_an_error() {
        let counts = read_count_matrix(reader("cell,g1\nc1,1\n"), "c").unwrap();
        let meta = read_metadata(reader("cell,subtissue\nc1,Cortex\n"), "m").unwrap();
        assert!(summarize(&counts, &meta, &["mouse.sex".to_string()]).is_err());
    }

    #[test]
    fn writes_tsv_summary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary").join("freq.tsv");
        let tables = vec![FrequencyTable::from_values("mouse.sex", ["M", "F", "M"])];
        write_frequency_tables(&path, &tables).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "column\tvalue\tcount\nmouse.sex\tM\t2\nmouse.sex\tF\t1\n");
    }
}
