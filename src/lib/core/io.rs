use crate::core::error::{LoaderError, Result};
use crate::core::fs::is_gzipped;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Build a CSV reader for a file (or stdin when the path is `-`).
///
/// Gzip input is detected from the file extension.
pub fn get_reader<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
    has_headers: bool,
) -> Result<csv::Reader<Box<dyn Read>>> {
    let path = path.as_ref();
    let raw_reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LoaderError::FileNotFound(path.display().to_string())
            } else {
                LoaderError::Io(e)
            }
        })?;
        let reader = BufReader::with_capacity(256 * 1024, file);
        if is_gzipped(path) {
            Box::new(MultiGzDecoder::new(reader))
        } else {
            Box::new(reader)
        }
    };

    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .from_reader(raw_reader))
}

/// Build a CSV writer for a file.
///
/// Output is gzip-compressed when the path carries a gzip extension.
pub fn get_writer<P: AsRef<Path>>(
    path: P,
    write_headers: bool,
    delimiter: u8,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    let raw_writer: Box<dyn Write> = if is_gzipped(path) {
        Box::new(GzEncoder::new(writer, Compression::default()))
    } else {
        Box::new(writer)
    };

    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(write_headers)
        .from_writer(raw_writer))
}
