use crate::core::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip-compatible extension.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip"
    )
}

/// Check whether a path carries the given extension, ignoring ASCII case.
pub fn has_extension<P: AsRef<Path>>(path: P, expected: &str) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recognises_gzip_extensions() {
        assert!(is_gzipped("counts.csv.gz"));
        assert!(is_gzipped("counts.csv.gzip"));
        assert!(!is_gzipped("counts.csv"));
        assert!(!is_gzipped("counts"));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_extension("brain.h5ad", "h5ad"));
        assert!(has_extension("brain.H5AD", "h5ad"));
        assert!(!has_extension("brain.h5", "h5ad"));
    }

    #[test]
    fn creates_nested_parent_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("out.h5ad");
        make_parent_dirs(&target).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }

    #[test]
    fn bare_file_name_needs_no_parent() {
        make_parent_dirs("out.h5ad").unwrap();
    }
}
