//! Data loading utilities

use crate::error::{DelayError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV loader for flight exports
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned for schema inference; `None` scans the whole file
    infer_schema_length: Option<usize>,
    delimiter: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
            delimiter: b',',
        }
    }

    /// Limit schema inference to the first `rows` rows
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a headed CSV file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(DelayError::DataError(format!("file not found: {}", path.display())));
        }

        let parse_opts = CsvParseOptions::default().with_separator(self.delimiter);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }
}

/// Write `df` as a headed CSV file
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_flight_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Fecha-I,Fecha-O,OPERA,TIPOVUELO,MES").unwrap();
        writeln!(file, "2017-01-01 23:30:00,2017-01-01 23:33:00,American Airlines,I,1").unwrap();
        writeln!(file, "2017-01-02 23:30:00,2017-01-02 23:59:00,Grupo LATAM,N,1").unwrap();
        file.flush().unwrap();

        let df = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 5);
        assert!(df.column("OPERA").is_ok());
        assert!(df.column("MES").unwrap().dtype().is_integer());
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_csv("/nonexistent/flights.csv").unwrap_err();
        assert!(matches!(err, DelayError::DataError(_)));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut df = df!("predict" => &[0i32, 1, 0]).unwrap();

        write_csv(&mut df, &path).unwrap();
        let back = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(back.height(), 3);
    }
}
