//! Delimited-text ingestion.
//!
//! Records are pulled from the reader one at a time, so large uploads are
//! never buffered whole; only the resulting rows are kept.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::dataset::{Dataset, DatasetKind, Row};

const UTF8_BOM: char = '\u{feff}';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Header plus at least one data row and all required columns.
    #[default]
    Strict,
    /// Anything goes; a short stream yields an empty dataset.
    Lenient,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("could not read tabular input: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse tabular input: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed tabular input: {0}")]
    Malformed(String),
    #[error("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TabularLoader {
    mode: LoadMode,
}

impl TabularLoader {
    pub fn new(mode: LoadMode) -> Self {
        Self { mode }
    }

    /// Opens `path` and loads it; the file handle is released before return
    /// on both success and failure.
    pub fn load_path(&self, path: &Path, kind: DatasetKind) -> Result<Dataset, LoaderError> {
        let file = File::open(path)?;
        self.load(BufReader::new(file), kind)
    }

    pub fn load<R: Read>(&self, reader: R, kind: DatasetKind) -> Result<Dataset, LoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(index, header)| {
                if index == 0 {
                    header.trim_start_matches(UTF8_BOM).trim().to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();

        let has_header = headers.iter().any(|header| !header.is_empty());
        if !has_header {
            return self.short_input(kind, "missing header line");
        }

        if self.mode == LoadMode::Strict {
            check_required_columns(&headers, kind)?;
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(str::is_empty) {
                continue;
            }

            let row: Row = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return self.short_input(kind, "header has no data rows");
        }

        debug!(
            event_name = "ingest.dataset.loaded",
            dataset = %kind,
            rows = rows.len(),
            columns = headers.len(),
            "tabular dataset loaded"
        );

        Ok(Dataset { kind, headers, rows })
    }

    fn short_input(&self, kind: DatasetKind, reason: &str) -> Result<Dataset, LoaderError> {
        match self.mode {
            LoadMode::Strict => Err(LoaderError::Malformed(format!(
                "{kind} file needs a header line and at least one data row ({reason})"
            ))),
            LoadMode::Lenient => Ok(Dataset::empty(kind)),
        }
    }
}

fn check_required_columns(headers: &[String], kind: DatasetKind) -> Result<(), LoaderError> {
    let missing: Vec<String> = kind
        .required_fields()
        .iter()
        .filter(|field| !headers.iter().any(|header| field.matches_header(header)))
        .map(|field| field.label().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoaderError::MissingColumns { missing })
    }
}
