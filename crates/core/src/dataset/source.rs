//! Where a dataset's bytes come from.
//!
//! Uploaded files live in a per-request scratch location and must be removed
//! once parsed no matter how parsing ends. Operator-supplied local files are
//! read in place and never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::dataset::loader::{LoaderError, TabularLoader};
use crate::dataset::{Dataset, DatasetKind};

pub trait DatasetSource {
    fn describe(&self) -> String;

    fn load(self, loader: &TabularLoader, kind: DatasetKind) -> Result<Dataset, LoaderError>;
}

/// A file on disk that the caller owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile(pub PathBuf);

impl DatasetSource for LocalFile {
    fn describe(&self) -> String {
        self.0.display().to_string()
    }

    fn load(self, loader: &TabularLoader, kind: DatasetKind) -> Result<Dataset, LoaderError> {
        loader.load_path(&self.0, kind)
    }
}

/// In-memory bytes, used by tests and small inline payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineBytes(pub Vec<u8>);

impl DatasetSource for InlineBytes {
    fn describe(&self) -> String {
        format!("<inline {} bytes>", self.0.len())
    }

    fn load(self, loader: &TabularLoader, kind: DatasetKind) -> Result<Dataset, LoaderError> {
        loader.load(self.0.as_slice(), kind)
    }
}

/// A scratch file written for a single request.
///
/// The file is deleted after [`DatasetSource::load`], and also on drop if it
/// was never loaded. Deletion failures are logged and swallowed.
#[derive(Debug)]
pub struct TransientUpload {
    path: Option<PathBuf>,
    correlation_id: String,
}

impl TransientUpload {
    pub fn new(path: impl Into<PathBuf>, correlation_id: impl Into<String>) -> Self {
        Self { path: Some(path.into()), correlation_id: correlation_id.into() }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn release(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(error) = remove_upload(&path) {
                warn!(
                    event_name = "ingest.upload.cleanup_failed",
                    correlation_id = %self.correlation_id,
                    path = %path.display(),
                    error = %error,
                    "failed to delete transient upload"
                );
            }
        }
    }
}

fn remove_upload(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl DatasetSource for TransientUpload {
    fn describe(&self) -> String {
        self.path.as_ref().map(|path| path.display().to_string()).unwrap_or_default()
    }

    fn load(mut self, loader: &TabularLoader, kind: DatasetKind) -> Result<Dataset, LoaderError> {
        let result = match self.path.as_deref() {
            Some(path) => loader.load_path(path, kind),
            None => Err(LoaderError::Malformed(format!("{kind} upload was already consumed"))),
        };
        self.release();
        result
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{DatasetSource, InlineBytes, LocalFile, TransientUpload};
    use crate::dataset::loader::TabularLoader;
    use crate::dataset::DatasetKind;

    #[test]
    fn transient_upload_is_deleted_after_successful_parse() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("gender.csv");
        fs::write(&path, "性別,比例\n男,40\n").expect("write upload");

        let dataset = TransientUpload::new(&path, "req-1")
            .load(&TabularLoader::default(), DatasetKind::Gender)
            .expect("upload should parse");

        assert_eq!(dataset.len(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn transient_upload_is_deleted_after_failed_parse() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("gender.csv");
        fs::write(&path, "性別,比例\n").expect("write upload");

        let result =
            TransientUpload::new(&path, "req-2").load(&TabularLoader::default(), DatasetKind::Gender);

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn unconsumed_transient_upload_is_deleted_on_drop() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("age.csv");
        fs::write(&path, "年齡,比例\n18-24,30\n").expect("write upload");

        drop(TransientUpload::new(&path, "req-3"));
        assert!(!path.exists());
    }

    #[test]
    fn already_missing_upload_does_not_panic() {
        let dir = TempDir::new().expect("temp dir");
        let upload = TransientUpload::new(dir.path().join("gone.csv"), "req-4");
        let result = upload.load(&TabularLoader::default(), DatasetKind::Age);
        assert!(result.is_err());
    }

    #[test]
    fn local_file_is_left_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("age.csv");
        fs::write(&path, "年齡,比例\n18-24,30\n").expect("write fixture");

        LocalFile(path.clone())
            .load(&TabularLoader::default(), DatasetKind::Age)
            .expect("local file should parse");
        assert!(path.exists());
    }

    #[test]
    fn inline_bytes_load_through_the_same_loader() {
        let dataset = InlineBytes(b"age,ratio\n35-44,12\n".to_vec())
            .load(&TabularLoader::default(), DatasetKind::Age)
            .expect("inline bytes should parse");
        assert_eq!(dataset.len(), 1);
    }
}
