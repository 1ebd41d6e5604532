//! Append-only CSV feature table.
//!
//! Every [`FeatureSink::append`] opens the file in append mode, writes the
//! row, and closes it again, so nothing is held open between packets and a
//! reader always sees whole rows.

use crate::error::SinkError;
use crate::features::{FeatureRecord, FEATURE_COLUMNS};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub struct FeatureSink {
    path: PathBuf,
    columns: Vec<String>,
    header_written: bool,
}

impl FeatureSink {
    /// Sink with the canonical column order.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        Self::with_columns(path, FEATURE_COLUMNS)
    }

    /// Sink with a caller-chosen subset/order of feature columns.
    ///
    /// Creates the parent directory if needed. A file that already exists
    /// and is non-empty is assumed to carry a header; an empty one gets a
    /// header on the first append.
    pub fn with_columns<I, S>(path: impl Into<PathBuf>, columns: I) -> Result<Self, SinkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.into();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(SinkError::NoColumns);
        }
        if let Some(unknown) = columns.iter().find(|c| !FEATURE_COLUMNS.contains(&c.as_str())) {
            return Err(SinkError::UnknownColumn(unknown.clone()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let header_written = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        Ok(Self {
            path,
            columns,
            header_written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// Append one row, preceded by the header if this file has none yet.
    pub fn append(&mut self, record: &FeatureRecord) -> Result<(), SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open {
                path: self.path.clone(),
                source,
            })?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if !self.header_written {
            wtr.write_record(&self.columns)
                .and_then(|_| wtr.flush().map_err(csv::Error::from))
                .map_err(|source| self.write_error(source))?;
            self.header_written = true;
        }

        let row: Vec<String> = self
            .columns
            .iter()
            .map(|c| record.value(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        wtr.write_record(&row)
            .and_then(|_| wtr.flush().map_err(csv::Error::from))
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: csv::Error) -> SinkError {
        SinkError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
