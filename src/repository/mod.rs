//! Records of processed source files, kept in SQLite.

mod connector;
mod sql_api;

pub use connector::StoreConnector;
pub use sql_api::{
    insert_into_source_files, insert_into_source_files_at, insert_rows_into_processed_data,
    select_all_from_source_files, PROCESSED_COLUMNS, TIMESTAMP_FORMAT,
};

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid timestamp in store: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("unsupported store url: {0}")]
    UnsupportedUrl(String),

    #[error("dataset lacks column required by the store: {0}")]
    MissingColumn(String),

    #[error("unable to read dataset cell: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Selects the source file record that stored rows are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceFileBinding {
    /// The earliest record of all source files, regardless of its filename.
    Earliest,

    /// The most recent record of the file the rows were processed from.
    #[default]
    Latest,
}

/// An entry noting that a source file was processed, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFileRecord {
    id: i64,

    filename: String,

    #[serde(serialize_with = "serialize_timestamp")]
    processed: NaiveDateTime,
}

impl SourceFileRecord {
    pub fn new(id: i64, filename: impl Into<String>, processed: NaiveDateTime) -> Self {
        Self { id, filename: filename.into(), processed }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn processed(&self) -> NaiveDateTime {
        self.processed
    }
}

fn serialize_timestamp<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&timestamp.format(TIMESTAMP_FORMAT))
}
