use crate::dataset::DatasetError;
use crate::processor::DataProcessor;
use crate::processors::csv::CsvDataProcessor;
use crate::processors::txt::TxtDataProcessor;
use polars::prelude::{DataFrame, PolarsError};
use std::io;
use std::path::Path;
use thiserror::Error;

pub mod csv;
pub mod txt;

/// A loaded dataset needs at least this many columns to be processed.
pub const MIN_COLUMNS: usize = 2;

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("error processing csv: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("error loading dataframe: {0}")]
    Polars(#[from] PolarsError),

    #[error("error reading data source: {0}")]
    Io(#[from] io::Error),

    #[error("invalid dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("no dataset loaded")]
    NotLoaded,
}

/// Picks a processor by the extension of `path`: `.csv` files get a [`CsvDataProcessor`], `.txt`
/// files a [`TxtDataProcessor`]. Other files have no processor.
pub fn detect_processor(path: &Path) -> Option<Box<dyn DataProcessor>> {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("csv") => Some(Box::new(CsvDataProcessor::new(path))),
        Some("txt") => Some(Box::new(TxtDataProcessor::new(path))),
        _ => None,
    }
}

fn ensure_min_columns(dataset: DataFrame) -> ProcessorResult<DataFrame> {
    if dataset.width() < MIN_COLUMNS {
        return Err(ProcessorError::InvalidFormat(format!(
            "expected at least {} columns, found {}", MIN_COLUMNS, dataset.width(),
        )));
    }
    Ok(dataset)
}
