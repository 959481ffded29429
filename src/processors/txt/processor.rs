use crate::dataset::sort_by;
use crate::processor::DataProcessor;
use crate::processors::txt::reader::WhitespaceReader;
use crate::processors::{ProcessorError, ProcessorResult};
use polars::prelude::DataFrame;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const SORT_COLUMN: &str = "production_countries";

/// Processes whitespace separated text files by sorting them on a single column.
pub struct TxtDataProcessor {
    source: PathBuf,
    dataset: Option<DataFrame>,
    result: Option<DataFrame>,
    sort_column: String,
}

impl TxtDataProcessor {
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            dataset: None,
            result: None,
            sort_column: SORT_COLUMN.to_string(),
        }
    }

    pub fn with_sort_column(mut self, column: &str) -> Self {
        self.sort_column = column.to_string();
        self
    }

    /// Loads the dataset from `input` instead of the source file.
    pub fn load<R: BufRead>(&mut self, input: R) -> ProcessorResult<()> {
        self.dataset = Some(WhitespaceReader::try_new(input)?.read_dataset()?);
        Ok(())
    }

    pub fn dataset(&self) -> Option<&DataFrame> {
        self.dataset.as_ref()
    }
}

impl DataProcessor for TxtDataProcessor {
    fn label(&self) -> &'static str {
        "TXT"
    }

    fn source(&self) -> &Path {
        &self.source
    }

    fn try_read(&mut self) -> ProcessorResult<()> {
        let file = File::open(&self.source)?;
        self.load(BufReader::new(file))
    }

    fn run(&mut self) -> ProcessorResult<()> {
        let dataset = self.dataset.as_ref().ok_or(ProcessorError::NotLoaded)?;
        self.result = Some(sort_by(dataset, &self.sort_column, true)?);
        Ok(())
    }

    fn result(&self) -> Option<&DataFrame> {
        self.result.as_ref()
    }
}
