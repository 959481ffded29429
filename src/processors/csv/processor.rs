use crate::dataset::{cut, drop_missing, filter_eq, mean_by_filter, sort_by, Bins};
use crate::processor::DataProcessor;
use crate::processors::csv::reader::CsvReader;
use crate::processors::{ProcessorError, ProcessorResult};
use polars::prelude::DataFrame;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const BUCKET_COLUMN: &str = "Release_year";
const CATEGORY_COLUMN: &str = "period_category";
const BUCKET_EDGES: [f64; 4] = [1995.0, 2000.0, 2005.0, 2016.0];
const BUCKET_LABELS: [i64; 3] = [1, 2, 3];
const FOCUS_VALUE: i64 = 2009;

/// Processes comma separated files.
///
/// The transform sequence drops incomplete rows, buckets the release year into periods and sorts
/// by release year. While running, the rows released in the focus year and their column means
/// are printed.
pub struct CsvDataProcessor {
    source: PathBuf,
    dataset: Option<DataFrame>,
    result: Option<DataFrame>,
    focus: Option<DataFrame>,
    focus_means: Option<DataFrame>,
    bucket_column: String,
    category_column: String,
    edges: Vec<f64>,
    labels: Vec<i64>,
    focus_value: i64,
    print_focus: bool,
}

impl CsvDataProcessor {
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            dataset: None,
            result: None,
            focus: None,
            focus_means: None,
            bucket_column: BUCKET_COLUMN.to_string(),
            category_column: CATEGORY_COLUMN.to_string(),
            edges: BUCKET_EDGES.to_vec(),
            labels: BUCKET_LABELS.to_vec(),
            focus_value: FOCUS_VALUE,
            print_focus: true,
        }
    }

    /// Buckets `source` into `category` instead of the release year columns.
    pub fn with_bucket_columns(mut self, source: &str, category: &str) -> Self {
        self.bucket_column = source.to_string();
        self.category_column = category.to_string();
        self
    }

    /// Overrides the bucket edges and labels. They are validated when the processor runs.
    pub fn with_bins(mut self, edges: Vec<f64>, labels: Vec<i64>) -> Self {
        self.edges = edges;
        self.labels = labels;
        self
    }

    pub fn with_focus_value(mut self, value: i64) -> Self {
        self.focus_value = value;
        self
    }

    /// Whether [`run`](DataProcessor::run) prints the focus view to stdout. On by default.
    pub fn with_focus_printing(mut self, enabled: bool) -> Self {
        self.print_focus = enabled;
        self
    }

    /// Loads the dataset from `input` instead of the source file.
    pub fn load<R: Read>(&mut self, input: R) -> ProcessorResult<()> {
        self.dataset = Some(CsvReader::new(input).read_dataset()?);
        Ok(())
    }

    /// The loaded dataset. Once the processor ran it holds only complete rows and the category
    /// column.
    pub fn dataset(&self) -> Option<&DataFrame> {
        self.dataset.as_ref()
    }

    /// Rows whose bucket column equals the focus value, computed during
    /// [`run`](DataProcessor::run).
    pub fn focus(&self) -> Option<&DataFrame> {
        self.focus.as_ref()
    }

    /// Means of the numeric columns over the focus rows.
    pub fn focus_means(&self) -> Option<&DataFrame> {
        self.focus_means.as_ref()
    }

    /// Writes the focus rows followed by their column means. Nothing is written before the
    /// processor ran.
    pub fn write_focus(&self, output: &mut dyn Write) -> io::Result<()> {
        if let Some(focus) = &self.focus {
            writeln!(output, "{}", focus)?;
        }
        if let Some(means) = &self.focus_means {
            writeln!(output, "{}", means)?;
        }
        Ok(())
    }
}

impl DataProcessor for CsvDataProcessor {
    fn label(&self) -> &'static str {
        "CSV"
    }

    fn source(&self) -> &Path {
        &self.source
    }

    fn try_read(&mut self) -> ProcessorResult<()> {
        let file = File::open(&self.source)?;
        self.load(BufReader::new(file))
    }

    fn run(&mut self) -> ProcessorResult<()> {
        let bins = Bins::new(self.edges.clone(), self.labels.clone())?;
        let dataset = self.dataset.as_ref().ok_or(ProcessorError::NotLoaded)?;

        let complete = drop_missing(dataset)?;
        debug!(dropped = dataset.height() - complete.height(), "dropped rows with missing values");

        let labelled = cut(&complete, &self.bucket_column, &self.category_column, &bins)?;
        let result = sort_by(&labelled, &self.bucket_column, true)?;
        let focus = filter_eq(&labelled, &self.bucket_column, self.focus_value)?;
        let focus_means = mean_by_filter(&labelled, &self.bucket_column, self.focus_value)?;

        self.dataset = Some(labelled);
        self.result = Some(result);
        self.focus = Some(focus);
        self.focus_means = Some(focus_means);
        if self.print_focus {
            self.write_focus(&mut io::stdout().lock())?;
        }
        Ok(())
    }

    fn result(&self) -> Option<&DataFrame> {
        self.result.as_ref()
    }
}
