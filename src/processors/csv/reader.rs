use crate::dataset::MISSING_MARKERS;
use crate::processors::{ensure_min_columns, ProcessorResult};
use polars::prelude::{
    CsvParseOptions, CsvReadOptions, DataFrame, NullValues, PlSmallStr, SerReader,
};
use std::io::{Cursor, Read};

/// Reads comma separated records with a header line into a [`DataFrame`].
///
/// Column types are inferred from the whole input. Empty fields and the usual missing-value
/// markers are read as nulls.
pub struct CsvReader<R> {
    input: R,
}

impl<R> CsvReader<R>
where
    R: Read,
{
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Reads all records. Fails on malformed input or if the header names fewer than two
    /// columns.
    pub fn read_dataset(mut self) -> ProcessorResult<DataFrame> {
        let mut bytes = Vec::new();
        self.input.read_to_end(&mut bytes)?;

        let null_values = MISSING_MARKERS.iter().map(|&marker| PlSmallStr::from(marker)).collect();
        let parse_options = CsvParseOptions::default()
            .with_separator(b',')
            .with_null_values(Some(NullValues::AllColumns(null_values)));
        let dataset = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_parse_options(parse_options)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        ensure_min_columns(dataset)
    }
}
