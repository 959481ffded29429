use crate::processors::ProcessorResult;
use polars::prelude::{CsvWriter as FrameWriter, DataFrame, SerWriter};
use serde::Serialize;
use std::io::{self, Write};

pub struct CsvWriter<W>
where
    W: io::Write,
{
    writer: csv::Writer<W>,
}

impl<W> CsvWriter<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer: csv::Writer::from_writer(writer) }
    }

    /// Writes one record per item, with a header line derived from the first item's field names.
    pub fn serialize<S, I>(&mut self, records: I) -> ProcessorResult<()>
    where
        S: Serialize,
        I: Iterator<Item=S>,
    {
        for record in records {
            self.writer.serialize(record)?;
        }
        Ok(self.writer.flush()?)
    }

    /// Writes the dataset's column names followed by its rows. Missing values are written as
    /// empty fields.
    pub fn write_dataset(&mut self, dataset: &DataFrame) -> ProcessorResult<()> {
        self.writer.flush()?;
        let output = self.writer.get_mut();
        FrameWriter::new(&mut *output)
            .include_header(true)
            .finish(&mut dataset.clone())?;
        Ok(output.flush()?)
    }
}
