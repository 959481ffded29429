use crate::dataset::MISSING_MARKERS;
use crate::processors::ProcessorError::InvalidFormat;
use crate::processors::{ensure_min_columns, ProcessorResult};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use std::io::{self, BufRead, Lines};

/// Reads whitespace separated records with a header line into a [`DataFrame`].
///
/// Blank lines are skipped. Records with fewer fields than the header are padded with nulls;
/// records with more fields are rejected. A column is typed as integer or float when every
/// present value parses as one, and as text otherwise.
pub struct WhitespaceReader<R> {
    lines: Lines<R>,
    headers: Vec<String>,
    line: usize,
}

impl<R> WhitespaceReader<R>
where
    R: BufRead,
{
    pub fn try_new(reader: R) -> ProcessorResult<Self> {
        let mut reader = Self { lines: reader.lines(), headers: Vec::new(), line: 0 };
        if let Some(headers) = reader.next_fields()? {
            reader.headers = headers;
        }
        Ok(reader)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn read_dataset(mut self) -> ProcessorResult<DataFrame> {
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); self.headers.len()];
        while let Some(record) = self.next_record()? {
            for (column, value) in cells.iter_mut().zip(record) {
                column.push(value);
            }
        }
        let columns = self
            .headers
            .iter()
            .zip(cells)
            .map(|(name, values)| typed_column(name, values))
            .collect();
        ensure_min_columns(DataFrame::new(columns)?)
    }

    fn next_record(&mut self) -> ProcessorResult<Option<Vec<Option<String>>>> {
        let width = self.headers.len();
        let Some(fields) = self.next_fields()? else {
            return Ok(None);
        };
        if fields.len() > width {
            return Err(InvalidFormat(format!(
                "line {}: expected {} fields, saw {}", self.line, width, fields.len(),
            )));
        }
        let mut values: Vec<Option<String>> = fields
            .into_iter()
            .map(|field| Some(field).filter(|field| !MISSING_MARKERS.contains(&field.as_str())))
            .collect();
        values.resize(width, None);
        Ok(Some(values))
    }

    /// Splits the next non-blank line into fields.
    fn next_fields(&mut self) -> io::Result<Option<Vec<String>>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line += 1;
            let fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if !fields.is_empty() {
                return Ok(Some(fields));
            }
        }
        Ok(None)
    }
}

fn typed_column(name: &str, values: Vec<Option<String>>) -> Column {
    let text = Series::new(name.into(), values);
    let typed = [DataType::Int64, DataType::Float64]
        .iter()
        .find_map(|dtype| text.strict_cast(dtype).ok());
    Column::from(typed.unwrap_or(text))
}
