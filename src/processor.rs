use crate::processors::{ProcessorError, ProcessorResult};
use polars::prelude::DataFrame;
use std::io::{self, Write};
use std::path::Path;
use tracing::{error, info};

/// A processor loads one data source, applies its transform sequence and exposes the result.
pub trait DataProcessor {
    /// Short name of the input format, used when printing the result.
    fn label(&self) -> &'static str;

    /// Path of the data source this processor reads from.
    fn source(&self) -> &Path;

    /// Loads the data source. On failure no dataset state is set.
    fn try_read(&mut self) -> ProcessorResult<()>;

    /// Applies the transform sequence to the loaded dataset and stores the result.
    fn run(&mut self) -> ProcessorResult<()>;

    /// The transformed dataset, once [`run`](Self::run) succeeded.
    fn result(&self) -> Option<&DataFrame>;

    /// Loads the data source, logging the cause of any failure.
    ///
    /// Returns `false` if the source could not be loaded or has fewer than two columns.
    fn read(&mut self) -> bool {
        match self.try_read() {
            Ok(()) => {
                info!(path = %self.source().display(), format = self.label(), "data source loaded");
                true
            }
            Err(err) => {
                error!(path = %self.source().display(), error = %err, "error reading data source");
                false
            }
        }
    }

    fn write_result(&self, output: &mut dyn Write) -> io::Result<()> {
        writeln!(output, "Running {}-file processor!", self.label())?;
        match self.result() {
            Some(result) => writeln!(output, "{}", result),
            None => writeln!(output, "None"),
        }
    }

    /// Writes the result to stdout.
    fn print_result(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.write_result(&mut handle)?;
        handle.flush()
    }
}

/// Runs the processor, prints its result and hands back a copy of it.
pub fn run_processor(processor: &mut dyn DataProcessor) -> ProcessorResult<DataFrame> {
    processor.run()?;
    processor.print_result()?;
    processor.result().cloned().ok_or(ProcessorError::NotLoaded)
}
