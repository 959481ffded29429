use anyhow::{bail, Context};
use clap::{Parser, ValueHint};
use dataset_processor::processor::{run_processor, DataProcessor};
use dataset_processor::processors::csv::writer::CsvWriter;
use dataset_processor::processors::detect_processor;
use dataset_processor::repository::{
    insert_into_source_files, insert_rows_into_processed_data, select_all_from_source_files,
    SourceFileBinding, StoreConnector,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the dataset to process.
    ///
    /// Supported file formats: CSV (.csv), whitespace separated text (.txt)
    #[arg(value_hint = ValueHint::FilePath)]
    path: PathBuf,

    /// URL of the SQLite store that records processed files.
    #[arg(long, default_value = "sqlite:///db1.db")]
    db: String,

    /// Also store the processed rows in the `processed_data1` table.
    #[arg(long)]
    store_rows: bool,

    /// Source file record that stored rows are tagged with.
    #[arg(long, value_enum, default_value_t = SourceFileBinding::Latest)]
    bind: SourceFileBinding,

    /// Write the processed dataset as CSV to this file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    export: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let Some(mut processor) = detect_processor(&cli.path) else {
        info!(path = %cli.path.display(), "no processor for file type, nothing to do");
        return Ok(());
    };
    if !processor.read() {
        bail!("unable to read data source {}", cli.path.display());
    }
    let result = run_processor(processor.as_mut()).context("processing data source failed")?;

    if let Some(export) = &cli.export {
        let file = File::create(export).context("unable to create export file")?;
        CsvWriter::new(BufWriter::new(file))
            .write_dataset(&result)
            .context("exporting processed dataset failed")?;
    }

    let filename = cli.path.to_string_lossy();
    let mut connector = StoreConnector::open(&cli.db).context("unable to open store")?;
    insert_into_source_files(&mut connector, &filename).context("unable to record source file")?;

    let records = select_all_from_source_files(&mut connector).context("unable to list source files")?;
    let mut stdout = io::stdout().lock();
    CsvWriter::new(&mut stdout)
        .serialize(records.iter())
        .context("unable to print source files")?;
    stdout.flush()?;

    if cli.store_rows {
        insert_rows_into_processed_data(&mut connector, &result, &filename, cli.bind)
            .context("unable to store processed rows")?;
    }
    connector.close().context("unable to close store")
}
