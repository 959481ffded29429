use crate::repository::{
    RepositoryError, RepositoryResult, SourceFileBinding, SourceFileRecord, StoreConnector,
};
use chrono::{Local, NaiveDateTime};
use polars::prelude::{AnyValue, Column, DataFrame, PolarsResult};
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params, ToSql};
use tracing::{debug, info, warn};

/// Format of the `processed` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Dataset columns stored in `processed_data1`, in statement order.
pub const PROCESSED_COLUMNS: [&str; 6] = [
    "genres",
    "title_movie",
    "production_countries",
    "Release_year",
    "Runtime",
    "tagline",
];

/// A dataset cell bound as a statement parameter.
struct SqlCell<'a>(AnyValue<'a>);

impl ToSql for SqlCell<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match &self.0 {
            AnyValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            AnyValue::Boolean(flag) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*flag))),
            AnyValue::String(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            AnyValue::StringOwned(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            AnyValue::Float32(float) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*float))),
            AnyValue::Float64(float) => ToSqlOutput::Owned(SqlValue::Real(*float)),
            other => match other.extract::<i64>() {
                Some(int) => ToSqlOutput::Owned(SqlValue::Integer(int)),
                None => ToSqlOutput::Owned(SqlValue::Text(other.to_string())),
            },
        })
    }
}

/// Records that `filename` was processed now, in local time. Returns the id of the new record.
///
/// Repeated calls with the same filename create separate records.
pub fn insert_into_source_files(
    connector: &mut StoreConnector,
    filename: &str,
) -> RepositoryResult<i64> {
    insert_into_source_files_at(connector, filename, Local::now().naive_local())
}

/// Records that `filename` was processed at `processed`, truncated to whole seconds.
pub fn insert_into_source_files_at(
    connector: &mut StoreConnector,
    filename: &str,
    processed: NaiveDateTime,
) -> RepositoryResult<i64> {
    let processed = processed.format(TIMESTAMP_FORMAT).to_string();
    let transaction = connector.transaction()?;
    transaction.execute(
        "INSERT INTO source_files (filename, processed) VALUES (?1, ?2)",
        params![filename, processed],
    )?;
    let id = transaction.last_insert_rowid();
    transaction.commit()?;
    debug!(source_file.id = id, filename, processed = %processed, "source file recorded");
    Ok(id)
}

/// Returns all source file records, oldest first. Records with equal timestamps are ordered by
/// id.
pub fn select_all_from_source_files(
    connector: &mut StoreConnector,
) -> RepositoryResult<Vec<SourceFileRecord>> {
    let transaction = connector.transaction()?;
    let rows = {
        let mut statement = transaction.prepare_cached(
            "SELECT id, filename, processed FROM source_files ORDER BY processed, id",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        rows
    };
    transaction.commit()?;

    rows.into_iter()
        .map(|(id, filename, processed)| -> RepositoryResult<SourceFileRecord> {
            let processed = NaiveDateTime::parse_from_str(&processed, TIMESTAMP_FORMAT)?;
            Ok(SourceFileRecord::new(id, filename, processed))
        })
        .collect()
}

/// Inserts every row of `dataset` into `processed_data1`, tagged with the source file record
/// chosen by `binding`. Returns the number of inserted rows.
///
/// The rows are stored all or nothing. Nothing is inserted when no matching source file record
/// exists.
pub fn insert_rows_into_processed_data(
    connector: &mut StoreConnector,
    dataset: &DataFrame,
    filename: &str,
    binding: SourceFileBinding,
) -> RepositoryResult<usize> {
    let columns = PROCESSED_COLUMNS
        .iter()
        .map(|&name| {
            dataset
                .column(name)
                .map_err(|_| RepositoryError::MissingColumn(name.to_string()))
        })
        .collect::<RepositoryResult<Vec<&Column>>>()?;

    let records = select_all_from_source_files(connector)?;
    let source_file = match binding {
        SourceFileBinding::Earliest => records.first(),
        SourceFileBinding::Latest => records.iter().rev().find(|r| r.filename() == filename),
    };
    let Some(source_file) = source_file.map(SourceFileRecord::id) else {
        warn!(filename, ?binding, "no source file record found, rows were not stored");
        return Ok(0);
    };

    let transaction = connector.transaction()?;
    let mut inserted = 0;
    {
        let mut statement = transaction.prepare_cached(
            "INSERT INTO processed_data1 \
             (genres, title_movie, production_countries, Release_year, Runtime, tagline, source_file) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in 0..dataset.height() {
            let cells = columns
                .iter()
                .map(|column| column.get(row).map(SqlCell))
                .collect::<PolarsResult<Vec<_>>>()?;
            let mut values: Vec<&dyn ToSql> = cells.iter().map(|cell| cell as &dyn ToSql).collect();
            values.push(&source_file);
            inserted += statement.execute(values.as_slice())?;
        }
    }
    transaction.commit()?;

    info!(rows = inserted, source_file.id = source_file, filename, "processed rows stored");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::{
        insert_into_source_files, insert_into_source_files_at, insert_rows_into_processed_data,
        select_all_from_source_files,
    };
    use crate::repository::{RepositoryError, SourceFileBinding, StoreConnector};
    use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
    use polars::prelude::{df, DataFrame};

    fn store() -> StoreConnector {
        StoreConnector::open_in_memory().expect("Test setup: unable to open store")
    }

    fn timestamp(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 11, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("Test setup: invalid timestamp")
    }

    fn movies() -> DataFrame {
        df!(
            "genres" => ["Drama", "Action"],
            "title_movie" => ["Up", "Avatar"],
            "production_countries" => ["US", "US"],
            "Release_year" => [2009i64, 2009],
            "Runtime" => [96.0, 162.5],
            "tagline" => [Some("Don't panic'); DROP TABLE source_files; --"), None],
        ).expect("Test setup: invalid frame")
    }

    fn stored_rows(connector: &StoreConnector) -> Vec<(String, Option<String>, i64)> {
        let mut statement = connector
            .connection()
            .prepare("SELECT title_movie, tagline, source_file FROM processed_data1 ORDER BY id")
            .expect("Unable to prepare select");
        let rows = statement
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?, row.get::<_, i64>(2)?))
            })
            .expect("Unable to query stored rows")
            .collect::<Result<_, _>>()
            .expect("Unable to read stored rows");
        rows
    }

    #[test_log::test]
    fn inserted_file_is_listed_with_insertion_time() {
        let mut connector = store();
        let before = Local::now().naive_local().with_nanosecond(0).expect("invalid timestamp");
        let id = insert_into_source_files(&mut connector, "movies.csv").expect("Expected insert to succeed");
        let after = Local::now().naive_local();

        let records = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        assert_eq!(records.len(), 1, "Unexpected records: {:?}", records);
        let record = &records[0];
        assert_eq!(record.id(), id, "Unexpected id");
        assert_eq!(record.filename(), "movies.csv", "Unexpected filename");
        assert!(before <= record.processed() && record.processed() <= after,
                "Expected timestamp between {} and {}: {}", before, after, record.processed());
    }

    #[test]
    fn repeated_selects_are_identical() {
        let mut connector = store();
        insert_into_source_files_at(&mut connector, "a.csv", timestamp(15, 22))
            .expect("Test setup: insert failed");
        insert_into_source_files_at(&mut connector, "b.txt", timestamp(14, 10))
            .expect("Test setup: insert failed");

        let first = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        let second = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        assert_eq!(first, second, "Expected identical listings");
    }

    #[test]
    fn records_are_ordered_by_timestamp() {
        let mut connector = store();
        insert_into_source_files_at(&mut connector, "late.csv", timestamp(15, 22))
            .expect("Test setup: insert failed");
        insert_into_source_files_at(&mut connector, "early.csv", timestamp(14, 10))
            .expect("Test setup: insert failed");
        insert_into_source_files_at(&mut connector, "tie.csv", timestamp(14, 10))
            .expect("Test setup: insert failed");

        let filenames: Vec<String> = select_all_from_source_files(&mut connector)
            .expect("Expected select to succeed")
            .iter()
            .map(|record| record.filename().to_string())
            .collect();
        assert_eq!(filenames, ["early.csv", "tie.csv", "late.csv"], "Unexpected order");
    }

    #[test]
    fn duplicate_filenames_create_separate_records() {
        let mut connector = store();
        let first = insert_into_source_files(&mut connector, "movies.csv").expect("insert failed");
        let second = insert_into_source_files(&mut connector, "movies.csv").expect("insert failed");

        assert_ne!(first, second, "Expected distinct ids");
        let records = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        assert_eq!(records.len(), 2, "Expected duplicate records: {:?}", records);
    }

    #[test]
    fn rows_are_bound_to_latest_record_of_file() {
        let mut connector = store();
        insert_into_source_files_at(&mut connector, "other.csv", timestamp(1, 8))
            .expect("Test setup: insert failed");
        insert_into_source_files_at(&mut connector, "movies.csv", timestamp(2, 8))
            .expect("Test setup: insert failed");
        let latest = insert_into_source_files_at(&mut connector, "movies.csv", timestamp(3, 8))
            .expect("Test setup: insert failed");

        let inserted = insert_rows_into_processed_data(
            &mut connector, &movies(), "movies.csv", SourceFileBinding::Latest,
        ).expect("Expected rows to be stored");

        assert_eq!(inserted, 2, "Unexpected number of stored rows");
        let sources: Vec<i64> = stored_rows(&connector).iter().map(|row| row.2).collect();
        assert_eq!(sources, [latest, latest], "Expected rows bound to latest record");
    }

    #[test]
    fn rows_can_be_bound_to_earliest_record() {
        let mut connector = store();
        let earliest = insert_into_source_files_at(&mut connector, "other.csv", timestamp(1, 8))
            .expect("Test setup: insert failed");
        insert_into_source_files_at(&mut connector, "movies.csv", timestamp(2, 8))
            .expect("Test setup: insert failed");

        insert_rows_into_processed_data(
            &mut connector, &movies(), "movies.csv", SourceFileBinding::Earliest,
        ).expect("Expected rows to be stored");

        let sources: Vec<i64> = stored_rows(&connector).iter().map(|row| row.2).collect();
        assert_eq!(sources, [earliest, earliest], "Expected rows bound to earliest record");
    }

    #[test]
    fn values_are_stored_verbatim() {
        let mut connector = store();
        insert_into_source_files(&mut connector, "movies.csv").expect("Test setup: insert failed");
        insert_rows_into_processed_data(
            &mut connector, &movies(), "movies.csv", SourceFileBinding::default(),
        ).expect("Expected rows to be stored");

        let rows = stored_rows(&connector);
        assert_eq!(rows[0].1.as_deref(), Some("Don't panic'); DROP TABLE source_files; --"),
                   "Expected quoted text to be stored verbatim");
        assert_eq!(rows[1].1, None, "Expected missing value to be stored as NULL");
        let records = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        assert_eq!(records.len(), 1, "Expected source files to be intact");
    }

    #[test_log::test]
    fn rows_without_source_record_are_not_stored() {
        let mut connector = store();
        let inserted = insert_rows_into_processed_data(
            &mut connector, &movies(), "movies.csv", SourceFileBinding::Latest,
        ).expect("Expected missing source record to be tolerated");

        assert_eq!(inserted, 0, "Expected no rows to be stored");
        assert!(stored_rows(&connector).is_empty(), "Expected empty processed data");
    }

    #[test]
    fn missing_columns_are_rejected() {
        let mut connector = store();
        insert_into_source_files(&mut connector, "cars.csv").expect("Test setup: insert failed");
        let cars = df!(
            "name" => ["Golf"],
            "selling_price" => [5000i64],
        ).expect("Test setup: invalid frame");

        let result = insert_rows_into_processed_data(
            &mut connector, &cars, "cars.csv", SourceFileBinding::Latest,
        );
        assert!(matches!(result, Err(RepositoryError::MissingColumn(ref column)) if column == "genres"),
                "Expected missing column to be rejected: {:?}", result);
    }

    #[test]
    fn failed_row_insert_stores_nothing() {
        let mut connector = store();
        insert_into_source_files(&mut connector, "movies.csv").expect("Test setup: insert failed");
        connector
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_avatar BEFORE INSERT ON processed_data1 \
                 WHEN NEW.title_movie = 'Avatar' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .expect("Test setup: unable to create trigger");

        let result = insert_rows_into_processed_data(
            &mut connector, &movies(), "movies.csv", SourceFileBinding::Latest,
        );
        assert!(matches!(result, Err(RepositoryError::Sqlite(_))),
                "Expected rejected row to fail the insert: {:?}", result);
        assert!(!connector.in_transaction(), "Expected no transaction left open");
        assert!(stored_rows(&connector).is_empty(), "Expected earlier rows to be rolled back");

        let records = select_all_from_source_files(&mut connector).expect("Expected select to succeed");
        assert_eq!(records.len(), 1, "Expected source file record to be kept");
        assert!(stored_rows(&connector).is_empty(), "Expected no rows after a later transaction");
    }
}
