use crate::repository::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Savepoint};
use std::path::PathBuf;
use tracing::{debug, info};

const SQLITE_SCHEME: &str = "sqlite://";
const MEMORY: &str = ":memory:";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS source_files (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        filename  TEXT NOT NULL,
        processed TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS processed_data1 (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        genres               TEXT,
        title_movie          TEXT,
        production_countries TEXT,
        Release_year         INTEGER,
        Runtime              REAL,
        tagline              TEXT,
        source_file          INTEGER REFERENCES source_files(id)
    );
"#;

/// Where the store lives; `None` is an in-memory database.
fn parse_location(url: &str) -> RepositoryResult<Option<PathBuf>> {
    let unsupported = || RepositoryError::UnsupportedUrl(url.to_string());
    let path = match url.strip_prefix(SQLITE_SCHEME) {
        Some("") => return Ok(None),
        Some(rest) => rest.strip_prefix('/').ok_or_else(unsupported)?,
        None if url.contains("://") => return Err(unsupported()),
        None => url,
    };
    match path {
        "" => Err(unsupported()),
        MEMORY => Ok(None),
        path => Ok(Some(PathBuf::from(path))),
    }
}

/// A connection to the store.
///
/// Work is grouped with [`transaction`](Self::transaction), which hands out a savepoint that
/// rolls back unless it is committed. Savepoints nest, so an operation inside a caller's open
/// transaction only releases its own work.
pub struct StoreConnector {
    connection: Connection,
}

impl StoreConnector {
    /// Opens the store identified by `url` and creates the schema if it is missing.
    ///
    /// Accepted forms are `sqlite:///<path>`, `sqlite://` or `sqlite:///:memory:` for an
    /// in-memory store, and a bare file path.
    pub fn open(url: &str) -> RepositoryResult<Self> {
        let connection = match parse_location(url)? {
            None => Connection::open_in_memory()?,
            Some(path) => Connection::open(path)?,
        };
        let connector = Self::with_connection(connection)?;
        info!(url, "connected to store");
        Ok(connector)
    }

    pub fn open_in_memory() -> RepositoryResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> RepositoryResult<Self> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self { connection })
    }

    pub fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }

    /// Starts a unit of work. Dropping the returned savepoint without calling `commit` rolls
    /// the work back.
    pub fn transaction(&mut self) -> RepositoryResult<Savepoint<'_>> {
        let savepoint = self.connection.savepoint()?;
        debug!("transaction started");
        Ok(savepoint)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn close(self) -> RepositoryResult<()> {
        self.connection.close().map_err(|(_, err)| RepositoryError::Sqlite(err))?;
        info!("store connection closed");
        Ok(())
    }
}
