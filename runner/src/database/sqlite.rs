use super::{ConnectionError, Ingestion};
use benchwatch_analysis::{BenchmarkRecord, RunRecord};
use rusqlite::{params, DropBehavior};
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct Connection {
    connection: rusqlite::Connection,
}

impl From<rusqlite::Error> for ConnectionError {
    fn from(error: rusqlite::Error) -> Self {
        ConnectionError::SQLite(error)
    }
}

impl Connection {
    /// open (or create) the database file, the schema is applied by `init`
    pub fn load(path: &Path) -> Result<Self, ConnectionError> {
        let connection = rusqlite::Connection::open(path)?;
        debug!(path = ?path, "Opened SQLite database");

        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, ConnectionError> {
        Ok(Self {
            connection: rusqlite::Connection::open_in_memory()?,
        })
    }

    pub fn init(&mut self) -> Result<(), ConnectionError> {
        let mut counter = 1;

        for table in SQL_SCHEMA {
            match self.connection.execute(table, []) {
                Ok(_) => debug!("Applied SQL schema ({counter}/{SQL_SCHEMA_NUMBER})"),
                Err(error) => {
                    error!(error = ?error, table = table, "Failed to apply SQL schema ({counter}/{SQL_SCHEMA_NUMBER}): {error}");

                    return Err(ConnectionError::SQLite(error));
                }
            };

            counter += 1;
        }

        Ok(())
    }

    /// Persist all measurements of one ingestion plus its run entry
    ///
    /// The run entry is written even without measurements. Returns the id of the run.
    pub fn store_ingestion(&mut self, ingestion: &Ingestion) -> Result<i64, ConnectionError> {
        let mut tx = self.connection.transaction()?;
        tx.set_drop_behavior(DropBehavior::Rollback);

        for measurement in ingestion.measurements {
            tx.prepare_cached(
                "insert into benchmarks
                 (commit_sha, branch, metric_category, metric_name, value)
                 values (?, ?, ?, ?, ?)",
            )?
            .execute(params![
                ingestion.commit_sha,
                ingestion.branch,
                ingestion.metric_category,
                measurement.name,
                measurement.value
            ])?;

            debug!(id = tx.last_insert_rowid(), name = %measurement.name, "Inserted benchmark");
        }

        tx.prepare_cached("insert into runs (commit_sha, branch) values (?, ?)")?
            .execute(params![ingestion.commit_sha, ingestion.branch])?;
        let run = tx.last_insert_rowid();

        tx.commit()?;

        info!(
            id = run,
            stored = ingestion.measurements.len(),
            "Created run"
        );

        Ok(run)
    }

    /// every benchmark row in insertion order
    pub fn load_benchmarks(&self) -> Result<Vec<BenchmarkRecord>, ConnectionError> {
        self.connection
            .prepare_cached(
                "select id, commit_sha, branch, metric_category, metric_name, value, timestamp
                 from benchmarks order by id",
            )?
            .query_map([], |row| {
                Ok(BenchmarkRecord {
                    id: row.get(0)?,
                    commit_sha: row.get(1)?,
                    branch: row.get(2)?,
                    metric_category: row.get(3)?,
                    metric_name: row.get(4)?,
                    value: row.get(5)?,
                    timestamp: row.get(6)?,
                })
            })?
            .try_fold(Vec::new(), |mut init, result| {
                init.push(result?);

                Ok::<Vec<BenchmarkRecord>, ConnectionError>(init)
            })
    }

    pub fn load_runs(&self) -> Result<Vec<RunRecord>, ConnectionError> {
        self.connection
            .prepare_cached("select id, commit_sha, branch, run_time from runs order by id")?
            .query_map([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    commit_sha: row.get(1)?,
                    branch: row.get(2)?,
                    run_time: row.get(3)?,
                })
            })?
            .try_fold(Vec::new(), |mut init, result| {
                init.push(result?);

                Ok::<Vec<RunRecord>, ConnectionError>(init)
            })
    }

    pub fn close(mut self) -> Result<(), ConnectionError> {
        let mut counter = 0;
        while let Err((connection, error)) = self.connection.close() {
            counter += 1;
            self.connection = connection;
            error!(error = ?error, "Failed to close SQLite connection: {error}, trying again {counter}/3");

            if counter == 3 {
                error!("Failed to close connection, giving up");

                return Err(ConnectionError::SQLite(error));
            }
        }

        debug!("Closed SQLite connection");

        Ok(())
    }
}

// Records are append only, there is no migration beyond creating missing tables
pub const SQL_SCHEMA: [&str; 2] = [
    "create table if not exists benchmarks (
    id integer primary key autoincrement,
    commit_sha text not null,
    branch text not null,
    metric_category text not null,
    metric_name text not null,
    value real not null,
    timestamp datetime default current_timestamp
);",
    "create table if not exists runs (
    id integer primary key autoincrement,
    commit_sha text not null,
    branch text not null,
    run_time datetime default current_timestamp
);",
];
pub const SQL_SCHEMA_NUMBER: usize = SQL_SCHEMA.len();
