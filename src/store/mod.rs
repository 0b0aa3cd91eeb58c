//! The boundary to where tables are persisted. Every upload is a full
//! replacement: delete the table, create it with its schema, bulk
//! load all records, then wait for the load job to finish.

pub mod dir;
pub mod null;

use std::{thread::sleep, time::Duration};

use anyhow::{bail, Result};

use crate::{
    info,
    schema::{Record, Schema},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// There was no such table; not an error.
    Absent,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("invalid table name {0:?}")]
    InvalidTableName(String),
    #[error("IO error while {0}: {1:#}")]
    IOError(String, std::io::Error),
    #[error("JSON error while {0}: {1:#}")]
    JsonError(String, serde_json::Error),
}

/// A started bulk load.
pub trait LoadJob {
    fn running(&mut self) -> Result<bool, StoreError>;

    /// Only meaningful once `running` returned false. `None` or an
    /// empty list mean success.
    fn errors(&self) -> Option<Vec<String>>;
}

pub trait TableStore {
    /// Human readable description for log messages
    fn description(&self) -> String;

    fn delete_table(&mut self, name: &str) -> Result<DeleteOutcome, StoreError>;

    fn create_schema(&mut self, name: &str, schema: &Schema) -> Result<(), StoreError>;

    fn bulk_load(
        &mut self,
        name: &str,
        records: &[Record],
        schema: &Schema,
    ) -> Result<Box<dyn LoadJob>, StoreError>;
}

/// Start a bulk load and block until it is finished, polling every
/// `poll_interval`. There is no timeout. Errors reported by the job
/// are fatal.
pub fn load_and_wait(
    store: &mut dyn TableStore,
    name: &str,
    records: &[Record],
    schema: &Schema,
    poll_interval: Duration,
) -> Result<()> {
    let mut job = store.bulk_load(name, records, schema)?;
    while job.running()? {
        sleep(poll_interval);
        info!("waiting for load job of table {name:?}");
    }
    if let Some(errors) = job.errors() {
        if !errors.is_empty() {
            bail!(
                "loading {} records into table {name:?} failed: {}",
                records.len(),
                errors.join("; ")
            )
        }
    }
    Ok(())
}

/// Replace the contents of table `name` with `records`.
pub fn replace_table(
    store: &mut dyn TableStore,
    name: &str,
    schema: &Schema,
    records: &[Record],
    poll_interval: Duration,
) -> Result<()> {
    info!("updating table {name:?} in {}", store.description());
    match store.delete_table(name)? {
        DeleteOutcome::Deleted => info!("deleted previous table {name:?}"),
        DeleteOutcome::Absent => info!("table {name:?} did not exist yet"),
    }
    store.create_schema(name, schema)?;
    load_and_wait(store, name, records, schema, poll_interval)
}
