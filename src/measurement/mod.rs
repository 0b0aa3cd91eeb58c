//! The tables produced from a batch of runs, and what all of them can
//! do: export, render, and replace their remote copy.

pub mod metadata;
pub mod sample_history;
pub mod stacked;

use std::io::Write;

use anyhow::Result;

use crate::{
    config::Config,
    info,
    output::terminal_table::{write_export, TerminalTableOpts},
    schema::{Export, Record, Schema},
    store::{replace_table, DeleteOutcome, TableStore},
};

pub trait Measurement {
    /// Unqualified name, see `Config::qualified_table_name`
    fn table_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// One record per row, in row order
    fn records(&self) -> Vec<Record>;

    fn export(&self) -> Export {
        Export {
            schema: self.schema(),
            records: self.records(),
        }
    }

    fn render(&self, opts: TerminalTableOpts, out: &mut dyn Write, is_terminal: bool) -> Result<()> {
        write_export(self.table_name(), &self.export(), opts, out, is_terminal)?;
        Ok(())
    }

    fn delete_remote(&self, store: &mut dyn TableStore, config: &Config) -> Result<DeleteOutcome> {
        let name = config.qualified_table_name(self.table_name());
        let outcome = store.delete_table(&name)?;
        match outcome {
            DeleteOutcome::Deleted => info!("deleted table {name:?}"),
            DeleteOutcome::Absent => info!("table {name:?} was not there"),
        }
        Ok(outcome)
    }

    /// Replace the remote table with our rows.
    fn update_remote(&self, store: &mut dyn TableStore, config: &Config) -> Result<()> {
        let name = config.qualified_table_name(self.table_name());
        let Export { schema, records } = self.export();
        replace_table(store, &name, &schema, &records, config.poll_interval())
    }
}
