//! Per-sample history tables of one process, one block of
//! `data_length` rows per run.

use std::marker::PhantomData;

use anyhow::{anyhow, bail, Context, Result};

use super::Measurement;
use crate::{
    artifact_layout::{ArtifactLayout, GaugePrefixes},
    info,
    row_table::RowTable,
    run_folder::RunFolder,
    schema::{int_records, Record, Schema},
    sources::{
        cpu::Cpu, extract_run, memory::Memory, RunSource, SampleKind, SampleSink, SourceSpec,
        KEY_COLUMNS,
    },
};

pub struct SampleHistory<K: SampleKind> {
    name: String,
    data_amount: usize,
    data_length: usize,
    table: RowTable,
    /// Per processed run, in `mid` order
    sources: Vec<RunSource>,
    kind: PhantomData<K>,
}

pub type CpuHistory = SampleHistory<Cpu>;
pub type MemoryHistory = SampleHistory<Memory>;

impl<K: SampleKind> SampleHistory<K> {
    /// Room for `data_amount` runs of `data_length` samples each.
    pub fn new(name: impl Into<String>, data_amount: usize, data_length: usize) -> Result<Self> {
        let name = name.into();
        let Some(num_rows) = data_amount.checked_mul(data_length) else {
            bail!(
                "table {name:?}: {data_amount} runs of {data_length} samples \
                 do not fit into memory"
            )
        };
        Ok(Self {
            name,
            data_amount,
            data_length,
            table: RowTable::new(num_rows, K::num_cols()),
            sources: Vec::new(),
            kind: PhantomData,
        })
    }

    pub fn data_amount(&self) -> usize {
        self.data_amount
    }

    pub fn data_length(&self) -> usize {
        self.data_length
    }

    pub fn table(&self) -> &RowTable {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn table_mut_for_tests(&mut self) -> &mut RowTable {
        &mut self.table
    }

    /// The source each processed run was read from
    pub fn sources(&self) -> &[RunSource] {
        &self.sources
    }

    /// Column index of value field `name`
    pub fn field_column(name: &str) -> Option<usize> {
        K::FIELDS
            .iter()
            .position(|field| *field == name)
            .map(|i| KEY_COLUMNS + i)
    }

    /// Read all `folders`, the run at position `mid` going into row
    /// block `mid`. Meant to be called once per table.
    pub fn postprocess(
        &mut self,
        layout: &ArtifactLayout,
        gauge_prefixes: &GaugePrefixes,
        folders: &[RunFolder],
        test_name: &str,
        artifact_file_key: &str,
        process_name: &str,
    ) -> Result<()> {
        if folders.len() > self.data_amount {
            bail!(
                "table {:?} too small: room for {} runs, got {} folders",
                self.name,
                self.data_amount,
                folders.len()
            )
        }
        let gauge_prefix = gauge_prefixes.gauge_prefix(artifact_file_key)?;
        let spec = SourceSpec {
            layout,
            test_name,
            artifact_file_key,
            gauge_prefix,
            process_name,
        };
        info!(
            "{}: postprocessing {} runs into table {:?}",
            K::KIND_NAME,
            folders.len(),
            self.name
        );
        self.sources.clear();
        for (mid, folder) in folders.iter().enumerate() {
            let source = extract_run::<K>(&mut self.table, &spec, folder, mid, self.data_length)
                .with_context(|| anyhow!("reading run {} ({folder})", folder.index()))?;
            self.sources.push(source);
        }
        // Blocks without a run still get their keys
        for mid in folders.len()..self.data_amount {
            SampleSink::new(&mut self.table, mid, self.data_length).finish()?;
        }
        Ok(())
    }
}

impl<K: SampleKind> Measurement for SampleHistory<K> {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Schema {
        Schema::int64(["id", "mid", "sample"].iter().chain(K::FIELDS))
    }

    fn records(&self) -> Vec<Record> {
        int_records(
            &self.schema(),
            self.table.rows().map(|row| row.into_iter().copied()),
        )
    }
}
