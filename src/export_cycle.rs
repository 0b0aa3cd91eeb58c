//! One export cycle: build all tables for a batch of run folders,
//! then show them, write them to a workbook, or upload them.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::{
    artifact_layout::ArtifactLayout,
    config::Config,
    info,
    measurement::{
        metadata::MeasurementMetadata,
        sample_history::{CpuHistory, MemoryHistory},
        stacked::CpuHistoryStacked,
        Measurement,
    },
    output::{excel::excel_file_write, terminal_table::TerminalTableOpts},
    run_folder::RunFolder,
    store::TableStore,
};

/// What to read from each run folder.
#[derive(Debug, Clone)]
pub struct CycleParams {
    pub lake: PathBuf,
    pub test_name: String,
    /// Artifact file key of the CPU dump, e.g. `stat_mapper_stdout`
    pub cpu_artifact_key: String,
    /// Artifact file key of the memory dump, e.g. `statm_mapper_stdout`
    pub memory_artifact_key: String,
    /// As it appears in `/proc/<pid>/stat`
    pub process_name: String,
    /// Samples per run
    pub data_length: usize,
    /// Room for this many runs; the number of folders if not given
    pub data_amount: Option<usize>,
}

pub struct ExportCycle {
    folders: Vec<RunFolder>,
    pub cpu: CpuHistory,
    pub memory: MemoryHistory,
    pub stacked: CpuHistoryStacked,
    pub metadata: MeasurementMetadata,
}

impl ExportCycle {
    /// Read everything for `folders`, in the given order.
    pub fn postprocess(config: &Config, params: &CycleParams, folders: Vec<RunFolder>) -> Result<Self> {
        let CycleParams {
            lake,
            test_name,
            cpu_artifact_key,
            memory_artifact_key,
            process_name,
            data_length,
            data_amount,
        } = params;
        let data_length = *data_length;
        let data_amount = data_amount.unwrap_or(folders.len());
        let layout = ArtifactLayout {
            lake: lake.clone(),
            metadata_prefix: config.metadata_prefix.clone(),
        };
        let gauge_prefixes = config.gauge_prefixes();
        let names = &config.tables;

        let mut cpu = CpuHistory::new(&names.cpu, data_amount, data_length)?;
        cpu.postprocess(
            &layout,
            &gauge_prefixes,
            &folders,
            test_name,
            cpu_artifact_key,
            process_name,
        )?;

        let mut memory = MemoryHistory::new(&names.memory, data_amount, data_length)?;
        memory.postprocess(
            &layout,
            &gauge_prefixes,
            &folders,
            test_name,
            memory_artifact_key,
            process_name,
        )?;

        let mut stacked = CpuHistoryStacked::new(&names.stacked, config.history, data_length);
        stacked.build(&folders, &cpu)?;

        let mut metadata = MeasurementMetadata::new(&names.metadata, data_amount);
        metadata.postprocess(&layout, &folders)?;

        Ok(Self {
            folders,
            cpu,
            memory,
            stacked,
            metadata,
        })
    }

    pub fn folders(&self) -> &[RunFolder] {
        &self.folders
    }

    pub fn measurements(&self) -> [&dyn Measurement; 4] {
        [&self.metadata, &self.cpu, &self.memory, &self.stacked]
    }

    pub fn render(&self, opts: &TerminalTableOpts, out: &mut dyn Write, is_terminal: bool) -> Result<()> {
        for measurement in self.measurements() {
            measurement.render(opts.clone(), out, is_terminal)?;
        }
        Ok(())
    }

    pub fn write_excel(&self, path: &Path) -> Result<()> {
        let exports: Vec<_> = self
            .measurements()
            .into_iter()
            .map(|m| (m.table_name(), m.export()))
            .collect();
        excel_file_write(exports.iter().map(|(name, export)| (*name, export)), path)?;
        info!("wrote {path:?}");
        Ok(())
    }

    /// Replace all tables in `store`.
    pub fn upload(&self, store: &mut dyn TableStore, config: &Config) -> Result<()> {
        for measurement in self.measurements() {
            measurement.update_remote(store, config)?;
        }
        Ok(())
    }
}

/// Delete the tables named in `config` from `store`, without reading
/// any runs.
pub fn delete_tables(store: &mut dyn TableStore, config: &Config) -> Result<()> {
    let names = &config.tables;
    let measurements: [&dyn Measurement; 4] = [
        &MeasurementMetadata::new(&names.metadata, 0),
        &CpuHistory::new(&names.cpu, 0, 0)?,
        &MemoryHistory::new(&names.memory, 0, 0)?,
        &CpuHistoryStacked::new(&names.stacked, 0, 0),
    ];
    for measurement in measurements {
        measurement.delete_remote(store, config)?;
    }
    Ok(())
}
