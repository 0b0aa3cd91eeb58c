//! Reading the samples of one run from whichever raw source format
//! is available, and writing them into the run's block of rows.
//!
//! Sources are tried in this order:
//!
//! 1. the primary per-process dump (`<artifact>.out`, one
//!    `/proc/<pid>/stat[m]` snapshot per line)
//! 2. collectd exports in the `analytics` folder
//! 3. collectd exports in the legacy folder
//!
//! If none exists, the whole run is zero-filled. In every case the
//! run ends up with exactly `data_length` rows, see [`SampleSink`].

pub mod collectd;
pub mod cpu;
pub mod memory;
pub mod primary_dump;

use std::path::PathBuf;

use anyhow::Result;

use crate::{
    artifact_layout::{collectd_files, ArtifactLayout, CollectdLayout},
    info,
    row_table::{RowTable, RowTableError},
    run_folder::RunFolder,
    warn,
};

/// Number of leading columns every sample table has: `id, mid, sample`
pub const KEY_COLUMNS: usize = 3;

/// What distinguishes the sample kinds (CPU, memory) when reading raw
/// sources.
pub trait SampleKind {
    /// Name of the kind for log messages
    const KIND_NAME: &'static str;

    /// Names of the value columns, after `id, mid, sample`
    const FIELDS: &'static [&'static str];

    /// The counters that collectd exports, one file per counter. Each
    /// must be one of `FIELDS`; fields not listed here stay zero.
    const COLLECTD_COUNTERS: &'static [&'static str];

    /// Number of whitespace separated fields of a valid line in the
    /// primary dump
    const PRIMARY_LINE_WIDTH: usize;

    /// Parse one line of the primary dump. `None` means the line is
    /// not a snapshot of the process in question and is skipped;
    /// errors are only for lines that pass that check but carry
    /// invalid numbers.
    fn parse_primary_line(entries: &[&str], process_name: &str) -> Result<Option<Vec<i64>>>;

    /// The collectd counter file whose existence decides that the
    /// collectd format was used for a run
    fn collectd_probe_counter() -> &'static str {
        Self::COLLECTD_COUNTERS[0]
    }

    fn num_cols() -> usize {
        KEY_COLUMNS + Self::FIELDS.len()
    }
}

pub(crate) fn int(v: usize) -> i64 {
    i64::try_from(v).expect("row and sample numbers are bounded by the array size")
}

/// Writes the samples of a single run into its block of rows,
/// `mid * data_length ..`, dropping samples past `data_length` and
/// zero-filling the rest on `finish`.
pub struct SampleSink<'t> {
    table: &'t mut RowTable,
    mid: usize,
    data_length: usize,
    sample: usize,
    num_dropped: usize,
    row: Vec<i64>,
}

impl<'t> SampleSink<'t> {
    pub fn new(table: &'t mut RowTable, mid: usize, data_length: usize) -> Self {
        let num_cols = table.num_cols();
        Self {
            table,
            mid,
            data_length,
            sample: 0,
            num_dropped: 0,
            row: Vec::with_capacity(num_cols),
        }
    }

    fn write(&mut self, fields: Option<&[i64]>) -> Result<(), RowTableError> {
        let row_id = self.mid * self.data_length + self.sample;
        let num_fields = self.table.num_cols() - KEY_COLUMNS;
        self.row.clear();
        self.row.push(int(row_id));
        self.row.push(int(self.mid));
        self.row.push(int(self.sample));
        if let Some(fields) = fields {
            self.row.extend_from_slice(fields);
        } else {
            self.row.extend(std::iter::repeat(0).take(num_fields));
        }
        self.table.insert(row_id, &self.row)?;
        self.sample += 1;
        Ok(())
    }

    /// Returns false if the sample was dropped because the run
    /// already has `data_length` samples.
    pub fn push(&mut self, fields: &[i64]) -> Result<bool, RowTableError> {
        if self.sample >= self.data_length {
            // Happens e.g. when the recorder gets one more tick in
            // before the process is torn down
            warn!("omitted a sample from mid {}", self.mid);
            self.num_dropped += 1;
            return Ok(false);
        }
        self.write(Some(fields))?;
        Ok(true)
    }

    /// Zero-fill the remaining samples of the run. Returns the number
    /// of samples that came from the source (after dropping excess
    /// ones).
    pub fn finish(mut self) -> Result<usize, RowTableError> {
        let num_read = self.sample;
        while self.sample < self.data_length {
            self.write(None)?;
        }
        if num_read < self.data_length {
            info!(
                "mid {}: filled {} missing samples with zeros",
                self.mid,
                self.data_length - num_read
            );
        }
        Ok(num_read)
    }

    pub fn num_dropped(&self) -> usize {
        self.num_dropped
    }
}

/// Which raw source a run was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSource {
    PrimaryDump(PathBuf),
    Collectd {
        layout: CollectdLayout,
        files: Vec<PathBuf>,
    },
    Missing,
}

/// What to read for each run, independent of the run itself.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec<'a> {
    pub layout: &'a ArtifactLayout,
    pub test_name: &'a str,
    pub artifact_file_key: &'a str,
    pub gauge_prefix: &'a str,
    pub process_name: &'a str,
}

impl<'a> SourceSpec<'a> {
    /// Decide on the source for `folder`, by checking for files in
    /// priority order.
    pub fn resolve<K: SampleKind>(&self, folder: &RunFolder) -> RunSource {
        let primary = self
            .layout
            .primary_dump(folder, self.test_name, self.artifact_file_key);
        if primary.exists() {
            return RunSource::PrimaryDump(primary);
        }
        for layout in CollectdLayout::ALL {
            let dir = self.layout.collectd_dir(folder, self.test_name, layout);
            let probe = self.layout.collectd_file(
                folder,
                self.test_name,
                layout,
                self.gauge_prefix,
                K::collectd_probe_counter(),
            );
            if probe.exists() {
                return RunSource::Collectd {
                    layout,
                    files: collectd_files(&dir, self.gauge_prefix, K::COLLECTD_COUNTERS),
                };
            }
        }
        RunSource::Missing
    }
}

/// Read the samples of one run into `table`, at the row block of
/// `mid`. Returns the source that was used.
pub fn extract_run<K: SampleKind>(
    table: &mut RowTable,
    spec: &SourceSpec,
    folder: &RunFolder,
    mid: usize,
    data_length: usize,
) -> Result<RunSource> {
    let source = spec.resolve::<K>(folder);
    let mut sink = SampleSink::new(table, mid, data_length);
    match &source {
        RunSource::PrimaryDump(path) => {
            info!("{} mid {mid}: reading {path:?}", K::KIND_NAME);
            primary_dump::read_primary_dump::<K>(path, spec.process_name, &mut sink)?;
        }
        RunSource::Collectd { layout, files } => {
            info!(
                "{} mid {mid}: reading collectd exports ({layout:?}) from {:?}",
                K::KIND_NAME,
                files.first()
            );
            collectd::read_collectd_counters::<K>(files, &mut sink)?;
        }
        RunSource::Missing => {
            info!(
                "{} history for run {} does not exist, filling with zeros",
                K::KIND_NAME,
                folder.index()
            );
        }
    }
    sink.finish()?;
    Ok(source)
}
