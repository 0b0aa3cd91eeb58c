//! Where the files of an unpacked test run live below the lake
//! directory.
//!
//! ```text
//! <lake>/[<runner>_]system_test_<N>_metadata.json
//! <lake>/results_<N>_unpack/PySys/<test>/Output/linux/<artifact>.out
//! <lake>/results_<N>_unpack/PySys/analytics/<test>/Output/linux/<gauge>-<counter>.rrd.txt
//! <lake>/results_<N>_unpack/PySys/<test>/Output/linux/<gauge>-<counter>.rrd.txt  (legacy)
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::run_folder::RunFolder;

/// The artifact keys known without any configuration, and the
/// prefix of the collectd export files holding the same counters.
pub const DEFAULT_GAUGE_PREFIXES: &[(&str, &str)] = &[
    ("stat_mapper_stdout", "gauge-mapper-c8y"),
    ("stat_mosquitto_stdout", "gauge-mosquitto"),
    ("statm_mapper_stdout", "gauge-mapper-c8y"),
    ("statm_mosquitto_stdout", "gauge-mosquitto"),
];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown artifact file key {0:?}, no collectd gauge prefix is known for it")]
pub struct ArtifactKeyError(pub String);

/// Dispatch table from artifact file key (the primary dump's file
/// name without `.out`) to the collectd gauge prefix.
#[derive(Debug, Clone)]
pub struct GaugePrefixes(BTreeMap<String, String>);

impl Default for GaugePrefixes {
    fn default() -> Self {
        Self(
            DEFAULT_GAUGE_PREFIXES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl GaugePrefixes {
    /// The defaults, with `extra` added (overriding defaults with the
    /// same key).
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Self {
        let mut slf = Self::default();
        for (k, v) in extra {
            slf.0.insert(k.clone(), v.clone());
        }
        slf
    }

    pub fn gauge_prefix(&self, artifact_file_key: &str) -> Result<&str, ArtifactKeyError> {
        self.0
            .get(artifact_file_key)
            .map(String::as_str)
            .ok_or_else(|| ArtifactKeyError(artifact_file_key.to_owned()))
    }
}

/// The two places collectd exports have been stored in over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectdLayout {
    /// Below `PySys/analytics/`
    Analytics,
    /// Directly below `PySys/`, before tests were moved into folders
    Legacy,
}

impl CollectdLayout {
    /// In the order they are tried
    pub const ALL: [CollectdLayout; 2] = [CollectdLayout::Analytics, CollectdLayout::Legacy];
}

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub lake: PathBuf,
    /// Prefix of metadata files, as written by the artifact
    /// downloader when configured with a runner name
    pub metadata_prefix: Option<String>,
}

impl ArtifactLayout {
    pub fn new(lake: impl Into<PathBuf>) -> Self {
        Self {
            lake: lake.into(),
            metadata_prefix: None,
        }
    }

    pub fn run_dir(&self, folder: &RunFolder) -> PathBuf {
        self.lake.join(folder.name())
    }

    fn linux_output_dir(&self, folder: &RunFolder, test_name: &str, analytics: bool) -> PathBuf {
        let mut path = self.run_dir(folder).join("PySys");
        if analytics {
            path.push("analytics");
        }
        path.push(test_name);
        path.push("Output");
        path.push("linux");
        path
    }

    /// The primary per-process dump (`/proc/<pid>/stat` or
    /// `/proc/<pid>/statm` snapshots).
    pub fn primary_dump(&self, folder: &RunFolder, test_name: &str, artifact_file_key: &str) -> PathBuf {
        self.linux_output_dir(folder, test_name, false)
            .join(format!("{artifact_file_key}.out"))
    }

    pub fn collectd_dir(&self, folder: &RunFolder, test_name: &str, layout: CollectdLayout) -> PathBuf {
        self.linux_output_dir(folder, test_name, layout == CollectdLayout::Analytics)
    }

    /// `<gauge_prefix>-<counter>.rrd.txt` in the given layout
    pub fn collectd_file(
        &self,
        folder: &RunFolder,
        test_name: &str,
        layout: CollectdLayout,
        gauge_prefix: &str,
        counter: &str,
    ) -> PathBuf {
        self.collectd_dir(folder, test_name, layout)
            .join(collectd_file_name(gauge_prefix, counter))
    }

    pub fn metadata_file(&self, folder: &RunFolder) -> PathBuf {
        let index = folder.index();
        let name = if let Some(prefix) = &self.metadata_prefix {
            format!("{prefix}_system_test_{index}_metadata.json")
        } else {
            format!("system_test_{index}_metadata.json")
        };
        self.lake.join(name)
    }
}

pub fn collectd_file_name(gauge_prefix: &str, counter: &str) -> String {
    format!("{gauge_prefix}-{counter}.rrd.txt")
}

/// Paths of a set of counter files in `dir`, in the order of `counters`.
pub fn collectd_files(dir: &Path, gauge_prefix: &str, counters: &[&str]) -> Vec<PathBuf> {
    counters
        .iter()
        .map(|counter| dir.join(collectd_file_name(gauge_prefix, counter)))
        .collect()
}
