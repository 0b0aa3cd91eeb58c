//! Configuration of an export cycle, resolved once by the program and
//! passed into the tables and the store.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};

use crate::{
    artifact_layout::GaugePrefixes,
    config_file::LoadConfigFile,
    store::{dir::DirStore, null::NullStore, TableStore},
    utillib::home::{home_dir, path_resolve_home},
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StoreConfig {
    /// Do not store anything
    None,
    /// Store tables as files in a local directory
    Dir { path: PathBuf },
}

/// Unqualified names of the tables of an export cycle
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct TableNames {
    pub cpu: String,
    pub memory: String,
    pub stacked: String,
    pub metadata: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cpu: "ci_cpu_measurement_tedge_mapper".into(),
            memory: "ci_mem_measurement_tedge_mapper".into(),
            stacked: "ci_cpu_hist".into(),
            metadata: "ci_measurement_metadata".into(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Config {
    /// Where tables are uploaded to
    pub store: StoreConfig,

    /// The project and dataset that table names are qualified with,
    /// `<project>.<dataset>.<table>`
    pub project: String,
    pub dataset: String,

    /// Name of the environment variable holding the credentials for
    /// the store, if it needs any. Only the program reads it.
    pub credentials_env_var: Option<String>,

    /// Append `_test` to all table names
    pub test_mode: bool,

    /// How many of the most recent runs the stacked CPU table compares
    pub history: usize,

    /// How often to check whether a load job has finished
    pub poll_interval_ms: u64,

    /// Artifact file keys to collectd gauge prefixes, in addition to
    /// (or overriding) the built-in ones
    pub gauge_prefixes: BTreeMap<String, String>,

    /// Runner name prefix of the metadata files, if the downloader
    /// wrote them with one
    pub metadata_prefix: Option<String>,

    pub tables: TableNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::None,
            project: "thin-edge-statistics".into(),
            dataset: "ThinEdgeDataSet".into(),
            credentials_env_var: None,
            test_mode: false,
            history: 10,
            poll_interval_ms: 500,
            gauge_prefixes: BTreeMap::new(),
            metadata_prefix: None,
            tables: TableNames::default(),
        }
    }
}

impl LoadConfigFile for Config {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        let home = home_dir()?;
        Ok(Some(home.join(".run-statistics")))
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn gauge_prefixes(&self) -> GaugePrefixes {
        GaugePrefixes::with_extra(&self.gauge_prefixes)
    }

    /// Table name as stored: `<project>.<dataset>.<name>[_test]`
    pub fn qualified_table_name(&self, name: &str) -> String {
        let Self {
            project,
            dataset,
            test_mode,
            ..
        } = self;
        if *test_mode {
            format!("{project}.{dataset}.{name}_test")
        } else {
            format!("{project}.{dataset}.{name}")
        }
    }

    /// Look up the credentials, if configured. Errors if the variable
    /// is configured but missing.
    pub fn credentials(&self) -> Result<Option<String>> {
        if let Some(var) = &self.credentials_env_var {
            let val = std::env::var(var)
                .map_err(|e| anyhow!("credentials env variable {var:?}: {e}"))?;
            Ok(Some(val))
        } else {
            Ok(None)
        }
    }

    pub fn open_store(&self) -> Result<Box<dyn TableStore>> {
        match &self.store {
            StoreConfig::None => Ok(Box::new(NullStore)),
            StoreConfig::Dir { path } => {
                let path = path_resolve_home(path)?;
                Ok(Box::new(DirStore::open(path)?))
            }
        }
    }
}
