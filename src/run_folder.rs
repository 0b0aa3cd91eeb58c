//! Names of unpacked CI artifact folders, `results_<N>_unpack`, where
//! `N` is the run number of the CI workflow.

use std::{fmt::Display, path::Path, str::FromStr};

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::debug;

lazy_static! {
    static ref RUN_FOLDER: Regex = Regex::new(r"^results_(\d+)_unpack$").expect("valid regex");
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RunFolderError {
    #[error("cannot convert folder name {0:?} to a run index, expecting `results_<N>_unpack`")]
    InvalidName(String),
    #[error("run index in folder name {0:?} is out of range")]
    IndexOutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunFolder {
    /// Kept first for the derived ordering
    index: u64,
    name: String,
}

impl RunFolder {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RunFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for RunFolder {
    type Err = RunFolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RUN_FOLDER
            .captures(s)
            .ok_or_else(|| RunFolderError::InvalidName(s.to_owned()))?;
        let index = caps[1]
            .parse()
            .map_err(|_| RunFolderError::IndexOutOfRange(s.to_owned()))?;
        Ok(RunFolder {
            index,
            name: s.to_owned(),
        })
    }
}

/// Convert `results_N_unpack` into N
pub fn folder_name_to_index(folder_name: &str) -> Result<u64, RunFolderError> {
    Ok(folder_name.parse::<RunFolder>()?.index)
}

/// All directories in `lake` that are named like run folders,
/// ordered by their run index. Other entries are ignored.
pub fn list_run_folders(lake: &Path) -> Result<Vec<RunFolder>> {
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(lake).with_context(|| anyhow!("listing directory {lake:?}"))? {
        let entry = entry.with_context(|| anyhow!("listing directory {lake:?}"))?;
        let file_type = entry
            .file_type()
            .with_context(|| anyhow!("getting file type of {:?}", entry.path()))?;
        if !file_type.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!("ignoring non-unicode entry {file_name:?} in {lake:?}");
            continue;
        };
        match name.parse::<RunFolder>() {
            Ok(folder) => folders.push(folder),
            Err(_) => debug!("ignoring entry {name:?} in {lake:?}"),
        }
    }
    folders.sort();
    Ok(folders)
}

/// Parse folder names given by the user, keeping their order.
pub fn parse_run_folders<S: AsRef<str>>(names: &[S]) -> Result<Vec<RunFolder>, RunFolderError> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}

/// The last `n` of `folders` (all of them if there are fewer).
pub fn last_n(folders: &[RunFolder], n: usize) -> &[RunFolder] {
    &folders[folders.len().saturating_sub(n)..]
}
