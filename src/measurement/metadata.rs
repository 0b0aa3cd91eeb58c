//! One row per run, from the run's workflow metadata as saved by the
//! artifact downloader.

use anyhow::{anyhow, bail, Context, Result};
use kstring::KString;
use serde_json::Value;

use super::Measurement;
use crate::{
    artifact_layout::ArtifactLayout,
    info,
    run_folder::RunFolder,
    schema::{FieldType, Record, Schema, SchemaField},
    sources::int,
};

/// The fields we use from a `system_test_<N>_metadata.json`
/// document; other fields are ignored.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RunMetadata {
    pub run_number: i64,
    pub updated_at: String,
    pub html_url: String,
    pub name: KString,
    pub head_branch: KString,
}

impl RunMetadata {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

pub struct MeasurementMetadata {
    name: String,
    data_amount: usize,
    runs: Vec<RunMetadata>,
}

impl MeasurementMetadata {
    pub fn new(name: impl Into<String>, data_amount: usize) -> Self {
        Self {
            name: name.into(),
            data_amount,
            runs: Vec::new(),
        }
    }

    pub fn runs(&self) -> &[RunMetadata] {
        &self.runs
    }

    /// Load the metadata of each of `folders`; a missing or invalid
    /// file is an error.
    pub fn postprocess(&mut self, layout: &ArtifactLayout, folders: &[RunFolder]) -> Result<()> {
        if folders.len() > self.data_amount {
            bail!(
                "table {:?} too small: room for {} runs, got {} folders",
                self.name,
                self.data_amount,
                folders.len()
            )
        }
        self.runs.clear();
        for folder in folders {
            let path = layout.metadata_file(folder);
            info!("reading metadata {path:?}");
            let s = std::fs::read_to_string(&path)
                .with_context(|| anyhow!("reading metadata file {path:?}"))?;
            let run = RunMetadata::from_json_str(&s)
                .with_context(|| anyhow!("decoding metadata file {path:?}"))?;
            self.runs.push(run);
        }
        Ok(())
    }
}

impl Measurement for MeasurementMetadata {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> Schema {
        let field = |name: &str, field_type| SchemaField {
            name: name.into(),
            field_type,
        };
        Schema(vec![
            field("id", FieldType::Int64),
            field("mid", FieldType::Int64),
            field("date", FieldType::String),
            field("url", FieldType::String),
            field("name", FieldType::String),
            field("branch", FieldType::String),
        ])
    }

    /// `id` is the position of the run in the batch, `mid` its run
    /// number.
    fn records(&self) -> Vec<Record> {
        self.runs
            .iter()
            .enumerate()
            .map(|(id, run)| {
                let mut record = Record::new();
                record.insert("id".into(), Value::from(int(id)));
                record.insert("mid".into(), Value::from(run.run_number));
                record.insert("date".into(), Value::from(run.updated_at.as_str()));
                record.insert("url".into(), Value::from(run.html_url.as_str()));
                record.insert("name".into(), Value::from(run.name.as_str()));
                record.insert("branch".into(), Value::from(run.head_branch.as_str()));
                record
            })
            .collect()
    }
}
