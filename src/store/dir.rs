//! A table store in a local directory: per table, the schema as
//! `<name>.schema.json` and the records as `<name>.ndjson`.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;

use super::{DeleteOutcome, LoadJob, StoreError, TableStore};
use crate::schema::{FieldType, Record, Schema};

#[derive(Debug)]
pub struct DirStore {
    base_dir: PathBuf,
}

struct FinishedJob {
    errors: Vec<String>,
}

impl LoadJob for FinishedJob {
    fn running(&mut self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn errors(&self) -> Option<Vec<String>> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.clone())
        }
    }
}

fn io_error(what: String) -> impl FnOnce(std::io::Error) -> StoreError {
    move |e| StoreError::IOError(what, e)
}

/// Check `records` against `schema`, returning one message per
/// problem (at most `max` of them).
pub fn validate_records(records: &[Record], schema: &Schema, max: usize) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if errors.len() >= max {
            break;
        }
        if record.len() != schema.len() {
            errors.push(format!(
                "record {i} has {} fields, schema has {}",
                record.len(),
                schema.len()
            ));
            continue;
        }
        for field in schema.fields() {
            let ok = match (record.get(&field.name), field.field_type) {
                (Some(Value::Number(n)), FieldType::Int64) => n.is_i64(),
                (Some(Value::String(_)), FieldType::String) => true,
                _ => false,
            };
            if !ok {
                errors.push(format!(
                    "record {i}: field {:?} is missing or not of type {}",
                    field.name, field.field_type
                ));
                break;
            }
        }
    }
    errors
}

impl DirStore {
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)
            .map_err(io_error(format!("creating store directory {base_dir:?}")))?;
        Ok(Self { base_dir })
    }

    fn check_name<'n>(&self, name: &'n str) -> Result<&'n str, StoreError> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\0')
            || name.contains('\n')
        {
            return Err(StoreError::InvalidTableName(name.to_owned()));
        }
        Ok(name)
    }

    pub fn schema_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let name = self.check_name(name)?;
        Ok(self.base_dir.join(format!("{name}.schema.json")))
    }

    pub fn records_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let name = self.check_name(name)?;
        Ok(self.base_dir.join(format!("{name}.ndjson")))
    }

    /// Read back the records of a table (mainly for inspection and
    /// tests)
    pub fn read_records(&self, name: &str) -> Result<Vec<Record>, StoreError> {
        let path = self.records_path(name)?;
        let s = std::fs::read_to_string(&path)
            .map_err(io_error(format!("reading records file {path:?}")))?;
        s.lines()
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| StoreError::JsonError(format!("decoding record from {path:?}"), e))
            })
            .collect()
    }

    pub fn read_schema(&self, name: &str) -> Result<Schema, StoreError> {
        let path = self.schema_path(name)?;
        let s = std::fs::read_to_string(&path)
            .map_err(io_error(format!("reading schema file {path:?}")))?;
        serde_json::from_str(&s)
            .map_err(|e| StoreError::JsonError(format!("decoding schema from {path:?}"), e))
    }
}

fn remove_if_exists(path: &Path) -> Result<bool, StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::IOError(format!("removing {path:?}"), e)),
    }
}

/// Write via a temporary file and rename, so that readers never see
/// a partial file.
fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let file = File::create(&tmp).map_err(io_error(format!("creating {tmp:?}")))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .map_err(io_error(format!("writing {tmp:?}")))?;
    std::fs::rename(&tmp, path).map_err(io_error(format!("renaming {tmp:?} to {path:?}")))
}

impl TableStore for DirStore {
    fn description(&self) -> String {
        format!("directory store {:?}", self.base_dir)
    }

    fn delete_table(&mut self, name: &str) -> Result<DeleteOutcome, StoreError> {
        let had_schema = remove_if_exists(&self.schema_path(name)?)?;
        let had_records = remove_if_exists(&self.records_path(name)?)?;
        if had_schema || had_records {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Absent)
        }
    }

    fn create_schema(&mut self, name: &str, schema: &Schema) -> Result<(), StoreError> {
        let path = self.schema_path(name)?;
        let s = serde_json::to_string_pretty(schema)
            .map_err(|e| StoreError::JsonError(format!("encoding schema for {name:?}"), e))?;
        write_file(&path, |out| {
            out.write_all(s.as_bytes())?;
            out.write_all(b"\n")
        })
    }

    fn bulk_load(
        &mut self,
        name: &str,
        records: &[Record],
        schema: &Schema,
    ) -> Result<Box<dyn LoadJob>, StoreError> {
        let schema_path = self.schema_path(name)?;
        if !schema_path.exists() {
            return Ok(Box::new(FinishedJob {
                errors: vec![format!("table {name:?} has no schema, create it first")],
            }));
        }
        let errors = validate_records(records, schema, 10);
        if !errors.is_empty() {
            return Ok(Box::new(FinishedJob { errors }));
        }
        let path = self.records_path(name)?;
        write_file(&path, |out| {
            for record in records {
                serde_json::to_writer(&mut *out, record)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        })?;
        Ok(Box::new(FinishedJob { errors: Vec::new() }))
    }
}
