//! Table schemas and records as handed to a table store.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "INT64")]
    Int64,
    #[serde(rename = "STRING")]
    String,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldType::Int64 => "INT64",
            FieldType::String => "STRING",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(pub Vec<SchemaField>);

impl Schema {
    pub fn int64<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| SchemaField {
                    name: name.as_ref().to_owned(),
                    field_type: FieldType::Int64,
                })
                .collect(),
        )
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|field| field.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row, field name to value. `serde_json::Map` keeps insertion
/// order only with the `preserve_order` feature, so consumers must not
/// rely on the order of the keys, only on the schema.
pub type Record = Map<String, Value>;

/// A table ready for persisting.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub schema: Schema,
    pub records: Vec<Record>,
}

/// Build one record per row from `schema` names and integer rows.
pub fn int_records<R: IntoIterator<Item = i64>>(
    schema: &Schema,
    rows: impl IntoIterator<Item = R>,
) -> Vec<Record> {
    rows.into_iter()
        .map(|row| {
            schema
                .names()
                .zip(row)
                .map(|(name, value)| (name.to_owned(), Value::from(value)))
                .collect()
        })
        .collect()
}
