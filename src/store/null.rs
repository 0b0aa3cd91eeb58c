use crate::schema::{Record, Schema};

use super::{DeleteOutcome, LoadJob, StoreError, TableStore};

/// Accepts everything and keeps nothing, for running the whole
/// pipeline without any storage backend.
#[derive(Debug, Default)]
pub struct NullStore;

struct DoneJob;

impl LoadJob for DoneJob {
    fn running(&mut self) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn errors(&self) -> Option<Vec<String>> {
        None
    }
}

impl TableStore for NullStore {
    fn description(&self) -> String {
        "no backend".into()
    }

    fn delete_table(&mut self, _name: &str) -> Result<DeleteOutcome, StoreError> {
        Ok(DeleteOutcome::Absent)
    }

    fn create_schema(&mut self, _name: &str, _schema: &Schema) -> Result<(), StoreError> {
        Ok(())
    }

    fn bulk_load(
        &mut self,
        _name: &str,
        _records: &[Record],
        _schema: &Schema,
    ) -> Result<Box<dyn LoadJob>, StoreError> {
        Ok(Box::new(DoneJob))
    }
}
