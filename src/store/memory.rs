use std::sync::{Arc, RwLock};

use chrono::Utc;

use super::{RecordStore, StoreError};
use crate::model::{AttendanceRecord, NewAttendanceRecord, RecordId};

/// Process-local store. Rows are kept newest first.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    rows: Arc<RwLock<Vec<AttendanceRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().expect("record store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let stored = AttendanceRecord::from_new(RecordId::generate(), record, Some(Utc::now()));
        self.rows
            .write()
            .expect("record store poisoned")
            .insert(0, stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.rows.read().expect("record store poisoned").clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("record store poisoned");
        let before = rows.len();
        rows.retain(|r| &r.id != id);

        if rows.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
