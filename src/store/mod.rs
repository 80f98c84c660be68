//! Record Store Adapter: the three operations the rest of the crate needs from
//! persistence, and the backends that provide them.

pub mod memory;
pub mod mysql;

use thiserror::Error;

use crate::model::{AttendanceRecord, NewAttendanceRecord, RecordId};

pub use memory::MemoryRecordStore;
pub use mysql::MySqlRecordStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attendance record `{0}` not found")]
    NotFound(RecordId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record `{id}` is unreadable: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Persistence for attendance rows.
///
/// `list` returns newest first and must reflect every `create` and `delete`
/// previously completed through the same store.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn create(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError>;

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError>;
}

impl<T: RecordStore> RecordStore for &T {
    async fn create(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        (**self).create(record).await
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        (**self).list().await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// The backend selected at startup.
#[derive(Clone)]
pub enum Store {
    MySql(MySqlRecordStore),
    Memory(MemoryRecordStore),
}

impl Store {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::MySql(_) => "mysql",
            Store::Memory(_) => "memory",
        }
    }
}

impl RecordStore for Store {
    async fn create(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        match self {
            Store::MySql(s) => s.create(record).await,
            Store::Memory(s) => s.create(record).await,
        }
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        match self {
            Store::MySql(s) => s.list().await,
            Store::Memory(s) => s.list().await,
        }
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        match self {
            Store::MySql(s) => s.delete(id).await,
            Store::Memory(s) => s.delete(id).await,
        }
    }
}
