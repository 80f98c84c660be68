//! Attendance Workflow: name validation, one pending submission at a time,
//! record creation and list refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::location::{LocationProvider, resolve_location};
use crate::model::attendance::{format_date, format_time};
use crate::model::{AttendanceRecord, AttendanceStatus, FaceImage, NewAttendanceRecord};
use crate::store::{RecordStore, StoreError};

/// Longest accepted name, in characters; the `name` column is `VARCHAR(255)`.
pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {MAX_NAME_CHARS} characters")]
    NameTooLong,
    #[error("another attendance submission is still in progress")]
    Busy,
    #[error("failed to save attendance: {0}")]
    Persist(#[from] StoreError),
}

/// How the displayed list follows a successful create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-read the whole list from the store.
    Refetch,
    /// Put the new record in front of the current list.
    Prepend,
}

/// A submission that passed validation and is waiting for its photo.
///
/// Holds the workflow's single submission slot until it is completed,
/// cancelled or dropped.
#[derive(Debug)]
pub struct PendingAttendance {
    name: String,
    status: AttendanceStatus,
    slot: Arc<AtomicBool>,
}

impl PendingAttendance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AttendanceStatus {
        self.status
    }
}

impl Drop for PendingAttendance {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

pub struct AttendanceWorkflow<S> {
    store: S,
    location: String,
    refresh: RefreshPolicy,
    in_flight: Arc<AtomicBool>,
    records: RwLock<Vec<AttendanceRecord>>,
}

impl<S: RecordStore> AttendanceWorkflow<S> {
    /// Resolves the location once, best effort, and loads the current list.
    pub async fn start<L: LocationProvider>(store: S, locator: &L, refresh: RefreshPolicy) -> Self {
        let location = resolve_location(locator).await;
        let workflow = Self::with_location(store, location, refresh);

        if refresh == RefreshPolicy::Refetch {
            if let Err(e) = workflow.refresh().await {
                warn!(error = %e, "Initial attendance list load failed");
            }
        }
        workflow
    }

    pub fn with_location(store: S, location: String, refresh: RefreshPolicy) -> Self {
        Self {
            store,
            location,
            refresh,
            in_flight: Arc::new(AtomicBool::new(false)),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The list as last displayed.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.read().expect("record list poisoned").clone()
    }

    pub async fn refresh(&self) -> Result<(), WorkflowError> {
        let fresh = self.store.list().await?;
        *self.records.write().expect("record list poisoned") = fresh;
        Ok(())
    }

    /// Validates the name and binds the requested status. The capture step
    /// opens only after this succeeds.
    pub fn submit(&self, name: &str, status: AttendanceStatus) -> Result<PendingAttendance, WorkflowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(WorkflowError::NameTooLong);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WorkflowError::Busy);
        }

        Ok(PendingAttendance {
            name: name.to_string(),
            status,
            slot: self.in_flight.clone(),
        })
    }

    pub async fn complete(
        &self,
        pending: PendingAttendance,
        face_image: Option<FaceImage>,
    ) -> Result<AttendanceRecord, WorkflowError> {
        self.complete_at(pending, face_image, Local::now().naive_local())
            .await
    }

    /// Builds the record with the given local time and persists it.
    ///
    /// On failure nothing is added to the list and the slot is freed so the
    /// user can start over.
    pub async fn complete_at(
        &self,
        pending: PendingAttendance,
        face_image: Option<FaceImage>,
        now: NaiveDateTime,
    ) -> Result<AttendanceRecord, WorkflowError> {
        let record = NewAttendanceRecord {
            name: pending.name.clone(),
            time: format_time(now.time()),
            date: format_date(now.date()),
            location: self.location.clone(),
            status: pending.status,
            face_image,
        };

        let created = match self.store.create(record).await {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, name = %pending.name, "Attendance submission failed");
                return Err(e.into());
            }
        };
        drop(pending);

        info!(
            id = %created.id,
            status = %created.status,
            verified = created.is_verified(),
            "Attendance recorded"
        );

        let refetched = match self.refresh {
            RefreshPolicy::Refetch => match self.refresh().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "List refresh failed after create, prepending locally");
                    false
                }
            },
            RefreshPolicy::Prepend => false,
        };
        if !refetched {
            self.records
                .write()
                .expect("record list poisoned")
                .insert(0, created.clone());
        }

        Ok(created)
    }

    pub fn cancel(&self, pending: PendingAttendance) {
        info!(name = %pending.name, "Attendance submission cancelled");
        drop(pending);
    }
}
