//! Admin Review Surface: gated listing, filtering, export and deletion.

pub mod export;
pub mod gate;
pub mod review;
pub mod session;

pub use export::{CsvExport, export_csv};
pub use gate::{AdminGate, HashedSecretGate, SharedSecretGate};
pub use review::{AdminReview, AttendanceStats, PendingDelete, RecordFilter, ReviewError, filter_records};
pub use session::AdminSession;
