pub mod attendance;
pub mod face_image;

pub use attendance::{AttendanceRecord, AttendanceStatus, NewAttendanceRecord, RecordId};
pub use face_image::{FaceImage, ImageError, ImageFormat};
