//! Lesson progress persistence and unlocking
//!
//! Records are stored per (course, lesson) in a string key-value backend;
//! which lessons are reachable is always derived from those records.

pub mod backend;
pub mod record;
pub mod store;
pub mod unlock;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use record::{ProgressRecord, UnlockOverride, unix_now};
pub use store::ProgressStore;
pub use unlock::LessonStatus;
