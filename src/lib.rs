//! LearnHub - course progress engine
//!
//! Tracks video watch time and quiz results per lesson, gates lessons behind
//! their predecessors, and turns completed lessons into XP, levels and
//! badges. Course and quiz definitions are read-only fixtures; progress is
//! kept in a key-value store.

pub mod config;
pub mod course;
pub mod engine;
pub mod ledger;
pub mod progress;
pub mod quiz;
pub mod tracker;

pub use config::Config;
pub use course::Catalog;
pub use engine::{CourseEngine, EngineError, EngineEvent, ProgressListener, SharedEngine};
