//! lmsbot-core - Core library for lmsbot
//!
//! This crate mirrors LMS course data into a local `SQLite` file, detects
//! newly inserted rows, decides when due-date reminders are owed, and drives
//! one polling cycle against pluggable LMS and notifier collaborators.

pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod files;
pub mod lms;
pub mod messages;
pub mod models;
pub mod notify;
pub mod sync;
pub mod util;
pub mod watcher;

pub use config::{QuietHours, SyncSettings};
pub use deadline::{evaluate, Threshold};
pub use error::{Error, Result};
pub use sync::{CycleReport, SyncEngine};
