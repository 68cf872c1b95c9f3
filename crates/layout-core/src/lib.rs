//! layout-core - Core library for the machine layout tracker
//!
//! This crate contains the history models, the embedded history store, the
//! export/import/merge flow used for manual cross-device sync, and the remote
//! backend adapter shared by the `layout` command-line shell.

pub mod auth;
pub mod config;
pub mod db;
pub mod device;
pub mod error;
pub mod history;
pub mod models;
pub mod prefs;
pub mod remote;
pub mod session;
pub mod status;
pub mod util;

pub use device::{DeviceIdentity, Platform};
pub use error::{Error, Result};
pub use history::{LocalHistoryStore, MemoryHistoryLog};
pub use models::{HistoryEntry, IncomingEntry, LocalHistoryRecord, MachineRef};
pub use session::Session;
pub use status::SyncStatusSnapshot;
