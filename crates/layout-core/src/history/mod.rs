//! History keeping: the per-device store, the canonical list, file transfer
//! and merge.

mod log;
mod merge;
mod store;
mod transfer;

pub use log::{CanonicalHistory, HistoryLog, MemoryHistoryLog, StoredHistoryLog};
pub use merge::{merge_into, merge_value};
pub use store::LocalHistoryStore;
pub use transfer::{
    export_document, export_file_name, export_to_dir, import_entries, import_from_path,
    parse_history_entries, parse_import_document, ExportDocument,
};
