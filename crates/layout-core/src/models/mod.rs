//! Data models for the layout tracker

mod construction;
mod history;
mod machine;

pub use construction::Construction;
pub use history::{
    HistoryEntry, HistoryKey, IncomingEntry, LocalHistoryRecord, MachineRef, NewLocalRecord,
    RecordSyncStatus,
};
pub use machine::{machine_block, Machine, MachineChange, UNKNOWN_BLOCK};
