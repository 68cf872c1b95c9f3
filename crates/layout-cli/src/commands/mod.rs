pub mod auth_cmd;
pub mod block;
pub mod common;
pub mod completions;
pub mod construction;
pub mod device;
pub mod export;
pub mod history;
pub mod import;
pub mod record;
pub mod remote;
pub mod status;
