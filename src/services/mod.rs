pub mod sync_runner;

pub use sync_runner::{run_sync_at, run_sync_loop, run_sync_once, SyncSummary};
