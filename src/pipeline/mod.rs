//! Poll loop entry points.
//!
//! - `Watcher::run_cycle`: one pass over every configured source
//! - `Watcher::run`: the loop, either once or until a stop is requested

mod cycle;
pub mod shutdown;
mod watcher;

pub use cycle::CycleReport;
pub use shutdown::{Shutdown, ShutdownTrigger, StopReason, listen_for_ctrl_c, shutdown_channel};
pub use watcher::{RunMode, Watcher};
