//! Per-thread transition tracking
//!
//! - **`record`**: the record and per-thread state types
//! - **`threads`**: the thread table and its active cache
//! - **`recorder`**: turns observed addresses into records

pub mod record;
pub mod recorder;
pub mod threads;

pub use record::{Record, ThreadState};
pub use recorder::TransitionRecorder;
pub use threads::{ActiveThreadCache, ThreadStateManager};
