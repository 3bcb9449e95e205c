//! Cycle command and query handlers.
//!
//! Read-model operations around the lifecycle: history, statistics,
//! overlap checks and deletion. Lifecycle transitions themselves go
//! through `CycleLifecycleService`.

// Command handlers
mod delete_cycle;
mod delete_user_cycles;

// Query handlers
mod get_cycle;
mod get_cycle_in_progress;
mod get_cycle_statistics;
mod list_cycle_history;
mod validate_cycle_overlap;

pub use delete_cycle::{DeleteCycleCommand, DeleteCycleHandler};
pub use delete_user_cycles::{
    DeleteUserCyclesCommand, DeleteUserCyclesHandler, DeleteUserCyclesResult,
};
pub use get_cycle::{GetCycleHandler, GetCycleQuery, GetCycleResult};
pub use get_cycle_in_progress::{
    GetCycleInProgressHandler, GetCycleInProgressQuery, GetCycleInProgressResult,
};
pub use get_cycle_statistics::{GetCycleStatisticsHandler, GetCycleStatisticsQuery};
pub use list_cycle_history::{
    ListCycleHistoryHandler, ListCycleHistoryQuery, ListCycleHistoryResult,
    DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use validate_cycle_overlap::{
    OverlapCheck, ValidateCycleOverlapHandler, ValidateCycleOverlapQuery,
};
