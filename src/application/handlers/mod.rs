//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod cycle;

pub use cycle::{
    DeleteCycleCommand, DeleteCycleHandler, DeleteUserCyclesCommand, DeleteUserCyclesHandler,
    DeleteUserCyclesResult, GetCycleHandler, GetCycleInProgressHandler, GetCycleInProgressQuery,
    GetCycleInProgressResult, GetCycleQuery, GetCycleResult, GetCycleStatisticsHandler,
    GetCycleStatisticsQuery, ListCycleHistoryHandler, ListCycleHistoryQuery,
    ListCycleHistoryResult, OverlapCheck, ValidateCycleOverlapHandler, ValidateCycleOverlapQuery,
};
