//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `cycle` - Fasting cycle records, lifecycle machine and snapshots

pub mod cycle;
pub mod foundation;
