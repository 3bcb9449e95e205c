//! Fasting Tracker - fasting cycle lifecycle orchestration
//!
//! Drives each user's fasting cycle through an explicit state machine and
//! keeps three stores consistent: the PostgreSQL read model, a per-user
//! active-cycle cache, and the actor runtime holding lifecycle snapshots
//! and the one-active-cycle index.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
