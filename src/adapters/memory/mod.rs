//! In-memory adapters for tests and local development.

mod cycle_repository;

pub use cycle_repository::InMemoryCycleRepository;
