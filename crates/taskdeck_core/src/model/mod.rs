//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record and the `Priority` scale.
//! - Provide constructor-time validation for user-facing inputs.
//!
//! # Invariants
//! - Every persisted task is identified by a store-assigned `TaskId`.
//! - Deletion is permanent; there is no tombstone state.

pub mod task;
