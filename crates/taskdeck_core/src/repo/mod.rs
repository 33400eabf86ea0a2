//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for tasks.
//! - Isolate SQLite query details from store/service orchestration.
//!
//! # Invariants
//! - Repositories do not validate titles; that happens at the service edge.
//! - Writes against a missing id report "nothing applied" instead of failing.

pub mod task_repo;
