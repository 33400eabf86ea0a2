//! Derived list views over task snapshots.
//!
//! # Responsibility
//! - Define the closed sets of sort keys and filter predicates.
//! - Turn one full task snapshot into the ordered, filtered list users see.

pub mod pipeline;
