//! Change tracking for crudsql.
//!
//! [`ChangeTracker`] diffs a source payload onto a target entity, mutating
//! the target in place and returning the ordered
//! [`ChangeSet`](crudsql_core::ChangeSet) that partial inserts and updates
//! are assembled from.

pub mod change_tracker;

pub use change_tracker::{ChangeTracker, SetProperties};
