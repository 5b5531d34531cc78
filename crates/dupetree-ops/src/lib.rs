//! Duplicate removal for dupetree.
//!
//! Deletion is synchronous and file-by-file. Every path is checked against the
//! disposable root first; anything outside it is refused, never removed.
//! Per-path failures are collected into the returned [`DeletionComplete`].

mod delete;
mod operation;
mod progress;

pub use delete::Deleter;
pub use operation::{DeleteOptions, OperationError};
pub use progress::{DeletionComplete, OperationProgress};
