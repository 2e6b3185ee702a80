//! Core use-case services.
//!
//! # Responsibility
//! - Own the task/group collections and every mutation over them.
//! - Keep UI/FFI layers decoupled from persistence details.

pub mod filter;
pub mod reorder;
pub mod snapshot;
pub mod task_store;
