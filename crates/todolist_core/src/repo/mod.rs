//! Persistence provider abstractions and implementations.
//!
//! # Responsibility
//! - Define the key-value contract the store persists snapshots through.
//! - Isolate SQLite details from store orchestration.
//!
//! # Invariants
//! - Repositories treat values as opaque bytes; encoding belongs to the store.

pub mod pref_repo;
