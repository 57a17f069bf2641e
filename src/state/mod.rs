//! State management module
//!
//! This module handles everything the merge layer reads and writes:
//! - Shared data structures (data.rs)
//! - The store interface (store.rs)
//! - SQLite catalog (library.rs)
//! - In-memory store for tests and tooling (memory.rs)

pub mod data;
pub mod library;
pub mod memory;
pub mod store;
