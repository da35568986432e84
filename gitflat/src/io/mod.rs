//! I/O helpers for the flattener.

pub mod cleanup;
pub mod config;
pub mod git;
pub mod sink;
pub mod snapshot;
