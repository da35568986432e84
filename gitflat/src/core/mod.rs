//! Deterministic, pure logic shared by the flattener.
//!
//! Core modules must be free of I/O side effects. They operate on borrowed
//! paths and return deterministic outputs suitable for tests.

pub mod naming;
pub mod selection;
