//! Flatten a git repository snapshot into one directory or one text file.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (path selection, flat naming).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (git, snapshot traversal, output
//!   sinks, configuration, cleanup).
//!
//! [`flatten`] wires one traversal through selection into the chosen sink and
//! reports failures tagged with their [`error::Stage`].

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod flatten;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
