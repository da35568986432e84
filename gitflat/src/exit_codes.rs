//! Stable exit codes for the gitflat CLI.

use crate::error::Stage;

/// Every selected file was emitted.
pub const OK: i32 = 0;
/// Invalid command line or configuration.
pub const INVALID: i32 = 1;
/// The repository could not be cloned or resolved.
pub const ACQUISITION: i32 = 3;
/// Enumerating the snapshot tree failed.
pub const TRAVERSAL: i32 = 4;
/// A selected file's content could not be read.
pub const READ: i32 = 5;
/// Writing output failed.
pub const WRITE: i32 = 6;

/// Exit code reported for a failure in `stage`.
pub fn for_stage(stage: Stage) -> i32 {
    match stage {
        Stage::Acquisition => ACQUISITION,
        Stage::Traversal => TRAVERSAL,
        Stage::Read => READ,
        Stage::Write => WRITE,
    }
}
