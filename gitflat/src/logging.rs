//! Diagnostic tracing for the flattener.
//!
//! Product output (the flattened files and the summary line) is unaffected by
//! `RUST_LOG`; tracing only adds stderr diagnostics.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr diagnostics subscriber.
///
/// The summary line printed by the binary goes to stdout; everything here
/// goes to stderr, so `gitflat ... > summary.txt` never mixes the two.
///
/// Without `RUST_LOG` only `warn` and above are shown, which covers
/// flattened-name collisions and a cat-file child that fails to exit.
/// `info` adds the acquired HEAD and the run totals; `debug` adds the clone,
/// every skipped path, every written or appended file and pruned directories.
/// Invalid directives in `RUST_LOG` are ignored rather than failing the run.
///
/// ```bash
/// RUST_LOG=gitflat=debug gitflat --repo <url> --dest out
/// ```
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .compact(),
        )
        .init();
}
