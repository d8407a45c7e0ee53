#![forbid(unsafe_code)]

//! Subscriber bootstrap for hosts that do not install their own.
//!
//! ## Environment Variables
//!
//! 1. **`VEIL_LOG`** (highest priority) - veil-specific filter directives
//! 2. **`RUST_LOG`** - standard tracing filter
//! 3. **Default** - `info`
//!
//! Hosts embedding the manager in a larger application normally install
//! their own subscriber; the manager only emits `tracing` events.

use tracing_subscriber::EnvFilter;

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per event. Requires the `tracing-json` feature.
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Resolve the filter from `VEIL_LOG`, then `RUST_LOG`, then `info`.
#[must_use]
pub fn env_filter() -> EnvFilter {
    ["VEIL_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|var| {
            let directives = std::env::var(var).ok()?;
            EnvFilter::try_new(directives).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed; calling
/// this more than once is harmless.
pub fn init(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);
    match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        #[cfg(feature = "tracing-json")]
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
