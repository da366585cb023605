//! Tracing and logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Install a panic hook that reports panics through `tracing` before the
/// default hook runs.
pub fn install_panic_hook() {
    tracing::install_panic_hook();
}

/// Tracing configuration (filters, layers, output format).
pub mod tracing;

pub use self::tracing::LogFormat;
