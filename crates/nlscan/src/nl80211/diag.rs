//! Where human-readable diagnostics go.

use std::fmt;
use std::sync::Arc;

/// Destination for the one-line diagnostics a session emits before
/// returning an error or when it skips a malformed field.
///
/// The sink never affects control flow. It is chosen per session through
/// [`SessionBuilder::diagnostics`](super::SessionBuilder::diagnostics).
#[derive(Clone, Default)]
pub enum DiagnosticSink {
    /// Write to standard error.
    #[default]
    Stderr,
    /// Forward to `tracing` at warn level.
    Tracing,
    /// Hand each line to a callback.
    Callback(Arc<dyn Fn(&str) + Send + Sync>),
    /// Drop everything.
    Silent,
}

impl DiagnosticSink {
    /// Build a callback sink.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// Emit one diagnostic line.
    pub fn emit(&self, message: &str) {
        match self {
            Self::Stderr => eprintln!("nlscan: {}", message),
            Self::Tracing => tracing::warn!("{}", message),
            Self::Callback(f) => f(message),
            Self::Silent => {}
        }
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("Stderr"),
            Self::Tracing => f.write_str("Tracing"),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Silent => f.write_str("Silent"),
        }
    }
}
