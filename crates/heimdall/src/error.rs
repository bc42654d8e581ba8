//! Error types for trace context misuse.

use thiserror::Error;

/// Errors raised when the trace context is driven through an invalid state
/// transition. These indicate caller bugs; they are never retried or
/// swallowed internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// `start_trace` was called while another trace is active.
    #[error("a trace is already active in this context; end it before starting another")]
    TraceAlreadyActive,

    /// A record factory or input/output setter was called with no active
    /// trace.
    #[error("no active trace in this context; call start_trace first")]
    NoActiveTrace,
}
