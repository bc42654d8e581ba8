//! Ambient execution state: the current-span stack and the cross-cutting
//! propagation store, scoped to one logical execution.
//!
//! Records read this state at creation time to derive their parent span;
//! traces publish user/session/release/tags here so descendant records can
//! pick them up without being handed the trace. State lives in a tokio
//! task-local when the execution runs under [`scope`] (it then survives
//! `.await` points and runtime work stealing), with a thread-local fallback
//! for synchronous callers. Each scope owns its state outright, so
//! unrelated concurrent executions never observe each other's spans or
//! keys.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

use crate::span::SpanHandle;

tokio::task_local! {
    static TASK_STATE: RefCell<AmbientState>;
}

thread_local! {
    static THREAD_STATE: RefCell<AmbientState> = RefCell::new(AmbientState::default());
}

#[derive(Debug, Default, Clone)]
struct AmbientState {
    /// Live spans, innermost last; the last entry is "current".
    stack: Vec<SpanHandle>,
    /// Cross-cutting propagation store.
    baggage: BTreeMap<String, String>,
}

/// A copy of the caller's ambient state, for handing to spawned tasks.
#[derive(Debug, Clone)]
pub struct AmbientSnapshot {
    state: AmbientState,
}

fn with_state<R>(f: impl FnOnce(&mut AmbientState) -> R) -> R {
    if TASK_STATE.try_with(|_| ()).is_ok() {
        TASK_STATE.with(|cell| f(&mut cell.borrow_mut()))
    } else {
        THREAD_STATE.with(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Run a future under a fresh, isolated ambient state.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    TASK_STATE.scope(RefCell::new(AmbientState::default()), fut).await
}

/// Run a future under a copy of a previously captured state.
///
/// Task-locals do not flow into `tokio::spawn`; capture a [`snapshot`]
/// before spawning and wrap the task body with this so records created
/// there become siblings under the caller's current span. Writes stay in
/// the copy and never leak back.
pub async fn scope_with<F>(snapshot: AmbientSnapshot, fut: F) -> F::Output
where
    F: Future,
{
    TASK_STATE.scope(RefCell::new(snapshot.state), fut).await
}

/// Capture the caller's ambient state for use with [`scope_with`].
pub fn snapshot() -> AmbientSnapshot {
    with_state(|s| AmbientSnapshot { state: s.clone() })
}

/// The span new records will attach to, if any.
pub fn current_span() -> Option<SpanHandle> {
    with_state(|s| s.stack.last().cloned())
}

/// All cross-cutting keys currently published.
pub fn baggage() -> BTreeMap<String, String> {
    with_state(|s| s.baggage.clone())
}

/// A single cross-cutting value, if published.
pub fn baggage_get(key: &str) -> Option<String> {
    with_state(|s| s.baggage.get(key).cloned())
}

pub(crate) fn push_span(handle: SpanHandle) {
    with_state(|s| s.stack.push(handle));
}

/// Remove a span from the stack wherever it sits. Out-of-order release is
/// legal and must not disturb unrelated entries.
pub(crate) fn remove_span(span_id: &str) {
    with_state(|s| {
        if let Some(pos) = s.stack.iter().rposition(|h| h.span_id() == span_id) {
            s.stack.remove(pos);
        }
    });
}

pub(crate) fn publish(key: &str, value: String) {
    with_state(|s| {
        s.baggage.insert(key.to_string(), value);
    });
}

pub(crate) fn retract(key: &str) {
    with_state(|s| {
        s.baggage.remove(key);
    });
}
