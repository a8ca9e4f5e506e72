//! Task execution span helpers.

use tracing::Span;

use crate::model::{EqualTaskAction, TaskId};

/// Start a span for one handler invocation.
///
/// The `task.result` and `task.duration_ms` fields are declared empty and
/// filled in by [`record_outcome`].
pub fn start_task_span(task_id: TaskId, action: EqualTaskAction) -> Span {
    tracing::info_span!(
        "task.execute",
        "task.id" = %task_id,
        "queue.equal_task_action" = %action,
        "task.result" = tracing::field::Empty,
        "task.duration_ms" = tracing::field::Empty,
    )
}

/// Record how a handler invocation ended.
pub fn record_outcome(span: &Span, ok: bool, duration_ms: f64) {
    span.record("task.result", if ok { "ok" } else { "error" });
    span.record("task.duration_ms", duration_ms);
    span.in_scope(|| {
        tracing::debug!(ok, duration_ms, "task settled");
    });
}
