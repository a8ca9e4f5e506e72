//! The work queue: dedup-aware admission and the hand-off to the runner.
//!
//! Producers call [`WorkQueue::submit`] from anywhere; one runner drains the
//! queue with [`WorkQueue::run`] until [`WorkQueue::stop`] ends its epoch.
//! All queue state lives behind one mutex that is never held across an
//! `.await`.

mod completion;
mod runner;

pub use completion::TaskHandle;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::model::{Admission, EqualTaskAction};
use crate::telemetry::metrics::QueueMetrics;
use completion::Completion;

/// Binary predicate deciding whether two task descriptors are equal.
pub type TaskComparator<A> = Arc<dyn Fn(&A, &A) -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction-time configuration for a [`WorkQueue`].
pub struct QueueOptions<A> {
    pub(crate) task_comparator: TaskComparator<A>,
    pub(crate) equal_task_action: EqualTaskAction,
}

impl<A> QueueOptions<A> {
    /// Options for descriptors compared by `comparator` instead of `==`.
    pub fn with_comparator(comparator: impl Fn(&A, &A) -> bool + Send + Sync + 'static) -> Self {
        Self {
            task_comparator: Arc::new(comparator),
            equal_task_action: EqualTaskAction::default(),
        }
    }

    pub fn task_comparator(
        mut self,
        comparator: impl Fn(&A, &A) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.task_comparator = Arc::new(comparator);
        self
    }

    pub fn equal_task_action(mut self, action: EqualTaskAction) -> Self {
        self.equal_task_action = action;
        self
    }
}

impl<A: PartialEq + 'static> Default for QueueOptions<A> {
    fn default() -> Self {
        Self::with_comparator(|a: &A, b: &A| a == b)
    }
}

impl<A> Clone for QueueOptions<A> {
    fn clone(&self) -> Self {
        Self {
            task_comparator: Arc::clone(&self.task_comparator),
            equal_task_action: self.equal_task_action,
        }
    }
}

impl<A> std::fmt::Debug for QueueOptions<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueOptions")
            .field("equal_task_action", &self.equal_task_action)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// A queued task and the completion handle it will settle.
pub(crate) struct TaskEntry<A, R, E> {
    pub(crate) task: A,
    pub(crate) completion: Completion<R, E>,
}

/// Signal delivered to an idle runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    TaskArrived,
    Stop,
}

pub(crate) struct QueueState<A, R, E> {
    /// FIFO service order.
    pub(crate) pending: VecDeque<TaskEntry<A, R, E>>,
    /// Idle runners of the current generation, oldest first.
    pub(crate) waiters: VecDeque<oneshot::Sender<Wake>>,
    /// Bumped by every stop. A runner whose captured generation differs is stopping.
    pub(crate) generation: u64,
    /// Exit signals of runners started in the current generation.
    pub(crate) runners: Vec<oneshot::Receiver<()>>,
}

pub(crate) struct Inner<A, R, E> {
    pub(crate) state: Mutex<QueueState<A, R, E>>,
    pub(crate) options: QueueOptions<A>,
    pub(crate) metrics: QueueMetrics,
}

// ---------------------------------------------------------------------------
// WorkQueue
// ---------------------------------------------------------------------------

/// An in-process async work queue.
///
/// `A` is the task descriptor, `R` the handler's value and `E` its error.
/// Clones share the same queue.
pub struct WorkQueue<A, R, E> {
    pub(crate) inner: Arc<Inner<A, R, E>>,
}

impl<A, R, E> Clone for WorkQueue<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: PartialEq + 'static, R, E> WorkQueue<A, R, E> {
    /// A queue with value equality and [`EqualTaskAction::KeepBoth`].
    pub fn new() -> Self {
        Self::with_options(QueueOptions::default())
    }
}

impl<A: PartialEq + 'static, R, E> Default for WorkQueue<A, R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, E> WorkQueue<A, R, E> {
    pub fn with_options(options: QueueOptions<A>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    waiters: VecDeque::new(),
                    generation: 0,
                    runners: Vec::new(),
                }),
                options,
                metrics: QueueMetrics::new(),
            }),
        }
    }

    pub fn equal_task_action(&self) -> EqualTaskAction {
        self.inner.options.equal_task_action
    }

    /// Number of entries waiting to be serviced.
    pub fn len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().pending.is_empty()
    }

    /// Queue a task and return a handle resolving to its outcome.
    ///
    /// Admission happens before this returns: the dedup policy is applied,
    /// the entry is appended, and one idle runner is woken. Awaiting the
    /// handle only waits for the runner to settle it.
    pub fn submit(&self, task: A) -> TaskHandle<R, E> {
        let options = &self.inner.options;
        let mut state = self.inner.state.lock();

        let action = options.equal_task_action;
        let existing = match action {
            EqualTaskAction::KeepBoth => None,
            EqualTaskAction::KeepOld | EqualTaskAction::KeepNew => state
                .pending
                .iter()
                .position(|entry| (options.task_comparator)(&entry.task, &task)),
        };

        if let (EqualTaskAction::KeepOld, Some(index)) = (action, existing) {
            let canonical = &state.pending[index].completion;
            let admission = Admission::Attached {
                canonical_id: canonical.id(),
            };
            let handle = canonical.subscribe(admission);
            drop(state);
            debug!(task_id = %admission.task_id(), position = index, "attached to pending task");
            self.inner.metrics.record_submitted(admission.label());
            return handle;
        }

        // Only KeepNew reaches here with a match: the old entry leaves its
        // slot and its completion handle moves to the tail with this task.
        let (completion, admission) = match existing.and_then(|index| state.pending.remove(index)) {
            Some(old) => {
                let canonical_id = old.completion.id();
                (old.completion, Admission::Requeued { canonical_id })
            }
            None => {
                let completion = Completion::new();
                let id = completion.id();
                (completion, Admission::Created(id))
            }
        };
        let handle = completion.subscribe(admission);
        let entry = TaskEntry { task, completion };

        state.pending.push_back(entry);
        let queued = state.pending.len();

        // Wake exactly one idle runner. Skip waiters whose run was dropped.
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(Wake::TaskArrived).is_ok() {
                break;
            }
        }
        drop(state);

        debug!(task_id = %admission.task_id(), admission = admission.label(), queued, "task queued");
        self.inner.metrics.record_submitted(admission.label());
        handle
    }
}

impl<A, R, E> std::fmt::Debug for WorkQueue<A, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WorkQueue")
            .field("equal_task_action", &self.inner.options.equal_task_action)
            .field("pending", &state.pending.len())
            .field("waiters", &state.waiters.len())
            .field("generation", &state.generation)
            .finish()
    }
}
