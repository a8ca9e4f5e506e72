//! Single-assignment completion handles.
//!
//! A [`Completion`] is the sending half, owned by exactly one queued entry at
//! a time. Settling consumes it. Any number of [`TaskHandle`]s observe the
//! same outcome through their own receivers.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tokio::sync::watch;

use crate::error::TaskError;
use crate::model::{Admission, TaskId};

type Slot<R, E> = Option<Result<R, TaskError<E>>>;

/// Sending half of a completion handle.
pub(crate) struct Completion<R, E> {
    id: TaskId,
    tx: watch::Sender<Slot<R, E>>,
}

impl<R, E> Completion<R, E> {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            id: TaskId::new(),
            tx,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// A receiver for another party awaiting this outcome.
    pub(crate) fn subscribe(&self, admission: Admission) -> TaskHandle<R, E> {
        TaskHandle {
            admission,
            rx: self.tx.subscribe(),
        }
    }

    /// Publish the outcome to every current and future subscriber.
    pub(crate) fn settle(self, outcome: Result<R, E>) {
        self.publish(outcome.map_err(TaskError::Handler));
    }

    /// Fail every subscriber because the runner was dropped mid-task.
    pub(crate) fn cancel(self) {
        self.publish(Err(TaskError::RunnerCancelled));
    }

    fn publish(self, outcome: Result<R, TaskError<E>>) {
        // Stored even when nobody is listening.
        self.tx.send_replace(Some(outcome));
    }
}

/// A submitter's view of its task.
///
/// Await it (it implements [`IntoFuture`]) to get the handler's result. The
/// task stays queued whether or not the handle is awaited or dropped.
pub struct TaskHandle<R, E> {
    admission: Admission,
    rx: watch::Receiver<Slot<R, E>>,
}

impl<R, E> TaskHandle<R, E> {
    /// Id of the completion handle this submission awaits.
    pub fn id(&self) -> TaskId {
        self.admission.task_id()
    }

    /// How the submission was admitted.
    pub fn admission(&self) -> Admission {
        self.admission
    }

    /// True once the runner has settled the task.
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

impl<R: Clone, E: Clone> TaskHandle<R, E> {
    /// Wait for the runner to settle the task.
    pub async fn outcome(mut self) -> Result<R, TaskError<E>> {
        let settled = self.rx.wait_for(Option::is_some).await;
        let slot = match settled {
            Ok(slot) => Option::clone(&slot),
            // Sender dropped unsettled: the queue went away with the entry.
            Err(_) => return Err(TaskError::Abandoned),
        };

        slot.unwrap_or(Err(TaskError::Abandoned))
    }
}

impl<R, E> IntoFuture for TaskHandle<R, E>
where
    R: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<R, TaskError<E>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.outcome())
    }
}

impl<R, E> std::fmt::Debug for TaskHandle<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("admission", &self.admission)
            .field("settled", &self.is_settled())
            .finish()
    }
}
