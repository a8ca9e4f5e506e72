//! The consumer loop and the stop protocol.

use std::future::Future;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{Instrument, debug, info, warn};

use super::completion::Completion;
use super::{TaskEntry, Wake, WorkQueue};
use crate::model::RunnerState;
use crate::telemetry::task::{record_outcome, start_task_span};

enum Step<A, R, E> {
    Process(TaskEntry<A, R, E>),
    Wait(oneshot::Receiver<Wake>),
}

/// Holds the completion of the task being handled. If the `run` future is
/// dropped before the handler returns, subscribers get `RunnerCancelled`.
struct InFlight<R, E>(Option<Completion<R, E>>);

impl<R, E> InFlight<R, E> {
    fn settle(mut self, outcome: Result<R, E>) {
        if let Some(completion) = self.0.take() {
            completion.settle(outcome);
        }
    }
}

impl<R, E> Drop for InFlight<R, E> {
    fn drop(&mut self) {
        if let Some(completion) = self.0.take() {
            warn!(task_id = %completion.id(), "runner dropped mid-task");
            completion.cancel();
        }
    }
}

/// Drop exit signals of runners that are already gone.
fn prune_exited(runners: &mut Vec<oneshot::Receiver<()>>) {
    runners.retain_mut(|exit_signal| {
        !matches!(exit_signal.try_recv(), Err(oneshot::error::TryRecvError::Closed))
    });
}

impl<A, R, E> WorkQueue<A, R, E> {
    /// Drain the queue with `handler` until [`stop`](Self::stop) is called.
    ///
    /// Entries are serviced oldest first, one at a time. A handler error
    /// settles only that entry. Stop is observed while idle or between
    /// tasks, never mid-task.
    ///
    /// Only one `run` should be active per queue. Concurrent runners are not
    /// coordinated. The handler must not await `stop` on its own queue: stop
    /// waits for this loop to exit.
    ///
    /// Dropping this future while a handler is running fails that one task
    /// with [`TaskError::RunnerCancelled`](crate::TaskError::RunnerCancelled);
    /// tasks still queued are untouched.
    pub async fn run<F, Fut>(&self, mut handler: F)
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let (exited, exit_signal) = oneshot::channel::<()>();
        let generation = {
            let mut state = self.inner.state.lock();
            prune_exited(&mut state.runners);
            state.runners.push(exit_signal);
            state.generation
        };
        let action = self.inner.options.equal_task_action;
        info!(generation, "runner started");

        let mut woken = false;
        loop {
            let step = {
                let mut state = self.inner.state.lock();
                let stopping = state.generation != generation;
                // A wake for an arrived task is honored even if stop landed
                // in between; otherwise stopping ends the loop here.
                if stopping && (!woken || state.pending.is_empty()) {
                    break;
                }
                woken = false;

                match state.pending.pop_front() {
                    Some(entry) => Step::Process(entry),
                    None => {
                        let (tx, rx) = oneshot::channel();
                        state.waiters.push_back(tx);
                        Step::Wait(rx)
                    }
                }
            };

            match step {
                Step::Process(TaskEntry { task, completion }) => {
                    let task_id = completion.id();
                    let span = start_task_span(task_id, action);
                    debug!(%task_id, state = %RunnerState::Processing, "dequeued task");

                    let in_flight = InFlight(Some(completion));
                    let started = Instant::now();
                    let outcome = handler(task).instrument(span.clone()).await;
                    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

                    let ok = outcome.is_ok();
                    if !ok {
                        warn!(parent: &span, %task_id, "task handler failed");
                    }
                    record_outcome(&span, ok, duration_ms);
                    self.inner.metrics.record_processed(ok, duration_ms);
                    in_flight.settle(outcome);
                }
                Step::Wait(wake) => {
                    debug!(generation, state = %RunnerState::Waiting, "queue empty");
                    match wake.await {
                        Ok(Wake::TaskArrived) => woken = true,
                        // Stop rejected the idle wait.
                        Ok(Wake::Stop) | Err(_) => break,
                    }
                }
            }
        }

        drop(exited);
        info!(generation, state = %RunnerState::Stopped, "runner stopped");
    }

    /// Number of runners of the current epoch that have not exited.
    pub fn runner_count(&self) -> usize {
        let mut state = self.inner.state.lock();
        prune_exited(&mut state.runners);
        state.runners.len()
    }

    /// End the current epoch and wait for its runners to exit.
    ///
    /// Idle runners are woken with a stop signal; a runner in the middle
    /// of a task finishes it first. Entries still pending are left queued
    /// for the next `run`. The queue is usable again as soon as this is
    /// called: new submissions and runs belong to the next epoch.
    pub async fn stop(&self) {
        let (ended, runners, pending) = {
            let mut state = self.inner.state.lock();
            let ended = state.generation;
            state.generation = ended.wrapping_add(1);
            for waiter in state.waiters.drain(..) {
                let _ = waiter.send(Wake::Stop);
            }
            (ended, std::mem::take(&mut state.runners), state.pending.len())
        };
        self.inner.metrics.record_stop();
        info!(
            generation = ended,
            runners = runners.len(),
            pending,
            "stop requested"
        );

        for exit_signal in runners {
            // Err means the runner dropped its sender, i.e. it exited.
            let _ = exit_signal.await;
        }
        debug!(generation = ended, "epoch ended");
    }
}
