//! # workq
//!
//! In-process async work queue. Producers [`submit`](WorkQueue::submit)
//! task descriptors and await the result; a single runner drains the queue
//! in FIFO order with a caller-supplied async handler.
//!
//! Equal pending tasks can be deduplicated ([`EqualTaskAction`]), and
//! [`stop`](WorkQueue::stop) ends the runner's epoch without losing queued
//! work.
//!
//! ```no_run
//! use workq::{EqualTaskAction, QueueOptions, WorkQueue};
//!
//! # async fn demo() {
//! let queue: WorkQueue<u32, u32, String> = WorkQueue::with_options(
//!     QueueOptions::default().equal_task_action(EqualTaskAction::KeepNew),
//! );
//!
//! let runner = queue.clone();
//! let run = tokio::spawn(async move { runner.run(|n| async move { Ok(n * 2) }).await });
//!
//! assert_eq!(queue.submit(21).await, Ok(42));
//! queue.stop().await;
//! run.await.unwrap();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod queue;
pub mod telemetry;

pub use error::{Error, Result, TaskError};
pub use model::{Admission, EqualTaskAction, RunnerState, TaskId};
pub use queue::{QueueOptions, TaskComparator, TaskHandle, WorkQueue};
