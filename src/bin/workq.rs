//! workq CLI: run a demo queue and inspect configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use serde::Serialize;
use workq::config::Config;
use workq::telemetry::{TelemetryConfig, init_telemetry};
use workq::{EqualTaskAction, TaskError, WorkQueue};

#[derive(Parser)]
#[command(name = "workq", about = "In-process async work queue")]
struct Cli {
    /// TOML config file (defaults to environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Queue integer tasks, double them in a runner, and report the outcome
    Demo {
        /// Tasks to submit, in order
        #[arg(required = true, allow_negative_numbers = true)]
        tasks: Vec<i64>,
        /// Dedup policy (overrides config)
        #[arg(long)]
        action: Option<EqualTaskAction>,
        /// Simulated handler latency
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
        /// Task values for which the handler fails
        #[arg(long = "fail")]
        fail: Vec<i64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    action: EqualTaskAction,
    service_order: Vec<i64>,
    submissions: Vec<Submission>,
}

#[derive(Debug, Serialize)]
struct Submission {
    task: i64,
    task_id: String,
    admission: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Command::Demo {
            tasks,
            action,
            delay_ms,
            fail,
            json,
        } => {
            let _guard = init_telemetry(TelemetryConfig::from_config(&config, "workq"))?;
            let action = action.unwrap_or(config.equal_task_action);
            let report = cmd_demo(action, tasks, delay_ms, fail).await?;
            print_report(&report, json)
        }
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_demo(
    action: EqualTaskAction,
    tasks: Vec<i64>,
    delay_ms: u64,
    fail: Vec<i64>,
) -> anyhow::Result<DemoReport> {
    let queue: WorkQueue<i64, i64, String> =
        WorkQueue::with_options(workq::QueueOptions::default().equal_task_action(action));

    // Everything is admitted before the runner starts, so dedup applies.
    let handles: Vec<_> = tasks
        .iter()
        .map(|&task| (task, queue.submit(task)))
        .collect();

    let served = Arc::new(Mutex::new(Vec::new()));
    let runner = {
        let queue = queue.clone();
        let served = Arc::clone(&served);
        let fail = Arc::new(fail);
        tokio::spawn(async move {
            queue
                .run(move |task: i64| {
                    let served = Arc::clone(&served);
                    let fail = Arc::clone(&fail);
                    async move {
                        if delay_ms > 0 {
                            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        }
                        served.lock().push(task);
                        if fail.contains(&task) {
                            return Err(format!("task {task} rejected"));
                        }
                        task.checked_mul(2)
                            .ok_or_else(|| format!("task {task} overflows"))
                    }
                })
                .await
        })
    };

    let mut submissions = Vec::with_capacity(handles.len());
    for (task, handle) in handles {
        let admission = handle.admission();
        let outcome = handle.await;
        let (value, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(TaskError::Handler(e)) => (None, Some(e)),
            Err(e) => (None, Some(e.to_string())),
        };
        submissions.push(Submission {
            task,
            task_id: admission.task_id().to_string(),
            admission: admission.label(),
            value,
            error,
        });
    }

    queue.stop().await;
    runner.await?;

    let service_order = served.lock().clone();
    Ok(DemoReport {
        action,
        service_order,
        submissions,
    })
}

fn print_report(report: &DemoReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Action:        {}", report.action);
    println!(
        "Service order: {}",
        report
            .service_order
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();
    println!(
        "{:<8}  {:<8}  {:<10}  RESULT",
        "TASK", "ID", "ADMISSION"
    );
    println!("{}", "-".repeat(48));
    for s in &report.submissions {
        let result = match (&s.value, &s.error) {
            (Some(v), _) => v.to_string(),
            (None, Some(e)) => format!("error: {e}"),
            (None, None) => "-".to_string(),
        };
        println!(
            "{:<8}  {:<8}  {:<10}  {}",
            s.task, s.task_id, s.admission, result
        );
    }
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Log Level:         {}", config.log_level);
    println!(
        "OTLP Endpoint:     {}",
        config.otel_endpoint.as_deref().unwrap_or("-")
    );
    println!("Equal Task Action: {}", config.equal_task_action);
    Ok(())
}
