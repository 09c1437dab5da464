//! `cluster submit` / `cluster status` / `cluster health`: a thin HTTP client
//! against a running coordinator, for operators and ad-hoc job submission
//! without writing a worker. Talks the same `/api/*` contract any client
//! would — it has no special access to coordinator internals.

use crate::output;
use clap::{Args, Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Submit a job to a running coordinator.
    Submit(SubmitArgs),
    /// Fetch cluster status from a running coordinator.
    Status(StatusArgs),
    /// Check a coordinator's liveness.
    Health(StatusArgs),
}

#[derive(Copy, Clone, ValueEnum)]
pub enum JobTypeArg {
    Thread,
    Collatz,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum PriorityArg {
    Low,
    Normal,
    High,
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Coordinator base URL.
    #[arg(long, default_value = "http://localhost:3000")]
    coordinator_url: String,

    /// Job type: `thread` or `collatz`.
    #[arg(long, value_enum)]
    job_type: JobTypeArg,

    /// Job priority: `low`, `normal`, or `high`.
    #[arg(long, value_enum, default_value = "normal")]
    priority: PriorityArg,

    /// Opaque job parameters as a JSON document.
    #[arg(long, default_value = "{}")]
    parameters: String,

    /// Prefer a GPU-enabled node if one is online.
    #[arg(long)]
    gpu_preferred: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Coordinator base URL.
    #[arg(long, default_value = "http://localhost:3000")]
    coordinator_url: String,
}

pub async fn execute(cmd: ClientCommands, verbose: bool) -> anyhow::Result<()> {
    match cmd {
        ClientCommands::Submit(args) => submit(args, verbose).await,
        ClientCommands::Status(args) => status(args).await,
        ClientCommands::Health(args) => health(args).await,
    }
}

async fn submit(args: SubmitArgs, verbose: bool) -> anyhow::Result<()> {
    let parameters: serde_json::Value = serde_json::from_str(&args.parameters)
        .map_err(|e| anyhow::anyhow!("--parameters must be valid JSON: {e}"))?;

    let job_type = match args.job_type {
        JobTypeArg::Thread => "thread",
        JobTypeArg::Collatz => "collatz",
    };
    let priority = match args.priority {
        PriorityArg::Low => "low",
        PriorityArg::Normal => "normal",
        PriorityArg::High => "high",
    };

    let body = serde_json::json!({
        "type": job_type,
        "priority": priority,
        "parameters": parameters,
        "gpu_preferred": args.gpu_preferred,
    });

    let url = format!("{}/api/submit", args.coordinator_url);
    let response = reqwest::Client::new().post(&url).json(&body).send().await?;
    let status = response.status();
    let value: serde_json::Value = response.json().await?;

    if !status.is_success() {
        anyhow::bail!("coordinator rejected submission ({status}): {value}");
    }
    if verbose {
        output::print_json("submit response", &value);
    }
    output::print_submit_result(&value);
    Ok(())
}

async fn status(args: StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/status", args.coordinator_url);
    let value: serde_json::Value = reqwest::get(&url).await?.json().await?;
    output::print_status(&value);
    Ok(())
}

async fn health(args: StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/health", args.coordinator_url);
    let value: serde_json::Value = reqwest::get(&url).await?.json().await?;
    output::print_json("health", &value);
    Ok(())
}
