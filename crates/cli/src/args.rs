use clap::{Parser, Subcommand};

const JOB_STATUSES: [&str; 5] = ["pending", "running", "completed", "failed", "cancelled"];

/// MCP CLI - submit and inspect jobs on an MCP orchestrator
#[derive(Parser, Debug)]
#[command(name = "mcp")]
#[command(version)]
#[command(about = "Job orchestration client for the MCP API", long_about = None)]
pub struct Cli {
    /// Base URL of the orchestrator API
    #[arg(
        long = "api-url",
        env = "MCP_API_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Use JSON log format
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a new job for execution
    Submit {
        /// Job type, e.g. ml_experiment or backtest
        #[arg(long = "type")]
        job_type: String,
        /// Job payload as a JSON object or a path to a JSON file
        #[arg(long)]
        config: String,
        /// Additional metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Show the full record of a job
    Status { job_id: String },

    /// Cancel a pending or running job
    Cancel { job_id: String },

    /// List jobs, newest first
    List {
        #[arg(long, value_parser = JOB_STATUSES)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List registered backends
    Backends,

    /// Route a job type to a remote execution service
    RegisterService {
        #[arg(long)]
        job_type: String,
        /// Base URL of the service, e.g. http://worker:8100
        #[arg(long)]
        service_url: String,
    },

    /// List artifacts
    Artifacts {
        #[arg(long)]
        artifact_type: Option<String>,
        #[arg(long)]
        job_id: Option<String>,
        #[arg(long)]
        service_id: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
}
