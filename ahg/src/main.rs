//! Agent Hook Guard - lifecycle policy hooks for AI coding agents.
//!
//! One subcommand per hook point; the agent pipes a JSON event to stdin and
//! reads the decision from the exit code (0 allow, 1 warn, 2 block) with
//! human-readable detail on stderr.

#![forbid(unsafe_code)]

mod context;
mod git;
mod hook;
mod install;
mod notify;
mod pipeline;
mod size_gate;
mod stop_gate;
mod tools;

use clap::{Parser, Subcommand};
use hook::HookPoint;

#[derive(Parser)]
#[command(name = "ahg")]
#[command(author, version, about = "Agent Hook Guard - policy hooks for AI coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Gate a proposed file mutation against the size policy (pre-mutation)
    Pre,
    /// Run fix-up automation on a mutated file (post-mutation)
    Post,
    /// Announce a session-state notification
    Notify,
    /// Scan the session's changed files for leftover markers (session end)
    Stop,
    /// Handle session start
    Start,
    /// Register the AHG hooks in the agent settings
    Install {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show per-event hook installation state
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Pre => hook::run(HookPoint::PreMutation).await,
        Commands::Post => hook::run(HookPoint::PostMutation).await,
        Commands::Notify => hook::run(HookPoint::Notification).await,
        Commands::Stop => hook::run(HookPoint::SessionStop).await,
        Commands::Start => hook::run(HookPoint::SessionStart).await,
        Commands::Install { dry_run } => run_management(install::run_install(dry_run)),
        Commands::Status => run_management(install::run_status()),
    };
    std::process::exit(code);
}

fn run_management(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("[ahg] {e:#}");
            1
        }
    }
}

/// Diagnostics go to stderr through tracing, filtered by `AHG_LOG` and quiet
/// by default so agent-facing stderr stays reserved for violation detail.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("AHG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
