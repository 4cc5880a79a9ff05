mod cmd;
mod exit;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    blocker::BlockerSubcommand, clarify::ClarifySubcommand, config::ConfigSubcommand,
    decision::DecisionSubcommand, failure::FailureSubcommand, git::GitSubcommand,
    iteration::IterationSubcommand, progress::ProgressSubcommand, story::StorySubcommand,
    tdd::TddSubcommand, verify::VerifySubcommand,
};
use exit::ExitSignal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "waypoint",
    about = "Durable workflow and story state for long-running autonomous loops",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "WAYPOINT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a workflow, or resume the one in progress
    Init {
        #[arg(required = true)]
        goal: Vec<String>,
        /// Session identifier to bind
        #[arg(long)]
        session: Option<String>,
    },

    /// Show the workflow summary
    Status,

    /// Everything needed to resume after a restart
    Recover,

    /// Short plain-text recap
    Context,

    /// Mark the workflow completed and archive the progress log
    Complete,

    /// Set the current phase (and optionally agent)
    Phase {
        phase: String,
        #[arg(long)]
        agent: Option<String>,
    },

    /// Override per-workflow timeouts (minutes)
    Timeout {
        #[arg(long)]
        story: Option<u32>,
        #[arg(long)]
        iteration: Option<u32>,
        #[arg(long)]
        clarification: Option<u32>,
    },

    /// Manage stories
    Story {
        #[command(subcommand)]
        subcommand: StorySubcommand,
    },

    /// Record and inspect verification checks
    Verify {
        #[command(subcommand)]
        subcommand: VerifySubcommand,
    },

    /// TDD phase tracking
    Tdd {
        #[command(subcommand)]
        subcommand: TddSubcommand,
    },

    /// Record failures and get retry advice
    Failure {
        #[command(subcommand)]
        subcommand: FailureSubcommand,
    },

    /// Recompute and show alerts
    Alerts,

    /// Human-review checkpoint (exit 2 when due)
    Checkpoint {
        /// Acknowledge the review and reset the cadence
        #[arg(long)]
        ack: bool,
    },

    /// Progress report cadence (exit 2 when due)
    Report {
        /// Acknowledge the report and reset the cadence
        #[arg(long)]
        ack: bool,
    },

    /// Manage blockers
    Blocker {
        #[command(subcommand)]
        subcommand: BlockerSubcommand,
    },

    /// Pause for a manual fix
    AwaitUser {
        #[arg(required = true)]
        description: Vec<String>,
        /// Command the user can run to confirm the fix
        #[arg(long)]
        check_command: Option<String>,
    },

    /// Resume after a manual fix
    UserFixComplete {
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record and query clarifications
    Clarify {
        #[command(subcommand)]
        subcommand: ClarifySubcommand,
    },

    /// Architecture decision records
    Decision {
        #[command(subcommand)]
        subcommand: DecisionSubcommand,
    },

    /// Progress log
    Progress {
        #[command(subcommand)]
        subcommand: ProgressSubcommand,
    },

    /// Driver-loop iteration counter
    Iteration {
        #[command(subcommand)]
        subcommand: IterationSubcommand,
    },

    /// Known-good commit tracking
    Git {
        #[command(subcommand)]
        subcommand: GitSubcommand,
    },

    /// Inspect and validate .claude/waypoint.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { goal, session } => {
            cmd::workflow::init(&root, &goal.join(" "), session.as_deref(), json)
        }
        Commands::Status => cmd::status::status(&root, json),
        Commands::Recover => cmd::status::recover(&root, json),
        Commands::Context => cmd::status::context(&root),
        Commands::Complete => cmd::workflow::complete(&root, json),
        Commands::Phase { phase, agent } => {
            cmd::workflow::phase(&root, &phase, agent.as_deref(), json)
        }
        Commands::Timeout {
            story,
            iteration,
            clarification,
        } => cmd::workflow::timeout(&root, story, iteration, clarification, json),
        Commands::Story { subcommand } => cmd::story::run(&root, subcommand, json),
        Commands::Verify { subcommand } => cmd::verify::run(&root, subcommand, json),
        Commands::Tdd { subcommand } => cmd::tdd::run(&root, subcommand, json),
        Commands::Failure { subcommand } => cmd::failure::run(&root, subcommand, json),
        Commands::Alerts => cmd::checkpoint::alerts(&root, json),
        Commands::Checkpoint { ack } => cmd::checkpoint::checkpoint(&root, ack, json),
        Commands::Report { ack } => cmd::checkpoint::report(&root, ack, json),
        Commands::Blocker { subcommand } => cmd::blocker::run(&root, subcommand, json),
        Commands::AwaitUser {
            description,
            check_command,
        } => cmd::blocker::await_user(&root, &description.join(" "), check_command.as_deref(), json),
        Commands::UserFixComplete { notes } => {
            cmd::blocker::user_fix_complete(&root, notes.as_deref(), json)
        }
        Commands::Clarify { subcommand } => cmd::clarify::run(&root, subcommand, json),
        Commands::Decision { subcommand } => cmd::decision::run(&root, subcommand, json),
        Commands::Progress { subcommand } => cmd::progress::run(&root, subcommand, json),
        Commands::Iteration { subcommand } => cmd::iteration::run(&root, subcommand, json),
        Commands::Git { subcommand } => cmd::git::run(&root, subcommand, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        if let Some(signal) = e.downcast_ref::<ExitSignal>() {
            eprintln!("{signal}");
            std::process::exit(signal.exit_code());
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
