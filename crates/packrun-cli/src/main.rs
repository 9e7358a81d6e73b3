//! Packrun CLI — run declaratively-defined skills from installed packs
//! against a remote workflow API.

mod commands;

use clap::{Parser, Subcommand};

/// Packrun CLI — declarative skill execution
#[derive(Parser)]
#[command(name = "packrun", version, about = "Packrun CLI — declarative skill execution")]
pub struct Cli {
    /// Installed-packs directory (default: ~/.packrun/packs)
    #[arg(long, env = "PACKRUN_PACKS_DIR", global = true)]
    packs_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a skill by name
    Run {
        /// Skill name (resolved across all installed packs)
        skill: String,

        /// Invocation input as key=value (repeatable). Values that parse
        /// as JSON keep their type; anything else is a string.
        #[arg(long = "input", short = 'i', value_name = "KEY=VALUE")]
        inputs: Vec<String>,

        /// Invocation input as a single JSON object (merged over --input)
        #[arg(long)]
        input_json: Option<String>,

        /// Submit without waiting for a terminal status
        #[arg(long)]
        no_wait: bool,

        /// Poll timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Poll cadence in milliseconds
        #[arg(long, default_value_t = 2000)]
        poll_interval_ms: u64,

        /// Workspace ID override
        #[arg(long, env = "PACKRUN_WORKSPACE_ID")]
        workspace_id: Option<String>,

        /// Project ID override
        #[arg(long, env = "PACKRUN_PROJECT_ID")]
        project_id: Option<String>,

        /// Print the raw JSON execution report
        #[arg(long)]
        json: bool,
    },

    /// Inspect installed skills
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },

    /// Inspect installed packs
    Pack {
        #[command(subcommand)]
        action: PackAction,
    },
}

#[derive(Subcommand)]
enum SkillAction {
    /// List skills across all installed packs
    List,
    /// Show one skill definition as YAML
    Show {
        /// Skill name
        name: String,
    },
}

#[derive(Subcommand)]
enum PackAction {
    /// List installed packs
    List,
}

#[tokio::main]
async fn main() {
    // .env.local takes priority over .env; existing env vars win over both
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packrun_core=warn,packrun_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            skill,
            inputs,
            input_json,
            no_wait,
            timeout_secs,
            poll_interval_ms,
            workspace_id,
            project_id,
            json,
        } => {
            commands::run::run(commands::run::RunArgs {
                skill,
                inputs,
                input_json,
                wait: !no_wait,
                timeout_ms: timeout_secs * 1000,
                poll_interval_ms,
                workspace_id,
                project_id,
                json,
                packs_dir: cli.packs_dir,
            })
            .await
        }

        Commands::Skill { action } => match action {
            SkillAction::List => commands::skill::list(cli.packs_dir.as_deref()),
            SkillAction::Show { name } => commands::skill::show(cli.packs_dir.as_deref(), &name),
        },

        Commands::Pack { action } => match action {
            PackAction::List => commands::pack::list(cli.packs_dir.as_deref()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.code(), e);
        if let Some(detail) = e.detail() {
            eprintln!(
                "{}",
                serde_json::to_string_pretty(detail).unwrap_or_else(|_| detail.to_string())
            );
        }
        std::process::exit(1);
    }
}
