use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_doc::cli::commands::{config, init, retry, revert, status, update};
use git_doc::cli::{GlobalOptions, Output, cancel_on_ctrl_c};
use git_doc::constants::state::DEFAULT_LIST_LIMIT;

#[derive(Parser)]
#[command(name = "git-doc")]
#[command(version, about = "Automatically update docs based on Git commits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: .git-doc/config.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Preview changes without writing files or committing
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .git-doc config and state directory
    Init,

    /// Process new commits and update documentation
    Update {
        #[arg(long, help = "Start commit (exclusive) for manual range updates")]
        from: Option<String>,
        #[arg(long, help = "End commit (inclusive, default HEAD) for manual range updates")]
        to: Option<String>,
        #[arg(long = "from-hook", hide = true)]
        from_hook: bool,
    },

    /// Retry failed or interrupted commits
    Retry {
        #[arg(long, help = "Retry a specific commit hash")]
        commit: Option<String>,
    },

    /// Show state of processed commits
    Status {
        #[arg(long, help = "Output status as JSON")]
        json: bool,
        #[arg(
            long,
            default_value_t = DEFAULT_LIST_LIMIT,
            help = "Maximum number of recent commit rows"
        )]
        limit: usize,
    },

    /// Revert the documentation commit linked to a code commit
    Revert {
        #[arg(help = "Code commit hash")]
        commit: String,
    },

    /// Show the resolved configuration
    Config {
        #[arg(long, help = "Print resolved configuration file path")]
        path: bool,
        #[arg(long, help = "Open configuration file in $VISUAL or $EDITOR")]
        edit: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mgit-doc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::default().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let opts = GlobalOptions {
        config: cli.config,
        dry_run: cli.dry_run,
    };
    let out = Output::new(cli.quiet);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Init => init::run(&out).await,
            Commands::Update {
                from,
                to,
                from_hook,
            } => {
                let cancel = cancel_on_ctrl_c();
                let args = update::UpdateArgs {
                    from,
                    to,
                    from_hook,
                };
                update::run(&opts, &args, &cancel, &out).await
            }
            Commands::Retry { commit } => {
                let cancel = cancel_on_ctrl_c();
                retry::run(&opts, commit.as_deref(), &cancel, &out).await
            }
            Commands::Status { json, limit } => status::run(&opts, json, limit, &out).await,
            Commands::Revert { commit } => revert::run(&opts, &commit, &out).await,
            Commands::Config { path, edit } => config::run(&opts, path, edit, &out).await,
        }
    })?;

    Ok(())
}
