use clap::{Parser, Subcommand};
use std::future::Future;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use testscribe::ScribeError;
use testscribe::cli::commands::{
    clean::CleanOptions,
    detect::DetectOptions,
    lease::{self, LeaseKind},
};

#[derive(Parser)]
#[command(name = "testscribe")]
#[command(
    version,
    about = "Incremental documentation coordinator for end-to-end test suites"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize testscribe in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing configuration")]
        force: bool,
    },

    /// Detect new and changed test files and write the work list
    Detect {
        #[arg(long, help = "Schedule every test file, ignoring stored fingerprints")]
        force: bool,
        #[arg(
            long,
            conflicts_with = "force",
            help = "Record fingerprints for the work list immediately"
        )]
        sync: bool,
        #[arg(long, help = "Print the detection report as JSON")]
        json: bool,
    },

    /// Extract test metadata for the documentation workers
    Extract {
        #[arg(help = "Files to extract (default: the work list)")]
        files: Vec<String>,
        #[arg(long, help = "Print the extracted JSON to stdout")]
        stdout: bool,
    },

    /// Merge batch results into the consolidated documentation
    Merge {
        #[arg(long = "dry-run", help = "Compute statistics without writing")]
        dry_run: bool,
        #[arg(long, help = "Print merge statistics as JSON")]
        json: bool,
    },

    /// Identify scheduled files that produced no documentation
    Failures {
        #[arg(long, help = "Print the failure report as JSON")]
        json: bool,
    },

    /// Manage the fingerprint metadata store
    Metadata {
        #[command(subcommand)]
        action: MetadataAction,
    },

    /// Coordinate models and providers across parallel batches
    Lease {
        #[command(subcommand)]
        action: LeaseAction,
    },

    /// Show pipeline status
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(short = 'd', long, help = "Show artifact paths")]
        detailed: bool,
    },

    /// Clean up testscribe state
    Clean {
        #[arg(long, help = "Remove the whole state directory")]
        all: bool,
        #[arg(long, help = "Remove batch result files")]
        batches: bool,
        #[arg(long, help = "Remove lease tables")]
        leases: bool,
        #[arg(long, help = "Remove the work list, failed list and failure report")]
        run: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MetadataAction {
    /// Record fingerprints for scheduled files that did not fail
    Update,
}

#[derive(Subcommand)]
enum LeaseAction {
    /// Show model leases and provider rate limits
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Wait for a free resource, take it and print its name
    Acquire {
        #[arg(value_enum)]
        kind: LeaseKind,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Candidates in priority order (default: configured list)"
        )]
        candidates: Vec<String>,
        #[arg(long, help = "Lease owner, usually the batch id")]
        owner: Option<String>,
        #[arg(long, help = "Maximum seconds to wait")]
        max_wait: Option<u64>,
    },
    /// Release a resource
    Release {
        #[arg(value_enum)]
        kind: LeaseKind,
        name: String,
    },
    /// Mark a resource busy (model) or rate limited (provider)
    Mark {
        #[arg(value_enum)]
        kind: LeaseKind,
        name: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Exit non-zero if a resource is currently held
    Check {
        #[arg(value_enum)]
        kind: LeaseKind,
        name: String,
    },
    /// Remove expired leases
    Cleanup,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
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
        eprintln!("\x1b[31mtestscribe encountered an unexpected error:\x1b[0m");
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

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            let usage = e
                .downcast_ref::<ScribeError>()
                .is_some_and(ScribeError::is_usage);
            if usage {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = Runtime::new()?;
    Ok(rt.block_on(future))
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    // stdout is reserved for machine-readable output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    use testscribe::cli::commands;

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Detect { force, sync, json } => {
            block_on(commands::detect::run(DetectOptions { force, sync, json }))??;
        }
        Commands::Extract { files, stdout } => {
            block_on(commands::extract::run(files, stdout))??;
        }
        Commands::Merge { dry_run, json } => {
            block_on(commands::merge::run(dry_run, json))??;
        }
        Commands::Failures { json } => {
            block_on(commands::failures::run(json))??;
        }
        Commands::Metadata { action } => match action {
            MetadataAction::Update => {
                block_on(commands::metadata::run_update())??;
            }
        },
        Commands::Lease { action } => match action {
            LeaseAction::Status { json } => {
                block_on(lease::status(json))??;
            }
            LeaseAction::Acquire {
                kind,
                candidates,
                owner,
                max_wait,
            } => {
                block_on(lease::acquire_cmd(kind, candidates, owner, max_wait))??;
            }
            LeaseAction::Release { kind, name } => {
                block_on(lease::release(kind, &name))??;
            }
            LeaseAction::Mark { kind, name, owner } => {
                block_on(lease::mark(kind, &name, owner))??;
            }
            LeaseAction::Check { kind, name } => {
                if block_on(lease::check(kind, &name))?? {
                    return Ok(ExitCode::FAILURE);
                }
            }
            LeaseAction::Cleanup => {
                block_on(lease::cleanup())??;
            }
        },
        Commands::Status { format, detailed } => {
            block_on(commands::status::run(&format, detailed))??;
        }
        Commands::Clean {
            all,
            batches,
            leases,
            run,
        } => {
            block_on(commands::clean::run(CleanOptions {
                all,
                batches,
                leases,
                run,
            }))??;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
