use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insightboard::ConfigLoader;
use insightboard::cli::commands;

#[derive(Parser)]
#[command(name = "insightboard")]
#[command(
    version,
    about = "Heuristic BI analysis engine: profile tabular data into dashboard insights"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a data file for analysis
    Upload {
        #[arg(help = "Path to the file to upload")]
        file: PathBuf,
    },

    /// Run the analysis pipeline over an upload
    Analyze {
        #[arg(help = "Upload id to analyze")]
        upload_id: Option<String>,
        #[arg(long, short, help = "Upload this file and analyze it immediately")]
        file: Option<PathBuf>,
        #[arg(long, short, help = "Wait up to N seconds for completion")]
        wait: Option<u64>,
    },

    /// Show the status of an analysis run
    Status {
        #[arg(help = "Analysis id")]
        analysis_id: String,
    },

    /// Show the result payload of an analysis run
    Show {
        #[arg(help = "Analysis id")]
        analysis_id: String,
        #[arg(long, help = "Print the full record as JSON")]
        json: bool,
    },

    /// Ask a question about your analyzed data
    Chat {
        #[arg(help = "The question to ask")]
        message: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize project configuration
    Init,
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
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
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::config_show(json)?,
            ConfigAction::Path => commands::config_path(),
            ConfigAction::Init => commands::config_init()?,
        },
        command => {
            let config = ConfigLoader::load()?;
            let runtime = Runtime::new()?;
            runtime.block_on(async {
                match command {
                    Commands::Upload { file } => {
                        commands::upload(&config, &file).await?;
                    }
                    Commands::Analyze {
                        upload_id,
                        file,
                        wait,
                    } => {
                        commands::analyze(&config, upload_id, file.as_deref(), wait).await?;
                    }
                    Commands::Status { analysis_id } => {
                        commands::status(&config, &analysis_id).await?;
                    }
                    Commands::Show { analysis_id, json } => {
                        commands::show(&config, &analysis_id, json).await?;
                    }
                    Commands::Chat { message } => {
                        commands::chat(&config, &message).await?;
                    }
                    Commands::Config { .. } => unreachable!("handled above"),
                }
                Ok::<(), anyhow::Error>(())
            })?;
        }
    }

    Ok(())
}
