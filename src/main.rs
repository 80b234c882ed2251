use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use canvas_conversation::{
    canvas::{Canvas, JsonCanvas},
    config::{Config, LogFormat},
    generation::{GenerationOutcome, Generator},
};

/// Generate replies on a JSON Canvas file from the ancestry of a note
#[derive(Debug, Parser)]
#[command(name = "canvas-conversation", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send the conversation ending at a note and add the reply below it
    Generate {
        /// Path to the .canvas file
        #[arg(long)]
        canvas: PathBuf,
        /// Id of the note to reply to
        #[arg(long)]
        node: String,
        /// Id of a configured action to append
        #[arg(long)]
        action: Option<String>,
    },
    /// Add an empty user note below a note
    NextNote {
        #[arg(long)]
        canvas: PathBuf,
        #[arg(long)]
        node: String,
    },
    /// Print the conversation that would be sent, as JSON (leaves the file untouched)
    Inspect {
        #[arg(long)]
        canvas: PathBuf,
        #[arg(long)]
        node: String,
        #[arg(long)]
        action: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);
    config.warn_remapped_model();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        model = %config.provider.model,
        "Canvas conversation starting..."
    );

    match cli.command {
        Command::Generate {
            canvas,
            node,
            action,
        } => {
            let action = resolve_action(&config, action.as_deref())?;
            let generator = open(&canvas, &node, config).await?;

            match generator.generate(action.as_ref()).await {
                Ok(GenerationOutcome::Replied { node_id, .. }) => {
                    println!("{}", node_id);
                }
                Ok(outcome) => {
                    if let Some(notice) = outcome.notice() {
                        eprintln!("{}", notice);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Generation failed");
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
        Command::NextNote { canvas, node } => {
            let generator = open(&canvas, &node, config).await?;
            if let Some(id) = generator.add_next_note().await? {
                println!("{}", id);
            }
        }
        Command::Inspect {
            canvas,
            node,
            action,
        } => {
            let action = resolve_action(&config, action.as_deref())?;
            let generator = open(&canvas, &node, config).await?;
            let conversation = generator.preview(&node, action.as_ref());
            println!("{}", serde_json::to_string_pretty(&conversation)?);
        }
    }

    Ok(())
}

/// Load the canvas, select `node` and wrap both in a generator
async fn open(path: &Path, node: &str, config: Config) -> anyhow::Result<Generator> {
    let canvas = Arc::new(JsonCanvas::load(path).await?);
    if canvas.node(node).is_none() {
        anyhow::bail!("Note {} not found in {}", node, path.display());
    }
    canvas.select(node);
    info!(path = %path.display(), node = %node, "Canvas opened");

    Ok(Generator::new(canvas, config)?)
}

fn resolve_action(
    config: &Config,
    id: Option<&str>,
) -> anyhow::Result<Option<canvas_conversation::config::Action>> {
    match id {
        None => Ok(None),
        Some(id) => match config.action(id) {
            Some(action) => Ok(Some(action.clone())),
            None => {
                let known: Vec<&str> = config.actions.iter().map(|a| a.id.as_str()).collect();
                anyhow::bail!("Unknown action {} (available: {})", id, known.join(", "))
            }
        },
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
