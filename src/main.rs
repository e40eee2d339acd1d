use std::path::PathBuf;
use std::sync::Arc;

use atelier::config::{ConfigError, StudioConfig};
use atelier::notify::TracingNotifier;
use atelier::remote::{HttpJobApi, HttpMediaProbe, RemoteError};
use atelier::services::generation::{self, TaskError};
use atelier::services::persistence::{self, FileStore, PersistenceError};
use atelier::services::tasks::JobKind;
use atelier::services::upload;
use atelier::state::{Collaborators, Studio};
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("file read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("element {0} not found")]
    UnknownElement(Uuid),
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
}

#[derive(Parser, Debug)]
#[command(name = "atelier", about = "Media canvas with remote generation jobs")]
struct Cli {
    /// Board file. Falls back to the configured default when unset.
    #[arg(long, env = "ATELIER_STORE_PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a generation job and wait for its result.
    Generate {
        kind: JobKind,
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Element the result is placed next to.
        #[arg(long)]
        origin: Option<Uuid>,
    },
    /// Resume tracking a job that was submitted earlier.
    Track {
        kind: JobKind,
        task_id: String,
        #[arg(long)]
        origin: Option<Uuid>,
    },
    /// Upload a local file onto the canvas.
    Upload { file: PathBuf },
    /// Add a text element.
    Text { content: String },
    /// Print the board's elements.
    List {
        /// Decode image sizes before printing.
        #[arg(long)]
        probe: bool,
    },
    Remove {
        id: Uuid,
    },
    Undo,
    Redo,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let cli = Cli::parse();
    let mut config = StudioConfig::from_env()?;
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    let api = Arc::new(HttpJobApi::new(config.api_base_url.clone(), config.api_key.clone(), config.timeouts)?);
    let probe = Arc::new(HttpMediaProbe::new(config.timeouts)?);
    tracing::info!(base_url = api.base_url(), store = %config.store_path.display(), "studio configured");

    let studio = Studio::new(
        Collaborators { jobs: api.clone(), uploader: api, probe, notifier: Arc::new(TracingNotifier) },
        config.poll,
    );
    let store = FileStore::new(&config.store_path);
    persistence::load_board(&studio, &store).await?;

    let result = run(&studio, cli.command).await;

    tokio::select! {
        () = studio.wait_for_tasks() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "ctrl-c handler failed");
            }
            tracing::info!("interrupted; stopping pollers");
            studio.shutdown().await;
        }
    }

    persistence::save_board(&studio, &store).await?;
    result
}

async fn run(studio: &Studio, command: Command) -> Result<(), CliError> {
    match command {
        Command::Generate { kind, payload, origin } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)?;
            warn_if_missing(studio, origin).await;
            let id = generation::submit_job(studio, kind, payload, origin).await?;
            eprintln!("submitted {kind} job {id}; waiting for result");
        }
        Command::Track { kind, task_id, origin } => {
            warn_if_missing(studio, origin).await;
            if generation::track_job(studio, task_id.clone(), kind, origin).await {
                eprintln!("tracking {kind} job {task_id}");
            }
        }
        Command::Upload { file } => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| CliError::NoFileName(file.clone()))?;
            let bytes = tokio::fs::read(&file).await?;
            let id = upload::upload_file(studio, &name, bytes).await?;
            println!("{id}");
        }
        Command::Text { content } => {
            let id = upload::add_text(studio, &content).await;
            println!("{id}");
        }
        Command::List { probe } => {
            if probe {
                persistence::rehydrate_media(studio).await;
            }
            print_board(studio).await?;
        }
        Command::Remove { id } => {
            let actions = studio.with_engine(|engine| engine.core.remove_element(&id)).await;
            if actions.is_empty() {
                return Err(CliError::UnknownElement(id));
            }
        }
        Command::Undo => {
            let actions = studio.with_engine(|engine| engine.core.undo()).await;
            if actions.is_empty() {
                eprintln!("nothing to undo");
            }
        }
        Command::Redo => {
            let actions = studio.with_engine(|engine| engine.core.redo()).await;
            if actions.is_empty() {
                eprintln!("nothing to redo");
            }
        }
    }
    Ok(())
}

async fn warn_if_missing(studio: &Studio, origin: Option<Uuid>) {
    let Some(id) = origin else {
        return;
    };
    if studio.engine.read().await.core.element(&id).is_none() {
        tracing::warn!(origin = %id, "origin element not on the board; result will cascade");
    }
}

async fn print_board(studio: &Studio) -> Result<(), CliError> {
    let scene = studio.subscribe().borrow().clone();
    let rows: Vec<serde_json::Value> = scene
        .elements
        .iter()
        .map(|el| -> Result<serde_json::Value, serde_json::Error> {
            let mut row = serde_json::to_value(el)?;
            if let (Some(natural), Some(obj)) = (el.natural, row.as_object_mut()) {
                obj.insert("natural".into(), serde_json::json!([natural.width, natural.height]));
            }
            Ok(row)
        })
        .collect::<Result<_, _>>()?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
