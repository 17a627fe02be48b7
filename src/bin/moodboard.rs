use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use moodboard::camera::Point;
use moodboard::config::EditorConfig;
use moodboard::doc::BoardSettings;
use moodboard::editor::{Action, AssetInsert, CanvasEditor};
use moodboard::input::{Button, InteractionMode, Key, Modifiers, WheelDelta};
use moodboard::persistence::{BoardGateway, JsonFileGateway, SaveError, SaveState};
use moodboard::session::{EditorSession, SessionError};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read script {path}: {source}")]
    ReadScript { path: PathBuf, source: std::io::Error },
    #[error("invalid script: {0}")]
    InvalidScript(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Parser, Debug)]
#[command(name = "moodboard", about = "Replay an input script against a moodboard")]
struct Cli {
    /// Directory holding one `<board-id>.json` file per board.
    #[arg(long, env = "MOODBOARD_DIR", default_value = "boards")]
    dir: PathBuf,

    /// Board to open; a new board is created when omitted.
    #[arg(long, env = "MOODBOARD_BOARD")]
    board: Option<Uuid>,

    /// Print the final view model as JSON.
    #[arg(long)]
    print_view: bool,

    /// Discard unsaved changes on exit instead of flushing them.
    #[arg(long)]
    no_flush: bool,

    /// JSON array of script steps.
    script: PathBuf,
}

/// One replayed host event. Coordinates are screen pixels.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Viewport { width: f64, height: f64 },
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Insert(AssetInsert),
    Mode { mode: InteractionMode },
    Rename { name: String },
    Settings(BoardSettings),
    BringToFront,
    SendToBack,
    Wait { ms: u64 },
    Save,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let raw = tokio::fs::read_to_string(&cli.script)
        .await
        .map_err(|source| CliError::ReadScript { path: cli.script.clone(), source })?;
    let steps: Vec<Step> = serde_json::from_str(&raw)?;

    let gateway: Arc<dyn BoardGateway> = Arc::new(JsonFileGateway::new(&cli.dir));
    let mut session = EditorSession::open(gateway, cli.board, EditorConfig::from_env()).await?;
    info!(steps = steps.len(), dir = %cli.dir.display(), "replaying script");

    let replayed = replay(&mut session, steps, cli.print_view).await;
    // the worker is always shut down; a broken replay skips the flush
    let closed = session.close(replayed.is_ok() && !cli.no_flush).await;
    replayed?;
    match closed? {
        Some(id) => eprintln!("board: {id}"),
        None => eprintln!("board: unsaved"),
    }
    Ok(())
}

async fn replay(session: &mut EditorSession, steps: Vec<Step>, print_view: bool) -> Result<(), CliError> {
    for step in steps {
        run_step(session, step).await?;
    }

    if print_view {
        let rendered = serde_json::to_string_pretty(&session.editor().view_model())?;
        println!("{rendered}");
    }
    Ok(())
}

async fn run_step(session: &mut EditorSession, step: Step) -> Result<(), CliError> {
    debug!(?step, "step");
    let actions = match step {
        Step::Viewport { width, height } => session.apply(|e| e.set_viewport(width, height)).await?,
        Step::PointerDown { x, y, button, modifiers } => {
            session.apply(|e| e.on_pointer_down(Point::new(x, y), button, modifiers)).await?
        }
        Step::PointerMove { x, y, modifiers } => {
            session.apply(|e| e.on_pointer_move(Point::new(x, y), modifiers)).await?
        }
        Step::PointerUp { x, y, button, modifiers } => {
            session.apply(|e| e.on_pointer_up(Point::new(x, y), button, modifiers)).await?
        }
        Step::Wheel { x, y, dx, dy, modifiers } => {
            session.apply(|e| e.on_wheel(Point::new(x, y), WheelDelta { dx, dy }, modifiers)).await?
        }
        Step::Key { key, modifiers } => session.apply(|e| e.on_key_down(&Key::new(key), modifiers)).await?,
        Step::Insert(asset) => session.apply(|e| e.insert_asset(asset).1).await?,
        Step::Mode { mode } => session.apply(|e| e.set_mode(mode)).await?,
        Step::Rename { name } => session.apply(|e| e.rename(&name)).await?,
        Step::Settings(settings) => session.apply(|e| e.set_settings(settings)).await?,
        Step::BringToFront => session.apply(CanvasEditor::bring_to_front).await?,
        Step::SendToBack => session.apply(CanvasEditor::send_to_back).await?,
        Step::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Vec::new()
        }
        Step::Save => {
            match session.save_now().await {
                Ok(record) => eprintln!("saved {} ({} items)", record.id, record.items.len()),
                Err(SessionError::Save(SaveError::Gateway(e))) => eprintln!("save failed: {e}"),
                Err(e) => return Err(e.into()),
            }
            Vec::new()
        }
    };

    if actions.contains(&Action::SaveRequested) {
        if let SaveState::Failed(reason) = session.save_state() {
            eprintln!("save failed: {reason}");
        }
    }
    let committed = actions.iter().any(|a| matches!(a, Action::ItemsChanged { committed: true }));
    if committed {
        debug!(items = session.editor().items().len(), state = ?session.save_state(), "committed");
    }
    Ok(())
}
