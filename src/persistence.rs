//! Persistence: the board gateway seam and the debounced auto-saver.
//!
//! DESIGN
//! ======
//! The editor never talks to storage. Its owner pushes full board snapshots
//! into an [`AutoSaver`], a background task that waits for a quiet period
//! (debounce, not throttle) and then writes the latest snapshot through a
//! [`BoardGateway`]. A manual save skips the wait. Progress is published on
//! a `watch` channel as [`SaveState`].
//!
//! A board that has never been saved has no id. The first successful save
//! returns one; the worker remembers it and stamps it onto every later
//! request, so a second save never creates a second board.
//!
//! ERROR HANDLING
//! ==============
//! A failed save leaves the editor untouched. The state becomes `Failed`,
//! the error is logged, and the next scheduled change re-arms the timer.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::doc::{Board, BoardId, BoardSettings, Item};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("save rejected: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("auto-saver is no longer running")]
    WorkerGone,
}

/// A board as stored by a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: BoardId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "crate::doc::deserialize_items")]
    pub items: Vec<Item>,
    #[serde(default)]
    pub settings: BoardSettings,
    /// Milliseconds since the Unix epoch of the last save.
    #[serde(default)]
    pub updated_at: i64,
}

impl BoardRecord {
    #[must_use]
    pub fn into_board(self) -> Board {
        Board { id: Some(self.id), name: self.name, items: self.items, settings: self.settings }
    }
}

/// Payload of one save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// `None` asks the gateway to create a new board.
    pub board_id: Option<BoardId>,
    pub name: String,
    pub items: Vec<Item>,
    pub settings: BoardSettings,
    pub updated_at: i64,
}

impl SaveRequest {
    #[must_use]
    pub fn from_board(board: Board, updated_at: i64) -> Self {
        Self { board_id: board.id, name: board.name, items: board.items, settings: board.settings, updated_at }
    }
}

/// Where the auto-saver stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// Changes exist that have not been written.
    Unsaved,
    /// A write is in flight.
    Saving,
    /// The last write succeeded under this id.
    Saved(BoardId),
    /// The last write failed; the message is for display.
    Failed(String),
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Storage seam for boards.
#[async_trait::async_trait]
pub trait BoardGateway: Send + Sync {
    /// Fetch a board. `Ok(None)` means no such board exists.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if storage cannot be read or the stored
    /// document is not a board.
    async fn load(&self, id: BoardId) -> Result<Option<BoardRecord>, GatewayError>;

    /// Create or overwrite a board and return what was stored.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the write fails or is refused.
    async fn save(&self, request: SaveRequest) -> Result<BoardRecord, GatewayError>;
}

/// Process-local gateway. Saves can be made to fail on demand.
#[derive(Default)]
pub struct MemoryGateway {
    boards: Mutex<HashMap<BoardId, BoardRecord>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored board.
    pub async fn insert(&self, record: BoardRecord) {
        self.boards.lock().await.insert(record.id, record);
    }

    /// Make every following save fail with `Unavailable` until switched off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn get(&self, id: BoardId) -> Option<BoardRecord> {
        self.boards.lock().await.get(&id).cloned()
    }

    pub async fn board_count(&self) -> usize {
        self.boards.lock().await.len()
    }
}

#[async_trait::async_trait]
impl BoardGateway for MemoryGateway {
    async fn load(&self, id: BoardId) -> Result<Option<BoardRecord>, GatewayError> {
        Ok(self.boards.lock().await.get(&id).cloned())
    }

    async fn save(&self, request: SaveRequest) -> Result<BoardRecord, GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("memory gateway switched to failing".into()));
        }
        let record = BoardRecord {
            id: request.board_id.unwrap_or_else(Uuid::new_v4),
            name: request.name,
            items: request.items,
            settings: request.settings,
            updated_at: request.updated_at,
        };
        self.boards.lock().await.insert(record.id, record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }
}

/// One pretty-printed JSON document per board, named `<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    dir: PathBuf,
}

impl JsonFileGateway {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, id: BoardId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait::async_trait]
impl BoardGateway for JsonFileGateway {
    async fn load(&self, id: BoardId) -> Result<Option<BoardRecord>, GatewayError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: BoardRecord = serde_json::from_slice(&bytes)?;
        if record.id != id {
            warn!(requested = %id, stored = %record.id, path = %path.display(), "board file id mismatch");
            return Err(GatewayError::Rejected(format!("{} holds board {}", path.display(), record.id)));
        }
        Ok(Some(record))
    }

    async fn save(&self, request: SaveRequest) -> Result<BoardRecord, GatewayError> {
        let record = BoardRecord {
            id: request.board_id.unwrap_or_else(Uuid::new_v4),
            name: request.name,
            items: request.items,
            settings: request.settings,
            updated_at: request.updated_at,
        };
        let bytes = serde_json::to_vec_pretty(&record)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write beside the target and rename so readers never see a torn file.
        let path = self.path_for(record.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(board_id = %record.id, bytes = bytes.len(), "board file written");
        Ok(record)
    }
}

// =============================================================================
// AUTO-SAVER
// =============================================================================

enum Command {
    Schedule(SaveRequest),
    SaveNow(SaveRequest, oneshot::Sender<Result<BoardRecord, SaveError>>),
    Flush(oneshot::Sender<Result<Option<BoardRecord>, SaveError>>),
    Cancel,
    Shutdown,
}

/// Handle to the debounced save worker.
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SaveState>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Spawn the worker. `board_id` is the id of an already-stored board,
    /// or `None` for a board the first save will create.
    #[must_use]
    pub fn spawn(gateway: Arc<dyn BoardGateway>, debounce: Duration, board_id: Option<BoardId>) -> Self {
        let initial = match board_id {
            Some(id) => SaveState::Saved(id),
            None => SaveState::Unsaved,
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (tx, rx) = mpsc::unbounded_channel();

        info!(?debounce, ?board_id, "auto-saver started");
        let worker = Worker { gateway, debounce, board_id, state: state_tx };
        let task = tokio::spawn(worker.run(rx));
        Self { tx, state: state_rx, task }
    }

    /// Replace the pending payload and restart the quiet-period timer.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::WorkerGone`] if the worker has stopped.
    pub fn schedule(&self, request: SaveRequest) -> Result<(), SaveError> {
        self.send(Command::Schedule(request))
    }

    /// Drop any pending payload and save `request` immediately.
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the save, or [`SaveError::WorkerGone`]
    /// if the worker has stopped.
    pub async fn save_now(&self, request: SaveRequest) -> Result<BoardRecord, SaveError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::SaveNow(request, reply_tx))?;
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(SaveError::WorkerGone),
        }
    }

    /// Save the pending payload now instead of waiting out the timer.
    /// Returns `None` when nothing was pending, including when the last
    /// debounced save already wrote it.
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the save, or [`SaveError::WorkerGone`]
    /// if the worker has stopped.
    pub async fn flush(&self) -> Result<Option<BoardRecord>, SaveError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Flush(reply_tx))?;
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(SaveError::WorkerGone),
        }
    }

    /// Drop the pending payload without saving it.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::WorkerGone`] if the worker has stopped.
    pub fn cancel(&self) -> Result<(), SaveError> {
        self.send(Command::Cancel)
    }

    /// Stop the worker and wait for it. A pending payload is discarded;
    /// call [`AutoSaver::flush`] first to keep it.
    pub async fn shutdown(self) {
        if self.send(Command::Shutdown).is_err() {
            debug!("auto-saver already stopped");
        }
        if let Err(e) = self.task.await {
            error!(error = %e, "auto-saver task failed");
        }
    }

    #[must_use]
    pub fn state(&self) -> SaveState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state.clone()
    }

    fn send(&self, cmd: Command) -> Result<(), SaveError> {
        self.tx.send(cmd).map_err(|_| SaveError::WorkerGone)
    }
}

struct Worker {
    gateway: Arc<dyn BoardGateway>,
    debounce: Duration,
    board_id: Option<BoardId>,
    state: watch::Sender<SaveState>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut pending: Option<SaveRequest> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(Command::Schedule(request)) => {
                        pending = Some(request);
                        deadline = Some(Instant::now() + self.debounce);
                        self.set_state(SaveState::Unsaved);
                    }
                    Some(Command::SaveNow(request, reply)) => {
                        pending = None;
                        deadline = None;
                        let result = self.save(request).await;
                        if reply.send(result).is_err() {
                            debug!("save_now caller went away before the reply");
                        }
                    }
                    Some(Command::Flush(reply)) => {
                        deadline = None;
                        let result = match pending.take() {
                            Some(request) => self.save(request).await.map(Some),
                            None => Ok(None),
                        };
                        if reply.send(result).is_err() {
                            debug!("flush caller went away before the reply");
                        }
                    }
                    Some(Command::Cancel) => {
                        if pending.take().is_some() {
                            debug!("pending auto-save cancelled");
                        }
                        deadline = None;
                    }
                    Some(Command::Shutdown) | None => break,
                },
                () = wait_until(deadline) => {
                    deadline = None;
                    if let Some(request) = pending.take() {
                        if let Err(e) = self.save(request).await {
                            debug!(error = %e, "debounced save failed");
                        }
                    }
                }
            }
        }

        if pending.is_some() {
            warn!("auto-saver stopped with an unsaved pending change");
        }
        info!("auto-saver stopped");
    }

    async fn save(&mut self, mut request: SaveRequest) -> Result<BoardRecord, SaveError> {
        if request.board_id.is_none() {
            request.board_id = self.board_id;
        }
        let count = request.items.len();
        self.set_state(SaveState::Saving);

        match self.gateway.save(request).await {
            Ok(record) => {
                if self.board_id != Some(record.id) {
                    info!(board_id = %record.id, "board id assigned");
                }
                self.board_id = Some(record.id);
                info!(board_id = %record.id, items = count, "board saved");
                self.set_state(SaveState::Saved(record.id));
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, board_id = ?self.board_id, items = count, "board save failed");
                self.set_state(SaveState::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }

    fn set_state(&self, next: SaveState) {
        self.state.send_modify(|s| *s = next);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
