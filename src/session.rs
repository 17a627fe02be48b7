//! Editor session: a [`CanvasEditor`] wired to storage.
//!
//! The session opens a board through a [`BoardGateway`], hands every editor
//! call's actions to the auto-saver (changes schedule a debounced save, a
//! save request saves immediately), and flushes on close.
//!
//! A failed save never undoes or hides local edits: the actions still reach
//! the host and the failure shows up as [`SaveState::Failed`].

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::doc::{Board, BoardId};
use crate::editor::{Action, CanvasEditor};
use crate::persistence::{AutoSaver, BoardGateway, BoardRecord, GatewayError, SaveError, SaveRequest, SaveState, now_ms};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to open board: {0}")]
    Open(#[from] GatewayError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

pub struct EditorSession {
    editor: CanvasEditor,
    saver: AutoSaver,
}

impl EditorSession {
    /// Open `board_id`, or start a new board when `None`. An id the gateway
    /// does not know yields an empty board that the first save creates
    /// under that id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Open`] if the gateway fails to load.
    pub async fn open(
        gateway: Arc<dyn BoardGateway>,
        board_id: Option<BoardId>,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let (board, stored) = match board_id {
            Some(id) => match gateway.load(id).await? {
                Some(record) => (record.into_board(), true),
                None => {
                    info!(board_id = %id, "board not stored yet; starting empty");
                    (Board { id: Some(id), ..Board::default() }, false)
                }
            },
            None => (Board::default(), false),
        };

        let saved_id = if stored { board.id } else { None };
        let saver = AutoSaver::spawn(gateway, config.save_debounce(), saved_id);
        let mut editor = CanvasEditor::new(config);
        editor.load_board(board);
        Ok(Self { editor, saver })
    }

    #[must_use]
    pub fn editor(&self) -> &CanvasEditor {
        &self.editor
    }

    /// Direct access for calls whose actions the caller forwards through
    /// [`EditorSession::handle`] itself.
    pub fn editor_mut(&mut self) -> &mut CanvasEditor {
        &mut self.editor
    }

    /// Run one editor call and route its actions.
    ///
    /// # Errors
    ///
    /// See [`EditorSession::handle`].
    pub async fn apply<F>(&mut self, call: F) -> Result<Vec<Action>, SessionError>
    where
        F: FnOnce(&mut CanvasEditor) -> Vec<Action>,
    {
        let actions = call(&mut self.editor);
        self.handle(actions).await
    }

    /// Route editor actions to persistence and return them for the host.
    ///
    /// Item, settings and name changes schedule a debounced save; a save
    /// request saves immediately. A save the gateway refuses is logged and
    /// left in [`SaveState::Failed`]; the actions are returned regardless.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Save`] only if the auto-saver has stopped.
    pub async fn handle(&mut self, actions: Vec<Action>) -> Result<Vec<Action>, SessionError> {
        self.adopt_saved_id();
        let changed = actions
            .iter()
            .any(|a| matches!(a, Action::ItemsChanged { .. } | Action::SettingsChanged));
        let save_requested = actions.contains(&Action::SaveRequested);

        if save_requested {
            match self.save_now().await {
                Ok(_) => {}
                Err(SessionError::Save(SaveError::Gateway(e))) => {
                    warn!(error = %e, "manual save failed; local edits kept");
                }
                Err(e) => return Err(e),
            }
        } else if changed {
            self.saver.schedule(self.request())?;
        }
        Ok(actions)
    }

    /// Save the current board now, bypassing the debounce.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Save`] if the gateway refuses the write.
    pub async fn save_now(&mut self) -> Result<BoardRecord, SessionError> {
        let record = self.saver.save_now(self.request()).await?;
        self.editor.set_board_id(record.id);
        Ok(record)
    }

    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.saver.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.saver.subscribe()
    }

    /// End the session and return the board's id, if it has one by now.
    /// With `flush`, a change still waiting on the debounce is written
    /// first, and a board whose last save failed is saved again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Save`] if the flushing save fails. The worker
    /// is stopped either way.
    pub async fn close(mut self, flush: bool) -> Result<Option<BoardId>, SessionError> {
        let result = if flush { self.flush().await } else { Ok(()) };
        self.adopt_saved_id();
        self.saver.shutdown().await;
        result.map(|()| self.editor.board_id())
    }

    async fn flush(&mut self) -> Result<(), SessionError> {
        if let Some(record) = self.saver.flush().await? {
            debug!(board_id = %record.id, "pending change flushed before close");
            self.editor.set_board_id(record.id);
            return Ok(());
        }
        if let SaveState::Failed(reason) = self.saver.state() {
            debug!(%reason, "retrying failed save before close");
            self.save_now().await?;
        }
        Ok(())
    }

    fn request(&self) -> SaveRequest {
        SaveRequest::from_board(self.editor.board_snapshot(), now_ms())
    }

    /// Carry an id assigned by a debounced save back into the editor.
    fn adopt_saved_id(&mut self) {
        if self.editor.board_id().is_some() {
            return;
        }
        if let SaveState::Saved(id) = self.saver.state() {
            self.editor.set_board_id(id);
        }
    }
}
