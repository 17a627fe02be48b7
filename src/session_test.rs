use std::time::Duration;

use uuid::Uuid;

use super::*;
use crate::doc::{BoardSettings, ItemDraft, ItemKind};
use crate::input::{Key, Modifiers};
use crate::persistence::MemoryGateway;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

async fn open(gw: &Arc<MemoryGateway>, board_id: Option<BoardId>) -> EditorSession {
    EditorSession::open(gw.clone(), board_id, EditorConfig::default()).await.unwrap()
}

fn add_note(editor: &mut CanvasEditor) -> Vec<Action> {
    editor.add_item(ItemDraft::new(ItemKind::Note, "note")).1
}

// =============================================================================
// Open
// =============================================================================

#[tokio::test(start_paused = true)]
async fn open_new_board_is_empty_and_unsaved() {
    let gw = Arc::new(MemoryGateway::new());
    let session = open(&gw, None).await;
    assert!(session.editor().items().is_empty());
    assert_eq!(session.editor().board_id(), None);
    assert_eq!(session.save_state(), SaveState::Unsaved);
}

#[tokio::test(start_paused = true)]
async fn open_unknown_id_starts_empty_under_that_id() {
    let gw = Arc::new(MemoryGateway::new());
    let id = Uuid::new_v4();
    let mut session = open(&gw, Some(id)).await;
    assert!(session.editor().items().is_empty());

    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert_eq!(gw.get(id).await.unwrap().items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn open_existing_board_loads_items() {
    let gw = Arc::new(MemoryGateway::new());
    let id = Uuid::new_v4();
    gw.insert(BoardRecord {
        id,
        name: "Loft".into(),
        items: vec![crate::doc::Item::new(ItemKind::Color, "#aa3300", 0.0, 0.0, 0)],
        settings: BoardSettings::default(),
        updated_at: 1,
    })
    .await;

    let session = open(&gw, Some(id)).await;
    assert_eq!(session.editor().name(), "Loft");
    assert_eq!(session.editor().items().len(), 1);
    assert_eq!(session.save_state(), SaveState::Saved(id));
}

// =============================================================================
// Saving
// =============================================================================

#[tokio::test(start_paused = true)]
async fn edits_save_after_debounce() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;

    session.apply(add_note).await.unwrap();
    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(1900)).await;
    assert_eq!(gw.save_count(), 0);

    tokio::time::sleep(ms(200)).await;
    assert_eq!(gw.save_count(), 1);
    assert_eq!(gw.board_count().await, 1);

    // a later edit lands on the same board
    session.apply(add_note).await.unwrap();
    assert!(session.editor().board_id().is_some());
    tokio::time::sleep(ms(2100)).await;
    assert_eq!(gw.board_count().await, 1);
    assert_eq!(gw.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn ctrl_s_saves_immediately() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(add_note).await.unwrap();

    let actions = session.apply(|e| e.on_key_down(&Key::new("s"), ctrl())).await.unwrap();
    assert_eq!(actions, vec![Action::SaveRequested]);
    assert_eq!(gw.save_count(), 1);
    let id = session.editor().board_id().unwrap();
    assert_eq!(session.save_state(), SaveState::Saved(id));

    // the pending debounce was cancelled by the manual save
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rename_schedules_save() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(|e| e.rename("Bathroom")).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    let SaveState::Saved(id) = session.save_state() else {
        panic!("expected a save");
    };
    assert_eq!(gw.get(id).await.unwrap().name, "Bathroom");
}

#[tokio::test(start_paused = true)]
async fn selection_alone_does_not_save() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(CanvasEditor::select_all).await.unwrap();
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_editor_state() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    gw.set_failing(true);

    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert!(matches!(session.save_state(), SaveState::Failed(_)));
    assert_eq!(session.editor().items().len(), 1);

    let err = session.save_now().await.unwrap_err();
    assert!(matches!(err, SessionError::Save(SaveError::Gateway(_))));

    gw.set_failing(false);
    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert!(matches!(session.save_state(), SaveState::Saved(_)));
    assert_eq!(session.editor().items().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn refused_manual_save_still_returns_actions() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    gw.set_failing(true);

    let actions = session
        .apply(|e| {
            let mut out = add_note(e);
            out.extend(e.on_key_down(&Key::new("s"), ctrl()));
            out
        })
        .await
        .unwrap();

    assert!(actions.contains(&Action::ItemsChanged { committed: true }));
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::SaveRequested));
    assert!(matches!(session.save_state(), SaveState::Failed(_)));
    assert_eq!(session.editor().items().len(), 1);
    assert_eq!(gw.save_count(), 0);
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test(start_paused = true)]
async fn close_flushes_pending_change() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(add_note).await.unwrap();
    let id = session.close(true).await.unwrap().unwrap();
    assert_eq!(gw.save_count(), 1);
    assert_eq!(gw.get(id).await.unwrap().items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_after_debounced_save_does_not_write_again() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert_eq!(gw.save_count(), 1);

    session.close(true).await.unwrap();
    assert_eq!(gw.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_after_manual_save_does_not_write_again() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(add_note).await.unwrap();
    session.save_now().await.unwrap();

    session.close(true).await.unwrap();
    assert_eq!(gw.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_retries_a_failed_save() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    gw.set_failing(true);
    session.apply(add_note).await.unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert!(matches!(session.save_state(), SaveState::Failed(_)));

    gw.set_failing(false);
    session.close(true).await.unwrap();
    assert_eq!(gw.save_count(), 1);
    assert_eq!(gw.board_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn close_without_flush_discards() {
    let gw = Arc::new(MemoryGateway::new());
    let mut session = open(&gw, None).await;
    session.apply(add_note).await.unwrap();
    session.close(false).await.unwrap();
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_untouched_board_writes_nothing() {
    let gw = Arc::new(MemoryGateway::new());
    let session = open(&gw, None).await;
    session.close(true).await.unwrap();
    assert_eq!(gw.save_count(), 0);
}
