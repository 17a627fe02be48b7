#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::doc::ItemKind;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn request(name: &str) -> SaveRequest {
    SaveRequest {
        board_id: None,
        name: name.into(),
        items: vec![Item::new(ItemKind::Note, "hello", 10.0, 20.0, 0)],
        settings: BoardSettings::default(),
        updated_at: 0,
    }
}

fn spawn(gw: &Arc<MemoryGateway>, board_id: Option<BoardId>) -> AutoSaver {
    AutoSaver::spawn(gw.clone(), ms(2000), board_id)
}

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("moodboard-test-{}", Uuid::new_v4()))
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn debounced_save_fires_after_quiet_period() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);

    saver.schedule(request("one")).unwrap();
    tokio::time::sleep(ms(1999)).await;
    assert_eq!(gw.save_count(), 0);
    assert_eq!(saver.state(), SaveState::Unsaved);

    tokio::time::sleep(ms(2)).await;
    assert_eq!(gw.save_count(), 1);
    assert!(matches!(saver.state(), SaveState::Saved(_)));
}

#[tokio::test(start_paused = true)]
async fn rapid_changes_coalesce_into_latest_payload() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);

    saver.schedule(request("first")).unwrap();
    tokio::time::sleep(ms(1500)).await;
    saver.schedule(request("second")).unwrap();
    tokio::time::sleep(ms(1500)).await;
    // timer restarted at 1500, so nothing yet at 3000
    assert_eq!(gw.save_count(), 0);

    tokio::time::sleep(ms(600)).await;
    assert_eq!(gw.save_count(), 1);
    let SaveState::Saved(id) = saver.state() else {
        panic!("expected saved state, got {:?}", saver.state());
    };
    assert_eq!(gw.get(id).await.unwrap().name, "second");
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_payload() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    saver.schedule(request("draft")).unwrap();
    saver.cancel().unwrap();
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 0);
}

// =============================================================================
// Manual save and id assignment
// =============================================================================

#[tokio::test(start_paused = true)]
async fn save_now_skips_the_wait_and_cancels_pending() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);

    saver.schedule(request("pending")).unwrap();
    let record = saver.save_now(request("manual")).await.unwrap();
    assert_eq!(record.name, "manual");
    assert_eq!(gw.save_count(), 1);

    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 1);
    assert_eq!(saver.state(), SaveState::Saved(record.id));
}

#[tokio::test(start_paused = true)]
async fn flush_writes_pending_payload_once() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);

    saver.schedule(request("pending")).unwrap();
    let record = saver.flush().await.unwrap().unwrap();
    assert_eq!(record.name, "pending");
    assert_eq!(gw.save_count(), 1);

    // the debounce timer was disarmed by the flush
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 1);
    assert!(saver.flush().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn flush_after_debounced_save_has_nothing_to_do() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    saver.schedule(request("settled")).unwrap();
    tokio::time::sleep(ms(2100)).await;

    assert!(saver.flush().await.unwrap().is_none());
    assert_eq!(gw.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn first_save_assigns_id_reused_afterwards() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);

    let first = saver.save_now(request("v1")).await.unwrap();
    saver.schedule(request("v2")).unwrap();
    tokio::time::sleep(ms(2100)).await;

    assert_eq!(gw.save_count(), 2);
    assert_eq!(gw.board_count().await, 1);
    assert_eq!(gw.get(first.id).await.unwrap().name, "v2");
    assert_eq!(saver.state(), SaveState::Saved(first.id));
}

#[tokio::test(start_paused = true)]
async fn existing_board_starts_saved() {
    let gw = Arc::new(MemoryGateway::new());
    let id = Uuid::new_v4();
    let saver = spawn(&gw, Some(id));
    assert_eq!(saver.state(), SaveState::Saved(id));

    saver.schedule(request("edit")).unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert_eq!(gw.get(id).await.unwrap().name, "edit");
}

// =============================================================================
// Failures and shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn failed_save_reports_and_next_change_retries() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    gw.set_failing(true);

    saver.schedule(request("doomed")).unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert!(matches!(saver.state(), SaveState::Failed(_)));
    assert_eq!(gw.save_count(), 0);

    gw.set_failing(false);
    saver.schedule(request("retry")).unwrap();
    tokio::time::sleep(ms(2100)).await;
    assert_eq!(gw.save_count(), 1);
    assert!(matches!(saver.state(), SaveState::Saved(_)));
}

#[tokio::test(start_paused = true)]
async fn save_now_returns_gateway_error() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    gw.set_failing(true);
    let err = saver.save_now(request("x")).await.unwrap_err();
    assert!(matches!(err, SaveError::Gateway(GatewayError::Unavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    saver.schedule(request("lost")).unwrap();
    saver.shutdown().await;
    tokio::time::sleep(ms(5000)).await;
    assert_eq!(gw.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_saving_then_saved() {
    let gw = Arc::new(MemoryGateway::new());
    let saver = spawn(&gw, None);
    let mut rx = saver.subscribe();
    saver.schedule(request("watched")).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SaveState::Unsaved);
    tokio::time::sleep(ms(2100)).await;
    assert!(matches!(*rx.borrow_and_update(), SaveState::Saved(_)));
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn record_deserialization_repairs_items() {
    let id = Uuid::new_v4();
    let record: BoardRecord = serde_json::from_value(json!({
        "id": id,
        "name": "Living room",
        "items": [
            { "type": "note", "content": "ok", "position": { "x": 1, "y": 2, "z": 0 }, "size": { "width": 5, "height": 300 } },
            { "type": "hologram" },
            42
        ]
    }))
    .unwrap();
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].size.width, 20.0);
    assert_eq!(record.settings, BoardSettings::default());

    let board = record.into_board();
    assert_eq!(board.id, Some(id));
    assert_eq!(board.name, "Living room");
}

#[test]
fn save_request_from_board() {
    let board = Board { id: None, name: "b".into(), items: vec![], settings: BoardSettings::default() };
    let req = SaveRequest::from_board(board, 7);
    assert_eq!(req.board_id, None);
    assert_eq!(req.updated_at, 7);
}

#[test]
fn now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

// =============================================================================
// JsonFileGateway
// =============================================================================

#[tokio::test]
async fn json_gateway_round_trips_a_board() {
    let dir = temp_dir();
    let gw = JsonFileGateway::new(&dir);

    let saved = gw.save(request("file board")).await.unwrap();
    assert!(gw.path_for(saved.id).exists());
    let loaded = gw.load(saved.id).await.unwrap().unwrap();
    assert_eq!(loaded, saved);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn json_gateway_missing_board_is_none() {
    let gw = JsonFileGateway::new(temp_dir());
    assert!(gw.load(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn json_gateway_rejects_mismatched_file() {
    let dir = temp_dir();
    let gw = JsonFileGateway::new(&dir);
    let saved = gw.save(request("a")).await.unwrap();
    let other = Uuid::new_v4();
    tokio::fs::copy(gw.path_for(saved.id), gw.path_for(other)).await.unwrap();

    let err = gw.load(other).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(_)));
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn json_gateway_reports_garbage() {
    let dir = temp_dir();
    let gw = JsonFileGateway::new(&dir);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let id = Uuid::new_v4();
    tokio::fs::write(gw.path_for(id), b"not json").await.unwrap();

    let err = gw.load(id).await.unwrap_err();
    assert!(matches!(err, GatewayError::Serialization(_)));
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
