//! Canvas editor: the orchestrator that owns board state and routes input.
//!
//! `CanvasEditor` is synchronous and single-owner. Pointer, wheel and
//! keyboard events go in; the editor mutates its item store, selection and
//! camera, and answers with the [`Action`]s its host should act on
//! (re-render, change the cursor, schedule or force a save). Storage is not
//! reached from here; see [`crate::session`].
//!
//! Gestures preview directly into the store and commit one history entry on
//! pointer-up. Discrete commands commit immediately. Undo and redo replace
//! the whole item set with a snapshot and clear the selection.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::camera::{Camera, Point, Rect};
use crate::clipboard::{Clipboard, drafts_for, paste_drafts};
use crate::config::EditorConfig;
use crate::consts::{DEFAULT_GRID_SIZE, WHEEL_ZOOM_PIXELS, ZOOM_STEP};
use crate::doc::{Board, BoardId, BoardSettings, Item, ItemDraft, ItemId, ItemKind, ItemPatch, ItemStore, Size};
use crate::grouping;
use crate::hit::{HitPart, ResizeAnchor, hit_test};
use crate::history::History;
use crate::input::{Button, InputState, InteractionMode, Key, Modifiers, WheelDelta};
use crate::layering;
use crate::selection::{Selection, box_select};
use crate::shortcuts::{Shortcut, resolve};
use crate::transform::{self, Snapping};
use crate::view::{self, LayerEntry, ViewModel, ViewSource};

/// What the host should do after an editor call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Items changed. `committed` is false for gesture previews.
    ItemsChanged { committed: bool },
    SelectionChanged,
    /// Board settings or name changed.
    SettingsChanged,
    CameraChanged,
    /// The user asked for an immediate save.
    SaveRequested,
    SetCursor(&'static str),
    RenderNeeded,
}

/// Request to drop an asset or generated item onto the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInsert {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub content: String,
    /// Optional `size`, `style`, `metadata` and `rotation` overrides.
    #[serde(default)]
    pub extra: Value,
}

impl AssetInsert {
    #[must_use]
    pub fn new(kind: ItemKind, content: impl Into<String>) -> Self {
        Self { kind, content: content.into(), extra: Value::Null }
    }
}

pub struct CanvasEditor {
    board_id: Option<BoardId>,
    name: String,
    store: ItemStore,
    selection: Selection,
    camera: Camera,
    mode: InteractionMode,
    settings: BoardSettings,
    history: History,
    clipboard: Clipboard,
    input: InputState,
    viewport_width: f64,
    viewport_height: f64,
    text_input_focused: bool,
    cursor: &'static str,
    config: EditorConfig,
}

impl Default for CanvasEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl CanvasEditor {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            board_id: None,
            name: String::new(),
            store: ItemStore::new(),
            selection: Selection::new(),
            camera: Camera::default(),
            mode: InteractionMode::Select,
            settings: BoardSettings::default(),
            history: History::new(config.history_depth),
            clipboard: Clipboard::new(),
            input: InputState::Idle,
            viewport_width: 0.0,
            viewport_height: 0.0,
            text_input_focused: false,
            cursor: "default",
            config,
        }
    }

    // --- Board ---

    /// Replace the whole board. History restarts from the loaded items; the
    /// clipboard survives.
    pub fn load_board(&mut self, board: Board) -> Vec<Action> {
        info!(board_id = ?board.id, items = board.items.len(), "board loaded");
        self.board_id = board.id;
        self.name = board.name;
        self.settings = sanitize_settings(board.settings);
        self.store = ItemStore::from_items(board.items);
        self.history.reset(self.store.to_vec());
        self.selection.clear();
        self.input = InputState::Idle;
        vec![Action::SelectionChanged, Action::SettingsChanged, Action::RenderNeeded]
    }

    /// The board as it should be persisted right now.
    #[must_use]
    pub fn board_snapshot(&self) -> Board {
        Board {
            id: self.board_id,
            name: self.name.clone(),
            items: self.store.to_vec(),
            settings: self.settings.clone(),
        }
    }

    /// Record the id storage assigned to this board.
    pub fn set_board_id(&mut self, id: BoardId) {
        self.board_id = Some(id);
    }

    pub fn rename(&mut self, name: &str) -> Vec<Action> {
        let name = name.trim();
        if name == self.name {
            return Vec::new();
        }
        self.name = name.to_string();
        vec![Action::SettingsChanged]
    }

    /// Replace the board settings. A non-positive grid size falls back to the default.
    pub fn set_settings(&mut self, settings: BoardSettings) -> Vec<Action> {
        let settings = sanitize_settings(settings);
        if settings == self.settings {
            return Vec::new();
        }
        self.settings = settings;
        vec![Action::SettingsChanged, Action::RenderNeeded]
    }

    // --- Viewport / mode ---

    pub fn set_viewport(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        vec![Action::RenderNeeded]
    }

    /// Where the canvas element sits in pointer-event coordinates.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.camera.origin_x = x;
        self.camera.origin_y = y;
    }

    pub fn set_mode(&mut self, mode: InteractionMode) -> Vec<Action> {
        if mode == self.mode {
            return Vec::new();
        }
        self.mode = mode;
        let cursor = match mode {
            InteractionMode::Pan => "grab",
            InteractionMode::Select => "default",
        };
        let mut out = Vec::new();
        self.push_cursor(cursor, &mut out);
        out
    }

    /// While set, keyboard shortcuts are left to the focused text input.
    pub fn set_text_input_focused(&mut self, focused: bool) {
        self.text_input_focused = focused;
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if self.input.is_active() {
            return Vec::new();
        }
        let mut out = Vec::new();

        if button == Button::Middle || (button == Button::Primary && self.mode == InteractionMode::Pan) {
            self.input = InputState::Panning { last_screen: screen_pt };
            self.push_cursor("grabbing", &mut out);
            return out;
        }
        if button != Button::Primary {
            return out;
        }

        let canvas_pt = self.camera.screen_to_canvas(screen_pt);
        let hit = hit_test(canvas_pt, &self.store, &self.camera, &self.selection);
        match hit {
            Some(hit) => match hit.part {
                HitPart::ResizeHandle(anchor) => self.start_resize(hit.item_id, anchor, screen_pt, &mut out),
                HitPart::RotateHandle => self.start_rotate(hit.item_id, &mut out),
                HitPart::Body => self.start_drag(hit.item_id, screen_pt, modifiers, &mut out),
            },
            None => {
                if !modifiers.toggles_selection() && !self.selection.is_empty() {
                    self.selection.clear();
                    out.push(Action::SelectionChanged);
                }
                self.input = InputState::BoxSelecting { anchor: canvas_pt, current: canvas_pt };
                out.push(Action::RenderNeeded);
            }
        }
        out
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut out = Vec::new();
        let snapping = self.snapping();
        let canvas_pt = self.camera.screen_to_canvas(screen_pt);

        match &mut self.input {
            InputState::Idle => {
                let cursor = self.hover_cursor(canvas_pt);
                self.push_cursor(cursor, &mut out);
            }
            InputState::Panning { last_screen } => {
                let dx = screen_pt.x - last_screen.x;
                let dy = screen_pt.y - last_screen.y;
                *last_screen = screen_pt;
                if dx != 0.0 || dy != 0.0 {
                    self.camera.pan_by(dx, dy);
                    out.push(Action::CameraChanged);
                    out.push(Action::RenderNeeded);
                }
            }
            InputState::DraggingItems { start_screen, seeds, moved } => {
                let delta = Point::new(screen_pt.x - start_screen.x, screen_pt.y - start_screen.y);
                if transform::apply_drag(&mut self.store, seeds, delta, &self.camera, snapping) {
                    *moved = seeds.iter().any(|s| {
                        self.store
                            .get(&s.id)
                            .is_some_and(|i| i.position.x != s.start_x || i.position.y != s.start_y)
                    });
                    out.push(Action::ItemsChanged { committed: false });
                    out.push(Action::RenderNeeded);
                }
            }
            InputState::ResizingItem { id, anchor, start_screen, orig_x, orig_y, orig_w, orig_h, moved } => {
                let start = Rect::new(*orig_x, *orig_y, *orig_w, *orig_h);
                let delta = Point::new(
                    self.camera.screen_dist_to_canvas(screen_pt.x - start_screen.x),
                    self.camera.screen_dist_to_canvas(screen_pt.y - start_screen.y),
                );
                let bounds = transform::resized_bounds(start, *anchor, delta, snapping);
                if transform::apply_bounds(&mut self.store, id, bounds) {
                    *moved = bounds != start;
                    out.push(Action::ItemsChanged { committed: false });
                    out.push(Action::RenderNeeded);
                }
            }
            InputState::RotatingItem { id, center, orig_rotation, moved } => {
                let degrees = transform::rotation_for_pointer(*center, canvas_pt);
                if transform::apply_rotation(&mut self.store, id, degrees) {
                    *moved = degrees != *orig_rotation;
                    out.push(Action::ItemsChanged { committed: false });
                    out.push(Action::RenderNeeded);
                }
            }
            InputState::BoxSelecting { current, .. } => {
                *current = canvas_pt;
                out.push(Action::RenderNeeded);
            }
        }
        out
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_active() {
            return Vec::new();
        }
        let mut out = self.on_pointer_move(screen_pt, modifiers);

        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::Panning { .. } => {
                let cursor = self.idle_cursor();
                self.push_cursor(cursor, &mut out);
            }
            InputState::DraggingItems { seeds, moved, .. } => {
                if moved {
                    debug!(items = seeds.len(), "drag committed");
                    self.commit(&mut out);
                }
            }
            InputState::ResizingItem { id, moved, .. } => {
                if moved {
                    debug!(item = %id, "resize committed");
                    self.commit(&mut out);
                }
            }
            InputState::RotatingItem { id, moved, .. } => {
                if moved {
                    debug!(item = %id, "rotation committed");
                    self.commit(&mut out);
                }
            }
            InputState::BoxSelecting { anchor, current } => {
                let rect = Rect::from_corners(anchor, current);
                let ids = box_select(self.store.items(), &rect);
                if !ids.is_empty() {
                    self.selection.select_many(ids);
                    out.push(Action::SelectionChanged);
                }
                out.push(Action::RenderNeeded);
            }
        }
        out
    }

    /// Ctrl/Cmd + wheel zooms around the cursor; a plain wheel pans.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.primary() {
            let factor = ZOOM_STEP.powf(-delta.dy / WHEEL_ZOOM_PIXELS);
            self.camera.zoom_at(screen_pt, self.camera.zoom * factor);
        } else {
            self.camera.pan_by(-delta.dx, -delta.dy);
        }
        vec![Action::CameraChanged, Action::RenderNeeded]
    }

    // --- Keyboard ---

    /// Run the shortcut bound to `key`, if any. While a pointer gesture is
    /// active only Escape, undo, redo and save are honoured.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let Some(shortcut) = resolve(key, modifiers, self.text_input_focused) else {
            return Vec::new();
        };
        if self.input.is_active()
            && !matches!(shortcut, Shortcut::ClearSelection | Shortcut::Undo | Shortcut::Redo | Shortcut::Save)
        {
            return Vec::new();
        }
        match shortcut {
            Shortcut::Nudge { dx, dy } => self.nudge_selection(dx, dy),
            Shortcut::Delete => self.delete_selection(),
            Shortcut::Undo => self.undo(),
            Shortcut::Redo => self.redo(),
            Shortcut::SelectAll => self.select_all(),
            Shortcut::Copy => self.copy(),
            Shortcut::Cut => self.cut(),
            Shortcut::Paste => self.paste(),
            Shortcut::Duplicate => self.duplicate(),
            Shortcut::Group => self.group(),
            Shortcut::Ungroup => self.ungroup(),
            Shortcut::Save => vec![Action::SaveRequested],
            Shortcut::ClearSelection => {
                if self.input.is_active() {
                    self.cancel_gesture()
                } else {
                    self.clear_selection()
                }
            }
        }
    }

    // --- Items ---

    /// Add an item on top of the stack, select it alone and commit.
    pub fn add_item(&mut self, draft: ItemDraft) -> (ItemId, Vec<Action>) {
        let mut draft = draft;
        draft.position.z = self.store.next_z();
        let id = Uuid::new_v4();
        self.store.insert(draft.into_item(id));
        self.selection.select_single(id);
        debug!(item = %id, "item added");

        let mut out = vec![Action::SelectionChanged];
        self.commit(&mut out);
        (id, out)
    }

    /// Place an asset centred in the visible viewport.
    pub fn insert_asset(&mut self, asset: AssetInsert) -> (ItemId, Vec<Action>) {
        let mut draft = ItemDraft::new(asset.kind, asset.content);
        apply_extra(&mut draft, &asset.extra);

        let center = self.viewport_center();
        draft.position.x = center.x - draft.size.width / 2.0;
        draft.position.y = center.y - draft.size.height / 2.0;
        self.add_item(draft)
    }

    /// Delete selected items. Locked items stay; the selection is cleared.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let ids = self.selection.ids();
        let mut removed = 0;
        for id in &ids {
            if self.store.get(id).is_some_and(|i| !i.locked) && self.store.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed == 0 {
            return Vec::new();
        }
        self.selection.clear();
        debug!(removed, kept = ids.len() - removed, "selection deleted");
        let mut out = vec![Action::SelectionChanged];
        self.commit(&mut out);
        out
    }

    /// Move selected unlocked items by a canvas-space offset. One commit per call.
    pub fn nudge_selection(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let ids = self.transform_targets();
        if transform::nudge(&mut self.store, &ids, dx, dy) == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.commit(&mut out);
        out
    }

    /// Merge a content/style/metadata patch into one item.
    pub fn update_item(&mut self, id: &ItemId, patch: &ItemPatch) -> Vec<Action> {
        if patch.is_empty() {
            return Vec::new();
        }
        let Some(item) = self.store.get(id) else {
            return Vec::new();
        };
        let mut updated = item.clone();
        if !patch.apply(&mut updated) {
            warn!(item = %id, "item patch has a non-object style or metadata; ignoring");
            return Vec::new();
        }
        if updated == *item {
            return Vec::new();
        }
        self.store.insert(updated);
        let mut out = Vec::new();
        self.commit(&mut out);
        out
    }

    pub fn set_locked(&mut self, ids: &[ItemId], locked: bool) -> Vec<Action> {
        let mut changed = false;
        for id in ids {
            if let Some(item) = self.store.get_mut(id) {
                if item.locked != locked {
                    item.locked = locked;
                    changed = true;
                }
            }
        }
        let mut out = Vec::new();
        if changed {
            self.commit(&mut out);
        }
        out
    }

    /// Hide or show items. Hidden items leave the selection.
    pub fn set_hidden(&mut self, ids: &[ItemId], hidden: bool) -> Vec<Action> {
        let mut changed = false;
        for id in ids {
            if let Some(item) = self.store.get_mut(id) {
                if item.hidden != hidden {
                    item.hidden = hidden;
                    changed = true;
                }
            }
        }
        let mut out = Vec::new();
        if !changed {
            return out;
        }
        if hidden {
            let before = self.selection.len();
            let visible: Vec<ItemId> = self
                .selection
                .ids()
                .into_iter()
                .filter(|id| self.store.get(id).is_some_and(|i| !i.hidden))
                .collect();
            self.selection.replace(visible);
            if self.selection.len() != before {
                out.push(Action::SelectionChanged);
            }
        }
        self.commit(&mut out);
        out
    }

    // --- Selection ---

    pub fn select_all(&mut self) -> Vec<Action> {
        self.selection.select_all(self.store.items());
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        self.selection.clear();
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    /// Select `id` alone, or toggle it when `toggle` is set (layers panel clicks).
    pub fn select_item(&mut self, id: ItemId, toggle: bool) -> Vec<Action> {
        if !self.store.contains(&id) {
            return Vec::new();
        }
        if toggle {
            self.selection.toggle(id);
        } else {
            self.selection.select_single(id);
        }
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    // --- Clipboard ---

    /// Copy the selection, in paint order. Nothing changes on the board.
    pub fn copy(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let selection = &self.selection;
        self.clipboard
            .copy(self.store.paint_order().into_iter().filter(|i| selection.contains(&i.id)));
        debug!(items = self.clipboard.len(), "copied to clipboard");
        Vec::new()
    }

    pub fn cut(&mut self) -> Vec<Action> {
        self.copy();
        self.delete_selection()
    }

    /// Paste the clipboard offset from its source and select the copies.
    pub fn paste(&mut self) -> Vec<Action> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let ids = paste_drafts(&mut self.store, self.clipboard.entries(), self.config.paste_offset);
        self.select_new(ids)
    }

    /// Copy-and-paste the selection in one step without touching the clipboard.
    pub fn duplicate(&mut self) -> Vec<Action> {
        let drafts = drafts_for(&self.store, &self.selection.ids());
        if drafts.is_empty() {
            return Vec::new();
        }
        let ids = paste_drafts(&mut self.store, &drafts, self.config.paste_offset);
        self.select_new(ids)
    }

    // --- Grouping ---

    pub fn group(&mut self) -> Vec<Action> {
        let mut out = Vec::new();
        if let Some(group_id) = grouping::group(&mut self.store, &self.selection.ids()) {
            debug!(group = %group_id, members = self.selection.len(), "items grouped");
            self.commit(&mut out);
        }
        out
    }

    pub fn ungroup(&mut self) -> Vec<Action> {
        let mut out = Vec::new();
        let dissolved = grouping::ungroup(&mut self.store, &self.selection.ids());
        if dissolved > 0 {
            debug!(groups = dissolved, "groups dissolved");
            self.commit(&mut out);
        }
        out
    }

    // --- Layering ---

    pub fn bring_to_front(&mut self) -> Vec<Action> {
        let ids = self.selection.ids();
        self.commit_if_changed(|store| {
            layering::bring_to_front(store, &ids);
        })
    }

    pub fn send_to_back(&mut self) -> Vec<Action> {
        let ids = self.selection.ids();
        self.commit_if_changed(|store| {
            layering::send_to_back(store, &ids);
        })
    }

    /// Apply a layers-panel ordering, front to back. Items left out keep
    /// their relative order below the listed ones.
    pub fn reorder_layers(&mut self, front_to_back: &[ItemId]) -> Vec<Action> {
        let mut order: Vec<ItemId> = front_to_back.iter().filter(|id| self.store.contains(id)).copied().collect();
        for id in layering::front_to_back(&self.store) {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        self.commit_if_changed(|store| {
            layering::reorder(store, &order);
        })
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        let mut out = self.cancel_gesture();
        let Some(snapshot) = self.history.undo() else {
            return out;
        };
        self.store.replace_all(snapshot.to_vec());
        self.after_history_step(&mut out);
        out
    }

    pub fn redo(&mut self) -> Vec<Action> {
        let mut out = self.cancel_gesture();
        let Some(snapshot) = self.history.redo() else {
            return out;
        };
        self.store.replace_all(snapshot.to_vec());
        self.after_history_step(&mut out);
        out
    }

    // --- Camera ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_by(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_by(1.0 / ZOOM_STEP)
    }

    /// Back to 100% with no pan.
    pub fn reset_view(&mut self) -> Vec<Action> {
        let origin = (self.camera.origin_x, self.camera.origin_y);
        self.camera = Camera { origin_x: origin.0, origin_y: origin.1, ..Camera::default() };
        vec![Action::CameraChanged, Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        view::build(&ViewSource {
            store: &self.store,
            selection: &self.selection,
            input: &self.input,
            camera: &self.camera,
            mode: self.mode,
            settings: &self.settings,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        })
    }

    #[must_use]
    pub fn layer_list(&self) -> Vec<LayerEntry> {
        view::layer_list(&self.store, &self.selection)
    }

    #[must_use]
    pub fn board_id(&self) -> Option<BoardId> {
        self.board_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    /// Selected ids in a stable order.
    #[must_use]
    pub fn selection(&self) -> Vec<ItemId> {
        self.selection.ids()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // --- Internals ---

    fn snapping(&self) -> Snapping {
        Snapping::from_settings(&self.settings)
    }

    fn commit(&mut self, out: &mut Vec<Action>) {
        self.history.commit(self.store.to_vec());
        out.push(Action::ItemsChanged { committed: true });
        out.push(Action::RenderNeeded);
    }

    fn commit_if_changed<F>(&mut self, mutate: F) -> Vec<Action>
    where
        F: FnOnce(&mut ItemStore),
    {
        let before = self.store.to_vec();
        mutate(&mut self.store);
        let mut out = Vec::new();
        if self.store.items() != before.as_slice() {
            self.commit(&mut out);
        }
        out
    }

    fn select_new(&mut self, ids: Vec<ItemId>) -> Vec<Action> {
        debug!(items = ids.len(), "items pasted");
        self.selection.replace(ids);
        let mut out = vec![Action::SelectionChanged];
        self.commit(&mut out);
        out
    }

    fn after_history_step(&mut self, out: &mut Vec<Action>) {
        self.selection.clear();
        debug!(cursor = self.history.cursor(), snapshots = self.history.len(), "history step");
        out.push(Action::ItemsChanged { committed: true });
        out.push(Action::SelectionChanged);
        out.push(Action::RenderNeeded);
    }

    /// Selected ids a transform command acts on; with rigid groups, their
    /// co-members too.
    fn transform_targets(&self) -> Vec<ItemId> {
        let ids = self.selection.ids();
        if self.config.rigid_groups { grouping::expand_to_groups(&self.store, &ids) } else { ids }
    }

    fn start_drag(&mut self, id: ItemId, screen_pt: Point, modifiers: Modifiers, out: &mut Vec<Action>) {
        if modifiers.toggles_selection() {
            self.selection.toggle(id);
            out.push(Action::SelectionChanged);
            if !self.selection.contains(&id) {
                out.push(Action::RenderNeeded);
                return;
            }
        } else if !self.selection.contains(&id) {
            self.selection.select_single(id);
            out.push(Action::SelectionChanged);
        }

        let seeds = transform::drag_seeds(&self.store, &self.transform_targets());
        self.input = InputState::DraggingItems { start_screen: screen_pt, seeds, moved: false };
        self.push_cursor("move", out);
        out.push(Action::RenderNeeded);
    }

    fn start_resize(&mut self, id: ItemId, anchor: ResizeAnchor, screen_pt: Point, out: &mut Vec<Action>) {
        let Some(item) = self.store.get(&id).filter(|i| !i.locked) else {
            return;
        };
        let b = item.bounds();
        self.input = InputState::ResizingItem {
            id,
            anchor,
            start_screen: screen_pt,
            orig_x: b.x,
            orig_y: b.y,
            orig_w: b.width,
            orig_h: b.height,
            moved: false,
        };
        self.push_cursor(anchor_cursor(anchor), out);
    }

    fn start_rotate(&mut self, id: ItemId, out: &mut Vec<Action>) {
        let Some(item) = self.store.get(&id).filter(|i| !i.locked) else {
            return;
        };
        self.input = InputState::RotatingItem { id, center: item.center(), orig_rotation: item.rotation, moved: false };
        self.push_cursor("grabbing", out);
    }

    /// Abandon the active gesture, restoring whatever it previewed.
    fn cancel_gesture(&mut self) -> Vec<Action> {
        let mut out = Vec::new();
        match std::mem::take(&mut self.input) {
            InputState::Idle => return out,
            InputState::DraggingItems { seeds, moved, .. } => {
                transform::revert_drag(&mut self.store, &seeds);
                if moved {
                    out.push(Action::ItemsChanged { committed: false });
                }
            }
            InputState::ResizingItem { id, orig_x, orig_y, orig_w, orig_h, .. } => {
                if let Some(item) = self.store.get_mut(&id) {
                    item.position.x = orig_x;
                    item.position.y = orig_y;
                    item.size = Size::new(orig_w, orig_h);
                }
                out.push(Action::ItemsChanged { committed: false });
            }
            InputState::RotatingItem { id, orig_rotation, .. } => {
                if let Some(item) = self.store.get_mut(&id) {
                    item.rotation = orig_rotation;
                }
                out.push(Action::ItemsChanged { committed: false });
            }
            InputState::Panning { .. } | InputState::BoxSelecting { .. } => {}
        }
        debug!("gesture cancelled");
        let cursor = self.idle_cursor();
        self.push_cursor(cursor, &mut out);
        out.push(Action::RenderNeeded);
        out
    }

    fn zoom_by(&mut self, factor: f64) -> Vec<Action> {
        let center = Point::new(
            self.camera.origin_x + self.viewport_width / 2.0,
            self.camera.origin_y + self.viewport_height / 2.0,
        );
        self.camera.zoom_at(center, self.camera.zoom * factor);
        vec![Action::CameraChanged, Action::RenderNeeded]
    }

    /// Canvas-space point under the middle of the viewport.
    fn viewport_center(&self) -> Point {
        self.camera.screen_to_canvas(Point::new(
            self.camera.origin_x + self.viewport_width / 2.0,
            self.camera.origin_y + self.viewport_height / 2.0,
        ))
    }

    fn idle_cursor(&self) -> &'static str {
        match self.mode {
            InteractionMode::Pan => "grab",
            InteractionMode::Select => "default",
        }
    }

    fn hover_cursor(&self, canvas_pt: Point) -> &'static str {
        if self.mode == InteractionMode::Pan {
            return "grab";
        }
        match hit_test(canvas_pt, &self.store, &self.camera, &self.selection) {
            Some(hit) => match hit.part {
                HitPart::Body => "move",
                HitPart::ResizeHandle(anchor) => anchor_cursor(anchor),
                HitPart::RotateHandle => "grab",
            },
            None => "default",
        }
    }

    fn push_cursor(&mut self, cursor: &'static str, out: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor;
            out.push(Action::SetCursor(cursor));
        }
    }
}

fn anchor_cursor(anchor: ResizeAnchor) -> &'static str {
    match anchor {
        ResizeAnchor::N | ResizeAnchor::S => "ns-resize",
        ResizeAnchor::E | ResizeAnchor::W => "ew-resize",
        ResizeAnchor::Ne | ResizeAnchor::Sw => "nesw-resize",
        ResizeAnchor::Nw | ResizeAnchor::Se => "nwse-resize",
    }
}

fn sanitize_settings(mut settings: BoardSettings) -> BoardSettings {
    if !settings.grid_size.is_finite() || settings.grid_size <= 0.0 {
        warn!(grid_size = settings.grid_size, "invalid grid size; using default");
        settings.grid_size = DEFAULT_GRID_SIZE;
    }
    settings
}

/// Fold the optional `size`, `style`, `metadata` and `rotation` of an asset
/// insert into `draft`. Unusable values are ignored.
fn apply_extra(draft: &mut ItemDraft, extra: &Value) {
    let Some(extra) = extra.as_object() else {
        return;
    };
    if let Some(size) = extra.get("size") {
        let width = size.get("width").and_then(Value::as_f64).filter(|w| w.is_finite());
        let height = size.get("height").and_then(Value::as_f64).filter(|h| h.is_finite());
        if let (Some(width), Some(height)) = (width, height) {
            draft.size = Size::new(width, height).clamped();
        }
    }
    if let Some(style) = extra.get("style").filter(|v| v.is_object()) {
        draft.style = style.clone();
    }
    if let Some(metadata) = extra.get("metadata").filter(|v| v.is_object()) {
        draft.metadata = metadata.clone();
    }
    if let Some(rotation) = extra.get("rotation").and_then(Value::as_f64).filter(|r| r.is_finite()) {
        draft.rotation = rotation;
    }
}
