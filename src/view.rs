//! Read-only projections of editor state for a renderer and a layers panel.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use serde::Serialize;
use serde_json::Value;

use crate::camera::{Camera, Rect, normalize_degrees};
use crate::doc::{BoardSettings, GroupId, Item, ItemId, ItemKind, ItemStore};
use crate::input::{InputState, InteractionMode};
use crate::selection::Selection;

/// Longest label shown for a text-bearing item in the layers panel.
const LAYER_LABEL_CHARS: usize = 32;

/// One drawable item, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub content: String,
    /// Bounds in canvas units.
    pub rect: Rect,
    /// Rotation normalised into `[0, 360)`.
    pub rotation: f64,
    pub z: i64,
    pub selected: bool,
    pub locked: bool,
    pub group_id: Option<GroupId>,
    /// `content` is an asset reference the host has to load.
    pub asset: bool,
    /// Resolved `style.opacity`, clamped to `[0, 1]`.
    pub opacity: f64,
    /// Resolved typography for text and note items.
    pub text: Option<TextStyle>,
    /// Outline of a shape item.
    pub shape: Option<String>,
    pub approval_status: Option<String>,
    pub style: Value,
    pub metadata: Value,
}

/// Typography with defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: String,
    pub align: String,
}

impl ViewItem {
    #[must_use]
    pub fn from_item(item: &Item, selected: bool) -> Self {
        let style = item.style();
        let metadata = item.metadata();
        let text = item.kind.is_textual().then(|| TextStyle {
            font_size: style.font_size(),
            color: style.color().to_string(),
            align: style.text_align().to_string(),
        });
        let shape = (item.kind == ItemKind::Shape).then(|| metadata.shape_type().to_string());
        Self {
            id: item.id,
            kind: item.kind,
            content: item.content.clone(),
            rect: item.bounds(),
            rotation: normalize_degrees(item.rotation),
            z: item.position.z,
            selected,
            locked: item.locked,
            group_id: item.group_id,
            asset: item.kind.is_asset(),
            opacity: style.opacity(),
            text,
            shape,
            approval_status: metadata.approval_status().map(str::to_string),
            style: item.style.clone(),
            metadata: item.metadata.clone(),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// Visible items, bottom to top.
    pub items: Vec<ViewItem>,
    /// Rubber-band rectangle in canvas units while one is being drawn.
    pub marquee: Option<Rect>,
    pub camera: Camera,
    pub mode: InteractionMode,
    pub settings: BoardSettings,
    pub selection_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Inputs to [`build`], borrowed from the editor.
pub struct ViewSource<'a> {
    pub store: &'a ItemStore,
    pub selection: &'a Selection,
    pub input: &'a InputState,
    pub camera: &'a Camera,
    pub mode: InteractionMode,
    pub settings: &'a BoardSettings,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Project editor state into a [`ViewModel`]. Hidden items are left out.
#[must_use]
pub fn build(src: &ViewSource<'_>) -> ViewModel {
    let items = src
        .store
        .paint_order()
        .into_iter()
        .filter(|i| !i.hidden)
        .map(|i| ViewItem::from_item(i, src.selection.contains(&i.id)))
        .collect();

    ViewModel {
        items,
        marquee: marquee(src.input),
        camera: *src.camera,
        mode: src.mode,
        settings: src.settings.clone(),
        selection_count: src.selection.len(),
        can_undo: src.can_undo,
        can_redo: src.can_redo,
    }
}

/// The rubber-band rectangle, if a box selection is in progress.
#[must_use]
pub fn marquee(input: &InputState) -> Option<Rect> {
    match input {
        InputState::BoxSelecting { anchor, current } => Some(Rect::from_corners(*anchor, *current)),
        _ => None,
    }
}

/// One row of the layers panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerEntry {
    pub id: ItemId,
    pub kind: ItemKind,
    pub label: String,
    pub z: i64,
    pub locked: bool,
    pub hidden: bool,
    pub selected: bool,
    pub group_id: Option<GroupId>,
}

/// All items front to back, hidden ones included.
#[must_use]
pub fn layer_list(store: &ItemStore, selection: &Selection) -> Vec<LayerEntry> {
    store
        .paint_order()
        .into_iter()
        .rev()
        .map(|item| LayerEntry {
            id: item.id,
            kind: item.kind,
            label: layer_label(item),
            z: item.position.z,
            locked: item.locked,
            hidden: item.hidden,
            selected: selection.contains(&item.id),
            group_id: item.group_id,
        })
        .collect()
}

fn layer_label(item: &Item) -> String {
    let text = item.content.trim();
    if !item.kind.is_textual() || text.is_empty() {
        return kind_label(item.kind).to_string();
    }
    let first_line = text.lines().next().unwrap_or(text);
    let mut label: String = first_line.chars().take(LAYER_LABEL_CHARS).collect();
    if first_line.chars().count() > LAYER_LABEL_CHARS {
        label.push('…');
    }
    label
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Image => "Image",
        ItemKind::Text => "Text",
        ItemKind::Color => "Color",
        ItemKind::Shape => "Shape",
        ItemKind::Note => "Note",
        ItemKind::MaterialCard => "Material",
        ItemKind::ItemCard => "Product",
    }
}
