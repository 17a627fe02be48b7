//! Document model: board items, their properties, and the in-memory store.
//!
//! This module defines what is placed on the canvas (`Item`, `ItemKind`),
//! the data-only form used for creation and the clipboard (`ItemDraft`), a
//! sparse content/style update (`ItemPatch`), typed accessors for the
//! open-ended `style` and `metadata` bags, and the ordered store that owns
//! every live item (`ItemStore`).
//!
//! Items arrive from persistence as raw JSON and go through
//! [`hydrate_items`], which repairs damaged entries instead of failing the
//! whole board. The renderer reads from `ItemStore` via `paint_order`.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::camera::{Point, Rect};
use crate::consts::{DEFAULT_GRID_SIZE, MIN_ITEM_SIZE};

/// Unique identifier for an item.
pub type ItemId = Uuid;

/// Identifier shared by the members of a group.
pub type GroupId = Uuid;

/// Identifier assigned to a board by the persistence layer.
pub type BoardId = Uuid;

/// The kind of an item. Each kind decides which of `content`, `style` and
/// `metadata` carry meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Uploaded or generated picture; `content` is an asset reference.
    Image,
    /// Free text; `content` is the literal text.
    Text,
    /// Color swatch; `content` is a color value.
    Color,
    /// Geometric shape; `content` is the fill color, `metadata.shape_type` the outline.
    Shape,
    /// Sticky note; `content` is the literal text.
    Note,
    /// Linked material sample; `content` is an asset reference.
    MaterialCard,
    /// Linked product card; `content` is an asset reference.
    ItemCard,
}

impl ItemKind {
    /// Parse the wire name of a kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "text" => Some(Self::Text),
            "color" => Some(Self::Color),
            "shape" => Some(Self::Shape),
            "note" => Some(Self::Note),
            "material_card" => Some(Self::MaterialCard),
            "item_card" => Some(Self::ItemCard),
            _ => None,
        }
    }

    /// Size given to a freshly created item of this kind.
    #[must_use]
    pub fn default_size(self) -> Size {
        match self {
            Self::Image => Size::new(200.0, 200.0),
            Self::Text => Size::new(200.0, 50.0),
            Self::Color => Size::new(100.0, 100.0),
            Self::Shape => Size::new(120.0, 120.0),
            Self::Note => Size::new(180.0, 180.0),
            Self::MaterialCard | Self::ItemCard => Size::new(180.0, 240.0),
        }
    }

    /// Whether `content` holds an asset reference.
    #[must_use]
    pub fn is_asset(self) -> bool {
        matches!(self, Self::Image | Self::MaterialCard | Self::ItemCard)
    }

    /// Whether `content` holds literal text.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Note)
    }
}

/// Location of an item in canvas units plus its layering key.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Paint order key; larger paints above smaller.
    pub z: i64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// Width and height in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Raise both dimensions to the minimum item size.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { width: self.width.max(MIN_ITEM_SIZE), height: self.height.max(MIN_ITEM_SIZE) }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// An item as held by the editor and written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Opaque payload: asset reference, literal text, or color value.
    pub content: String,
    pub position: Position,
    pub size: Size,
    /// Clockwise rotation in degrees around the item center. Unbounded.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default = "empty_object")]
    pub style: Value,
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

impl Item {
    /// Create an item of `kind` with default size and empty style/metadata.
    #[must_use]
    pub fn new(kind: ItemKind, content: impl Into<String>, x: f64, y: f64, z: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            position: Position::new(x, y, z),
            size: kind.default_size(),
            rotation: 0.0,
            locked: false,
            hidden: false,
            group_id: None,
            style: empty_object(),
            metadata: empty_object(),
        }
    }

    /// Axis-aligned bounds in canvas units (rotation ignored).
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.width, self.size.height)
    }

    /// Geometric center in canvas units.
    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Typed view of the `style` bag.
    #[must_use]
    pub fn style(&self) -> Style<'_> {
        Style::new(&self.style)
    }

    /// Typed view of the `metadata` bag.
    #[must_use]
    pub fn metadata(&self) -> Metadata<'_> {
        Metadata::new(&self.metadata)
    }
}

/// Item data without an identity. Used for creation requests and as the
/// clipboard payload; ids are assigned when a draft becomes an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub kind: ItemKind,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub rotation: f64,
    pub locked: bool,
    pub hidden: bool,
    pub group_id: Option<GroupId>,
    pub style: Value,
    pub metadata: Value,
}

impl ItemDraft {
    /// A draft of `kind` at the origin with its default size.
    #[must_use]
    pub fn new(kind: ItemKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            position: Position::default(),
            size: kind.default_size(),
            rotation: 0.0,
            locked: false,
            hidden: false,
            group_id: None,
            style: empty_object(),
            metadata: empty_object(),
        }
    }

    /// Deep-copy every field of `item` except its id.
    #[must_use]
    pub fn from_item(item: &Item) -> Self {
        Self {
            kind: item.kind,
            content: item.content.clone(),
            position: item.position,
            size: item.size,
            rotation: item.rotation,
            locked: item.locked,
            hidden: item.hidden,
            group_id: item.group_id,
            style: item.style.clone(),
            metadata: item.metadata.clone(),
        }
    }

    /// Materialise the draft under `id`. The size floor is enforced here.
    #[must_use]
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            kind: self.kind,
            content: self.content,
            position: self.position,
            size: self.size.clamped(),
            rotation: self.rotation,
            locked: self.locked,
            hidden: self.hidden,
            group_id: self.group_id,
            style: self.style,
            metadata: self.metadata,
        }
    }
}

/// Sparse update for an item's payload. Only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    /// Replacement content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Style keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    /// Metadata keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ItemPatch {
    /// Whether the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.style.is_none() && self.metadata.is_none()
    }

    /// Apply the patch to `item`. Returns false if a bag update is not a JSON object.
    pub fn apply(&self, item: &mut Item) -> bool {
        if let Some(ref content) = self.content {
            item.content.clone_from(content);
        }
        if let Some(ref style) = self.style {
            if !merge_object(&mut item.style, style) {
                return false;
            }
        }
        if let Some(ref metadata) = self.metadata {
            if !merge_object(&mut item.metadata, metadata) {
                return false;
            }
        }
        true
    }
}

/// Merge `incoming` object keys into `target`, removing keys set to null.
fn merge_object(target: &mut Value, incoming: &Value) -> bool {
    let Some(incoming) = incoming.as_object() else {
        return false;
    };
    if !target.is_object() {
        *target = empty_object();
    }
    if let Some(existing) = target.as_object_mut() {
        for (k, v) in incoming {
            if v.is_null() {
                existing.remove(k);
            } else {
                existing.insert(k.clone(), v.clone());
            }
        }
    }
    true
}

/// Typed access to common presentation fields of an item's `style` bag.
pub struct Style<'a> {
    value: &'a Value,
}

impl<'a> Style<'a> {
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Opacity in `[0, 1]`. Defaults to fully opaque.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.value
            .get("opacity")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }

    /// Font size in canvas units. Defaults to `16.0`.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.value
            .get("font_size")
            .and_then(Value::as_f64)
            .unwrap_or(16.0)
    }

    /// Text or stroke color. Defaults to `"#1f1a17"`.
    #[must_use]
    pub fn color(&self) -> &'a str {
        self.value
            .get("color")
            .and_then(|v| v.as_str())
            .unwrap_or("#1f1a17")
    }

    /// Text alignment. Defaults to `"left"`.
    #[must_use]
    pub fn text_align(&self) -> &'a str {
        self.value
            .get("text_align")
            .and_then(|v| v.as_str())
            .unwrap_or("left")
    }
}

/// Typed access to the annotation fields of an item's `metadata` bag.
pub struct Metadata<'a> {
    value: &'a Value,
}

impl<'a> Metadata<'a> {
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// Outline of a shape item. Defaults to `"rectangle"`.
    #[must_use]
    pub fn shape_type(&self) -> &'a str {
        self.value
            .get("shape_type")
            .and_then(|v| v.as_str())
            .unwrap_or("rectangle")
    }

    /// Client approval status, if annotated.
    #[must_use]
    pub fn approval_status(&self) -> Option<&'a str> {
        self.value.get("approval_status").and_then(|v| v.as_str())
    }
}

/// Canvas-level presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Background color of the canvas.
    pub background: String,
    /// Whether the grid is drawn.
    pub show_grid: bool,
    /// Whether gestures snap to the grid.
    pub snap_to_grid: bool,
    /// Grid spacing in canvas units.
    pub grid_size: f64,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self { background: "#ffffff".into(), show_grid: true, snap_to_grid: true, grid_size: DEFAULT_GRID_SIZE }
    }
}

/// The persisted aggregate for one moodboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    /// Assigned on first save; `None` for a board never persisted.
    pub id: Option<BoardId>,
    pub name: String,
    pub items: Vec<Item>,
    pub settings: BoardSettings,
}

/// Ordered in-memory store of items. Insertion order breaks z ties.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<Item>,
}

impl ItemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a store holding `items` in the given order.
    #[must_use]
    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Append an item. An item with the same id is replaced in place.
    pub fn insert(&mut self, item: Item) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            *existing = item;
        } else {
            self.items.push(item);
        }
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|i| i.id == *id)?;
        Some(self.items.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == *id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == *id)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Item> {
        self.items.iter_mut()
    }

    /// Replace all items with a full snapshot.
    pub fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    /// Copy of every item, used for history snapshots and saves.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Item> {
        self.items.clone()
    }

    /// All items sorted bottom-to-top: by `z`, then insertion order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Item> {
        let mut ordered: Vec<&Item> = self.items.iter().collect();
        // sort_by_key is stable, so equal z keeps insertion order
        ordered.sort_by_key(|i| i.position.z);
        ordered
    }

    /// Highest `z` on the board, if any item exists.
    #[must_use]
    pub fn max_z(&self) -> Option<i64> {
        self.items.iter().map(|i| i.position.z).max()
    }

    /// Lowest `z` on the board, if any item exists.
    #[must_use]
    pub fn min_z(&self) -> Option<i64> {
        self.items.iter().map(|i| i.position.z).min()
    }

    /// The `z` a newly added item on top should receive.
    #[must_use]
    pub fn next_z(&self) -> i64 {
        self.max_z().map_or(0, |z| z + 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// HYDRATION
// =============================================================================

/// Build items from persisted JSON, repairing what can be repaired.
///
/// Missing or non-numeric `position`/`size` fields fall back to the origin
/// (with `z` = entry index) and the kind's default size; undersized items are
/// clamped; missing or duplicate ids are replaced. Entries that are not
/// objects or have an unknown `type` are dropped. Every repair is logged.
#[must_use]
pub fn hydrate_items(raw: &[Value]) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.iter().enumerate() {
        if let Some(item) = hydrate_item(index, value, &mut seen) {
            items.push(item);
        }
    }
    items
}

/// `deserialize_with` adapter that routes an item array through [`hydrate_items`].
///
/// # Errors
///
/// Fails only when the field is not a JSON array.
pub fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(hydrate_items(&raw))
}

fn parse_uuid(raw: &str) -> Option<Uuid> {
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => None,
    }
}

fn finite(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn hydrate_item(index: usize, value: &Value, seen: &mut HashSet<ItemId>) -> Option<Item> {
    let Some(obj) = value.as_object() else {
        warn!(index, "persisted item is not an object; skipping");
        return None;
    };

    let kind_name = obj.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let Some(kind) = ItemKind::from_name(kind_name) else {
        warn!(index, kind = kind_name, "persisted item has unknown type; skipping");
        return None;
    };

    let parsed_id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(parse_uuid);
    let id = match parsed_id {
        Some(id) if !seen.contains(&id) => id,
        Some(id) => {
            let fresh = Uuid::new_v4();
            warn!(index, duplicate = %id, replacement = %fresh, "duplicate item id; assigning a fresh one");
            fresh
        }
        None => {
            let fresh = Uuid::new_v4();
            warn!(index, replacement = %fresh, "persisted item has no valid id; assigning a fresh one");
            fresh
        }
    };
    seen.insert(id);

    let fallback_z = index as i64;
    let position = match obj.get("position") {
        Some(pos) => {
            let x = finite(pos.get("x"));
            let y = finite(pos.get("y"));
            let z = pos
                .get("z")
                .and_then(|z| z.as_i64().or_else(|| finite(Some(z)).map(|f| f.round() as i64)));
            if x.is_none() || y.is_none() || z.is_none() {
                warn!(item = %id, "persisted item has incomplete position; filling defaults");
            }
            Position::new(x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(fallback_z))
        }
        None => {
            warn!(item = %id, "persisted item has no position; placing at origin");
            Position::new(0.0, 0.0, fallback_z)
        }
    };

    let default_size = kind.default_size();
    let size = match obj.get("size") {
        Some(size) => {
            let w = finite(size.get("width"));
            let h = finite(size.get("height"));
            if w.is_none() || h.is_none() {
                warn!(item = %id, "persisted item has incomplete size; filling defaults");
            }
            let raw = Size::new(w.unwrap_or(default_size.width), h.unwrap_or(default_size.height));
            let clamped = raw.clamped();
            if clamped != raw {
                warn!(item = %id, width = raw.width, height = raw.height, "persisted item below minimum size; clamping");
            }
            clamped
        }
        None => {
            warn!(item = %id, "persisted item has no size; using kind default");
            default_size
        }
    };

    let content = match obj.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let group_id = obj
        .get("group_id")
        .and_then(|v| v.as_str())
        .and_then(parse_uuid);

    let bag = |key: &str| match obj.get(key) {
        Some(v) if v.is_object() => v.clone(),
        _ => empty_object(),
    };

    Some(Item {
        id,
        kind,
        content,
        position,
        size,
        rotation: finite(obj.get("rotation")).unwrap_or(0.0),
        locked: obj.get("locked").and_then(Value::as_bool).unwrap_or(false),
        hidden: obj.get("hidden").and_then(Value::as_bool).unwrap_or(false),
        group_id,
        style: bag("style"),
        metadata: bag("metadata"),
    })
}
