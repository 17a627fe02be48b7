//! Interactive moodboard canvas editor.
//!
//! The crate owns everything between raw pointer/keyboard events and a
//! persisted board: geometry and the pan/zoom camera, the item document,
//! selection, drag/resize/rotate gestures with grid snapping, layering,
//! grouping, clipboard, a bounded undo history, and debounced saving through
//! a pluggable storage gateway. The host (a browser shell or the bundled
//! script runner) feeds events in and renders the [`view::ViewModel`] it
//! gets back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | [`editor::CanvasEditor`], the event-driven orchestrator |
//! | [`session`] | Editor wired to storage and the auto-saver |
//! | [`doc`] | Item and board model, tolerant hydration, item store |
//! | [`camera`] | Points, rectangles, snapping and the pan/zoom camera |
//! | [`selection`] | Selected-item set and rubber-band selection |
//! | [`hit`] | Hit-testing against items and transform handles |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`transform`] | Drag, resize and rotate math |
//! | [`layering`] | Z-order operations |
//! | [`grouping`] | Group and ungroup |
//! | [`clipboard`] | Copy, cut, paste and duplicate |
//! | [`history`] | Bounded undo/redo snapshots |
//! | [`shortcuts`] | Keyboard shortcut resolution |
//! | [`view`] | Render-ready view model and layer list |
//! | [`persistence`] | Storage gateway trait, backends and the auto-saver |
//! | [`config`] | Environment-driven editor configuration |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod camera;
pub mod clipboard;
pub mod config;
pub mod consts;
pub mod doc;
pub mod editor;
pub mod grouping;
pub mod hit;
pub mod history;
pub mod input;
pub mod layering;
pub mod persistence;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod transform;
pub mod view;
