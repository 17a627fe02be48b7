//! Editor tuning loaded from environment variables.
//!
//! Every knob has a default in [`crate::consts`]. Missing or unparsable
//! values fall back to that default with a warning, so a bad deployment
//! variable never prevents a board from opening.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::consts::{HISTORY_DEPTH, PASTE_OFFSET, SAVE_DEBOUNCE_MS};

pub const ENV_SAVE_DEBOUNCE_MS: &str = "MOODBOARD_SAVE_DEBOUNCE_MS";
pub const ENV_HISTORY_DEPTH: &str = "MOODBOARD_HISTORY_DEPTH";
pub const ENV_PASTE_OFFSET: &str = "MOODBOARD_PASTE_OFFSET";
pub const ENV_RIGID_GROUPS: &str = "MOODBOARD_RIGID_GROUPS";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Quiet period before an auto-save fires, in milliseconds.
    pub save_debounce_ms: u64,
    /// Maximum number of undoable steps.
    pub history_depth: usize,
    /// Offset applied to pasted and duplicated items, in canvas units.
    pub paste_offset: f64,
    /// When set, drags and nudges carry every unlocked member of a touched group.
    pub rigid_groups: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: SAVE_DEBOUNCE_MS,
            history_depth: HISTORY_DEPTH,
            paste_offset: PASTE_OFFSET,
            rigid_groups: false,
        }
    }
}

impl EditorConfig {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(v) => Some(v),
            Err(_) => None,
        })
    }

    /// Load through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let paste_offset = parse_or(ENV_PASTE_OFFSET, lookup(ENV_PASTE_OFFSET), defaults.paste_offset);
        Self {
            save_debounce_ms: parse_or(ENV_SAVE_DEBOUNCE_MS, lookup(ENV_SAVE_DEBOUNCE_MS), defaults.save_debounce_ms),
            history_depth: parse_or(ENV_HISTORY_DEPTH, lookup(ENV_HISTORY_DEPTH), defaults.history_depth).max(1),
            paste_offset: if paste_offset.is_finite() { paste_offset } else { defaults.paste_offset },
            rigid_groups: bool_or(ENV_RIGID_GROUPS, lookup(ENV_RIGID_GROUPS), defaults.rigid_groups),
        }
    }

    #[must_use]
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value = %raw, "invalid config value; using default");
            default
        }
    }
}

/// Flags accept `1/true/yes/on` and `0/false/no/off`, case-insensitively.
fn bool_or(key: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, "invalid config flag; using default");
            default
        }
    }
}
