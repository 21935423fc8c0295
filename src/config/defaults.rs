//! Programmed defaults, the lowest-precedence settings layer.

use super::settings::{RenderMode, SettingsLayer};

/// Delay before a remote selection batch is rendered, in milliseconds.
pub const DEFAULT_RENDER_DELAY_MS: u64 = 10;

pub const DEFAULT_SELECTION_CLASS: &str = "remoteSelection";

pub const DEFAULT_CARET_CLASS: &str = "remoteCaret";

/// File name looked up in the user config directory and the project root.
pub const CONFIG_FILE_NAME: &str = "editbridge.toml";

/// Returns a layer with every field set to its default.
pub fn default_settings() -> SettingsLayer {
    SettingsLayer {
        render_delay_ms: Some(DEFAULT_RENDER_DELAY_MS),
        render_mode: Some(RenderMode::FireAndForget),
        selection_class: Some(DEFAULT_SELECTION_CLASS.to_string()),
        caret_class: Some(DEFAULT_CARET_CLASS.to_string()),
    }
}
