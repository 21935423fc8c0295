use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::{DEFAULT_CARET_CLASS, DEFAULT_RENDER_DELAY_MS, DEFAULT_SELECTION_CLASS};

/// How repeated `highlight()` calls are turned into render passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Every call schedules its own pass; the last pass to fire wins.
    #[default]
    FireAndForget,
    /// A new call aborts the pending pass and reschedules.
    Debounce,
}

/// One configuration source. Absent fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_mode: Option<RenderMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caret_class: Option<String>,
}

/// Resolved settings used by a running bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Delay between `highlight()` and the render pass it schedules.
    pub render_delay: Duration,
    pub render_mode: RenderMode,
    /// CSS-style class applied to remote range decorations.
    pub selection_class: String,
    /// CSS-style class applied to remote caret widgets.
    pub caret_class: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            render_delay: Duration::from_millis(DEFAULT_RENDER_DELAY_MS),
            render_mode: RenderMode::default(),
            selection_class: DEFAULT_SELECTION_CLASS.to_string(),
            caret_class: DEFAULT_CARET_CLASS.to_string(),
        }
    }
}

impl From<SettingsLayer> for BridgeSettings {
    fn from(layer: SettingsLayer) -> Self {
        let defaults = BridgeSettings::default();
        Self {
            render_delay: layer
                .render_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.render_delay),
            render_mode: layer.render_mode.unwrap_or(defaults.render_mode),
            selection_class: layer.selection_class.unwrap_or(defaults.selection_class),
            caret_class: layer.caret_class.unwrap_or(defaults.caret_class),
        }
    }
}

impl BridgeSettings {
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let layer: SettingsLayer = toml::from_str("render_mode = \"debounce\"").unwrap();
        let settings = BridgeSettings::from(layer);
        assert_eq!(settings.render_mode, RenderMode::Debounce);
        assert_eq!(settings.render_delay, Duration::from_millis(10));
        assert_eq!(settings.selection_class, "remoteSelection");
        assert_eq!(settings.caret_class, "remoteCaret");
    }

    #[test]
    fn test_layer_parses_every_field() {
        let layer: SettingsLayer = toml::from_str(
            r#"
            render_delay_ms = 250
            render_mode = "fire_and_forget"
            selection_class = "peer-sel"
            caret_class = "peer-caret"
            "#,
        )
        .unwrap();
        assert_eq!(layer.render_delay_ms, Some(250));
        assert_eq!(layer.render_mode, Some(RenderMode::FireAndForget));
        assert_eq!(layer.selection_class.as_deref(), Some("peer-sel"));
        assert_eq!(layer.caret_class.as_deref(), Some("peer-caret"));
    }

    #[test]
    fn test_unknown_render_mode_is_rejected() {
        assert!(toml::from_str::<SettingsLayer>("render_mode = \"sometimes\"").is_err());
    }
}
