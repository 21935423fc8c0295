pub mod defaults;
pub mod loader;
pub mod settings;
pub mod user;

pub use loader::{SettingsEvent, SettingsEventKind, SettingsLoadOutcome, load_settings};
pub use settings::{BridgeSettings, RenderMode, SettingsLayer};
pub use user::{UserConfigError, UserConfigResult, load_user_config, user_config_path};

/// Merge all layers in order. Later layers override earlier ones.
pub fn merge_all(configs: &[Option<SettingsLayer>]) -> Option<SettingsLayer> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two layers, preferring values from `primary` over `fallback`.
pub fn merge_settings(
    fallback: Option<SettingsLayer>,
    primary: Option<SettingsLayer>,
) -> Option<SettingsLayer> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) | (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(SettingsLayer {
            render_delay_ms: primary.render_delay_ms.or(fallback.render_delay_ms),
            render_mode: primary.render_mode.or(fallback.render_mode),
            selection_class: primary.selection_class.or(fallback.selection_class),
            caret_class: primary.caret_class.or(fallback.caret_class),
        }),
    }
}
