use std::path::Path;

use super::defaults::{CONFIG_FILE_NAME, default_settings};
use super::settings::{BridgeSettings, SettingsLayer};
use super::user::{load_config_file, load_user_config, user_config_path};
use super::merge_all;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward this event to the `log` facade.
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "editbridge::config", "{}", self.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "editbridge::config", "{}", self.message)
            }
        }
    }
}

#[derive(Debug)]
pub struct SettingsLoadOutcome {
    pub settings: BridgeSettings,
    pub events: Vec<SettingsEvent>,
}

/// Resolve settings from every layer: defaults < user < project < override.
///
/// Problems with any layer are reported as warnings and the layer is skipped;
/// loading itself never fails.
pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<SettingsLayer>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(default_settings());
    let user_config = load_user_config_with_events(&mut events);
    let project_settings = load_project_settings(root_path, &mut events);

    let merged = merge_all(&[defaults, user_config, project_settings, override_settings]);
    let settings = merged.map(BridgeSettings::from).unwrap_or_default();

    SettingsLoadOutcome { settings, events }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<SettingsLayer> {
    match load_user_config() {
        Ok(Some(settings)) => {
            let location = user_config_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            events.push(SettingsEvent::info(format!(
                "Loaded user config from {}",
                location
            )));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_project_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<SettingsLayer> {
    let config_path = root_path?.join(CONFIG_FILE_NAME);
    match load_config_file(&config_path) {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info(format!(
                "Loaded project config from {}",
                config_path.display()
            )));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load project config: {}",
                err
            )));
            None
        }
    }
}
