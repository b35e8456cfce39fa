//! Wayfarer settings.
//!
//! Settings come in three layers. The built-in values form the base, the
//! user's `settings.json` is laid over them key by key, and `WAYFARER_*`
//! variables from the environment win over both. A key the file sets to
//! `null` keeps the value underneath it.

use crate::navigation::Gravity;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::warn;
use wf_toolbar::NotifyMode;

pub const DEFAULT_TOOLBAR_HEIGHT_PX: u32 = 56;
const MIN_TOOLBAR_HEIGHT_PX: u32 = 1;
const MAX_TOOLBAR_HEIGHT_PX: u32 = 512;

const TOOLBAR_HEIGHT_VAR: &str = "WAYFARER_TOOLBAR_HEIGHT";
const TOOLBAR_NOTIFY_VAR: &str = "WAYFARER_TOOLBAR_NOTIFY";
const LOG_LEVEL_VAR: &str = "WAYFARER_LOG_LEVEL";
const LOG_JSON_VAR: &str = "WAYFARER_LOG_JSON";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WayfarerSettings {
    pub toolbar: ToolbarSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolbarSettings {
    pub height_px: u32,
    pub gravity: Gravity,
    pub notify: NotifyMode,
}

impl Default for ToolbarSettings {
    fn default() -> Self {
        Self {
            height_px: DEFAULT_TOOLBAR_HEIGHT_PX,
            gravity: Gravity::Top,
            notify: NotifyMode::EdgeTriggered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// `~/.wayfarer/settings.json`, under the temp dir when `HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(std::env::temp_dir, PathBuf::from)
        .join(".wayfarer")
        .join("settings.json")
}

pub fn load_settings() -> SettingsResult<WayfarerSettings> {
    load_settings_from_path(&settings_path())
}

/// Builds the screen settings from the built-in values, the file at `path`
/// and the process environment.
///
/// Having no file is normal and leaves the built-in values in place. A file
/// that exists but cannot be read or parsed fails the load.
pub fn load_settings_from_path(path: &Path) -> SettingsResult<WayfarerSettings> {
    let builtin = serde_json::to_value(WayfarerSettings::default())?;
    let layered = match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(?path, "layering settings file over built-in values");
            merge_layers(builtin, serde_json::from_str(&content)?)
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(?path, "no settings file, keeping built-in values");
            builtin
        }
        Err(error) => return Err(error.into()),
    };

    let mut settings: WayfarerSettings = serde_json::from_value(layered)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Lays `upper` over `lower`.
///
/// Sections present in both are combined key by key; any other value in
/// `upper` takes the place of the one below, except `null`, which leaves it
/// untouched.
pub fn merge_layers(lower: Value, upper: Value) -> Value {
    match (lower, upper) {
        (Value::Object(lower), Value::Object(upper)) => Value::Object(merge_sections(lower, upper)),
        (lower, Value::Null) => lower,
        (_, upper) => upper,
    }
}

fn merge_sections(mut lower: Map<String, Value>, upper: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in upper {
        let combined = match lower.remove(&key) {
            Some(below) => merge_layers(below, value),
            None if value.is_null() => continue,
            None => value,
        };
        lower.insert(key, combined);
    }
    lower
}

pub fn apply_env_overrides(settings: &mut WayfarerSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Applies the `WAYFARER_*` variables that `lookup` returns. A blank variable
/// counts as unset; one that does not parse is logged and skipped.
pub fn apply_overrides<L>(settings: &mut WayfarerSettings, lookup: L)
where
    L: Fn(&str) -> Option<String>,
{
    let height = |raw: &str| parse_u32_range(raw, MIN_TOOLBAR_HEIGHT_PX, MAX_TOOLBAR_HEIGHT_PX);
    if let Some(height_px) = env_value(&lookup, TOOLBAR_HEIGHT_VAR, height) {
        settings.toolbar.height_px = height_px;
    }
    if let Some(notify) = env_value(&lookup, TOOLBAR_NOTIFY_VAR, NotifyMode::from_name) {
        settings.toolbar.notify = notify;
    }
    if let Some(level) = env_value(&lookup, LOG_LEVEL_VAR, |raw| Some(raw.trim().to_owned())) {
        settings.logging.level = level;
    }
    if let Some(json) = env_value(&lookup, LOG_JSON_VAR, parse_bool) {
        settings.logging.json = json;
    }
}

fn env_value<L, T, P>(lookup: &L, name: &str, parse: P) -> Option<T>
where
    L: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Option<T>,
{
    let raw = lookup(name).filter(|value| !value.trim().is_empty())?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!(variable = name, value = %raw, "ignoring unparsable settings override");
    }
    parsed
}

/// Accepts `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u32_range(value: &str, min: u32, max: u32) -> Option<u32> {
    let parsed: u32 = value.trim().parse().ok()?;
    (min..=max).contains(&parsed).then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::LoggingSettings;
    use super::SettingsError;
    use super::WayfarerSettings;
    use super::apply_overrides;
    use super::merge_layers;
    use super::load_settings_from_path;
    use super::parse_bool;
    use super::parse_u32_range;
    use crate::navigation::Gravity;
    use serde_json::json;
    use std::collections::HashMap;
    use wf_toolbar::NotifyMode;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = WayfarerSettings::default();
        assert_eq!(settings.toolbar.height_px, 56);
        assert_eq!(settings.toolbar.gravity, Gravity::Top);
        assert_eq!(settings.toolbar.notify, NotifyMode::EdgeTriggered);
        assert_eq!(settings.logging, LoggingSettings::default());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn file_layer_keeps_unset_keys_and_skips_nulls() {
        let merged = merge_layers(
            json!({"toolbar": {"heightPx": 56, "gravity": "top"}, "logging": {"level": "info"}}),
            json!({"toolbar": {"heightPx": 64, "gravity": null}, "extra": null}),
        );
        assert_eq!(
            merged,
            json!({"toolbar": {"heightPx": 64, "gravity": "top"}, "logging": {"level": "info"}})
        );
    }

    #[test]
    fn null_file_keeps_builtin_values() {
        let builtin = json!({"toolbar": {"heightPx": 56}});
        assert_eq!(merge_layers(builtin.clone(), json!(null)), builtin);
        assert_eq!(merge_layers(builtin, json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => panic!("{error}"),
        };
        let settings = load_settings_from_path(&dir.path().join("absent.json"));
        assert!(settings.is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => panic!("{error}"),
        };
        let path = dir.path().join("settings.json");
        let written = std::fs::write(
            &path,
            r#"{
                "toolbar": {"heightPx": 72, "notify": "every_snapshot"},
                "logging": {"json": true}
            }"#,
        );
        assert!(written.is_ok());

        let settings = match load_settings_from_path(&path) {
            Ok(settings) => settings,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(settings.toolbar.height_px, 72);
        assert_eq!(settings.toolbar.gravity, Gravity::Top);
        assert_eq!(settings.toolbar.notify, NotifyMode::EverySnapshot);
        assert!(settings.logging.json);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => panic!("{error}"),
        };
        let path = dir.path().join("settings.json");
        assert!(std::fs::write(&path, "{not json").is_ok());

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn env_overrides_apply_valid_values() {
        let mut settings = WayfarerSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("WAYFARER_TOOLBAR_HEIGHT", "48"),
                ("WAYFARER_TOOLBAR_NOTIFY", "every_snapshot"),
                ("WAYFARER_LOG_LEVEL", "debug"),
                ("WAYFARER_LOG_JSON", "yes"),
            ]),
        );
        assert_eq!(settings.toolbar.height_px, 48);
        assert_eq!(settings.toolbar.notify, NotifyMode::EverySnapshot);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.json);
    }

    #[test]
    fn env_overrides_ignore_invalid_values() {
        let mut settings = WayfarerSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("WAYFARER_TOOLBAR_HEIGHT", "0"),
                ("WAYFARER_TOOLBAR_NOTIFY", "sometimes"),
                ("WAYFARER_LOG_LEVEL", "  "),
                ("WAYFARER_LOG_JSON", "maybe"),
            ]),
        );
        assert_eq!(settings, WayfarerSettings::default());
    }

    #[test]
    fn parses_bool_words_and_ranges() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_u32_range("512", 1, 512), Some(512));
        assert_eq!(parse_u32_range("513", 1, 512), None);
        assert_eq!(parse_u32_range("-1", 1, 512), None);
    }
}
