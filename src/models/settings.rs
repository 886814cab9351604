//! User preferences, persisted as `settings.toml`.
//!
//! Every setter writes the whole file straight away. Loading never writes.

use crate::hotkey::{HotKey, HotKeyPreset, Modifiers};
use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::Table;
use tracing::{error, warn};

const CONFIG_DIR_ENV: &str = "PROMPTY_CONFIG_DIR";
const SETTINGS_FILE: &str = "settings.toml";

pub const OPACITY_RANGE: (f64, f64) = (0.6, 1.0);
pub const FONT_SIZE_RANGE: (f64, f64) = (11.0, 20.0);
pub const RENDERED_FONT_SIZE_RANGE: (f64, f64) = (10.0, 24.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotKeyMode {
    #[default]
    Preset,
    Custom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppearanceMode {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontStyle {
    #[default]
    System,
    AvenirNext,
    Menlo,
    Georgia,
}

impl FontStyle {
    /// Concrete face name, `None` for the platform default
    pub fn font_name(&self, bold: bool) -> Option<&'static str> {
        match (self, bold) {
            (FontStyle::System, _) => None,
            (FontStyle::AvenirNext, true) => Some("AvenirNext-DemiBold"),
            (FontStyle::AvenirNext, false) => Some("AvenirNext-Regular"),
            (FontStyle::Menlo, true) => Some("Menlo-Bold"),
            (FontStyle::Menlo, false) => Some("Menlo-Regular"),
            (FontStyle::Georgia, true) => Some("Georgia-Bold"),
            (FontStyle::Georgia, false) => Some("Georgia"),
        }
    }
}

/// Text roles with a size offset relative to the base font size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontToken {
    Title,
    Subtitle,
    Body,
    Small,
    Badge,
}

impl FontToken {
    pub fn size_offset(&self) -> f64 {
        match self {
            FontToken::Title => 4.0,
            FontToken::Subtitle => 1.0,
            FontToken::Body => 0.0,
            FontToken::Small => -1.0,
            FontToken::Badge => -2.0,
        }
    }
}

impl fmt::Display for HotKeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotKeyMode::Preset => write!(f, "Preset"),
            HotKeyMode::Custom => write!(f, "Custom"),
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppearanceMode::System => write!(f, "System"),
            AppearanceMode::Light => write!(f, "Light"),
            AppearanceMode::Dark => write!(f, "Dark"),
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontStyle::System => write!(f, "System"),
            FontStyle::AvenirNext => write!(f, "Avenir Next"),
            FontStyle::Menlo => write!(f, "Menlo"),
            FontStyle::Georgia => write!(f, "Georgia"),
        }
    }
}

impl FromStr for HotKeyMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "preset" => Ok(HotKeyMode::Preset),
            "custom" => Ok(HotKeyMode::Custom),
            _ => bail!("unknown hotkey mode: {s} (expected preset or custom)"),
        }
    }
}

impl FromStr for AppearanceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "system" => Ok(AppearanceMode::System),
            "light" => Ok(AppearanceMode::Light),
            "dark" => Ok(AppearanceMode::Dark),
            _ => bail!("unknown appearance: {s} (expected system, light or dark)"),
        }
    }
}

impl FromStr for FontStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "system" => Ok(FontStyle::System),
            "avenirnext" => Ok(FontStyle::AvenirNext),
            "menlo" => Ok(FontStyle::Menlo),
            "georgia" => Ok(FontStyle::Georgia),
            _ => bail!("unknown font style: {s}"),
        }
    }
}

/// Persisted preference values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub hot_key_mode: HotKeyMode,
    pub hot_key_preset: HotKeyPreset,
    pub appearance: AppearanceMode,
    pub window_opacity: f64,
    pub font_style: FontStyle,
    pub font_size: f64,
    pub custom_hot_key_code: u32,
    pub custom_hot_key_modifiers: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let preset = HotKeyPreset::default().hot_key();
        Self {
            hot_key_mode: HotKeyMode::default(),
            hot_key_preset: HotKeyPreset::default(),
            appearance: AppearanceMode::default(),
            window_opacity: 0.92,
            font_style: FontStyle::default(),
            font_size: 13.0,
            custom_hot_key_code: preset.key_code,
            custom_hot_key_modifiers: preset.modifiers.bits(),
        }
    }
}

impl Settings {
    /// Each key is decoded on its own, so one bad value resets only itself.
    fn from_table(table: &Table) -> Self {
        let defaults = Settings::default();
        Self {
            hot_key_mode: field(table, "hotKeyMode", defaults.hot_key_mode),
            hot_key_preset: field(table, "hotKeyPreset", defaults.hot_key_preset),
            appearance: field(table, "appearance", defaults.appearance),
            window_opacity: field(table, "windowOpacity", defaults.window_opacity),
            font_style: field(table, "fontStyle", defaults.font_style),
            font_size: field(table, "fontSize", defaults.font_size),
            custom_hot_key_code: field(table, "customHotKeyCode", defaults.custom_hot_key_code),
            custom_hot_key_modifiers: field(
                table,
                "customHotKeyModifiers",
                defaults.custom_hot_key_modifiers,
            ),
        }
    }

    fn clamped(mut self) -> Self {
        self.window_opacity = clamp(self.window_opacity, OPACITY_RANGE);
        self.font_size = clamp(self.font_size, FONT_SIZE_RANGE);
        self
    }

    pub fn custom_hot_key(&self) -> HotKey {
        HotKey::new(
            self.custom_hot_key_code,
            Modifiers::from_bits(self.custom_hot_key_modifiers),
        )
    }
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Preference holder; constructed fully loaded, persisted on every change
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// `<config_dir>/Prompty/settings.toml`, or `$PROMPTY_CONFIG_DIR/settings.toml`
    pub fn default_path() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir).join(SETTINGS_FILE));
        }
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("Prompty").join(SETTINGS_FILE))
    }

    /// Reads settings from `path`. A missing file gives defaults; an
    /// unreadable one gives defaults with a warning. Values are clamped.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match read_settings(&path) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "ignoring unreadable settings");
                Settings::default()
            }
        };

        Self {
            path,
            settings: settings.clamped(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolved_hot_key(&self) -> HotKey {
        match self.settings.hot_key_mode {
            HotKeyMode::Preset => self.settings.hot_key_preset.hot_key(),
            HotKeyMode::Custom => self.settings.custom_hot_key(),
        }
    }

    /// Base font size plus the token offset, clamped to the renderable range
    pub fn font_size_for(&self, token: FontToken) -> f64 {
        clamp(
            self.settings.font_size + token.size_offset(),
            RENDERED_FONT_SIZE_RANGE,
        )
    }

    pub fn set_hot_key_mode(&mut self, mode: HotKeyMode) {
        self.update(|s| s.hot_key_mode = mode);
    }

    pub fn set_hot_key_preset(&mut self, preset: HotKeyPreset) {
        self.update(|s| s.hot_key_preset = preset);
    }

    pub fn set_appearance(&mut self, appearance: AppearanceMode) {
        self.update(|s| s.appearance = appearance);
    }

    pub fn set_window_opacity(&mut self, opacity: f64) {
        self.update(|s| s.window_opacity = clamp(opacity, OPACITY_RANGE));
    }

    pub fn set_font_style(&mut self, style: FontStyle) {
        self.update(|s| s.font_style = style);
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.update(|s| s.font_size = clamp(size, FONT_SIZE_RANGE));
    }

    /// Stores a recorded hotkey. A combination without modifiers is rejected.
    pub fn set_custom_hot_key(&mut self, hot_key: HotKey) -> bool {
        if hot_key.modifiers.is_empty() {
            return false;
        }
        self.update(|s| {
            s.custom_hot_key_code = hot_key.key_code;
            s.custom_hot_key_modifiers = hot_key.modifiers.bits();
        });
        true
    }

    /// String-keyed setter for the command line. Keys are the file keys.
    pub fn set_by_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "hotKeyMode" => self.set_hot_key_mode(value.parse()?),
            "hotKeyPreset" => self.set_hot_key_preset(value.parse()?),
            "appearance" => self.set_appearance(value.parse()?),
            "windowOpacity" => self.set_window_opacity(
                value
                    .parse()
                    .with_context(|| format!("not a number: {value}"))?,
            ),
            "fontStyle" => self.set_font_style(value.parse()?),
            "fontSize" => self.set_font_size(
                value
                    .parse()
                    .with_context(|| format!("not a number: {value}"))?,
            ),
            "customHotKey" => {
                let hot_key = HotKey::parse(value)
                    .with_context(|| format!("invalid shortcut: {value}"))?;
                if !self.set_custom_hot_key(hot_key) {
                    bail!("shortcut must include a modifier: {value}");
                }
            }
            _ => bail!("unknown setting: {key}"),
        }
        Ok(())
    }

    fn update(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        if let Err(e) = self.persist() {
            error!(path = %self.path.display(), error = %format!("{e:#}"), "failed to save settings");
        }
    }

    fn persist(&self) -> Result<()> {
        let content =
            toml::to_string_pretty(&self.settings).context("Failed to serialize settings")?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        fs::write(&self.path, content).context("Failed to write settings file")
    }
}

fn read_settings(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).context("Failed to read settings file")?;
    let table: Table = content.parse().context("Failed to parse settings file")?;
    Ok(Some(Settings::from_table(&table)))
}

/// Decodes `key` from `table`; a missing or invalid value yields `default`.
fn field<T: DeserializeOwned>(table: &Table, key: &str, default: T) -> T {
    let Some(value) = table.get(key) else {
        return default;
    };
    match value.clone().try_into() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(key, error = %e, "ignoring invalid setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::load(dir.path().join(SETTINGS_FILE))
    }

    #[test]
    fn defaults_when_missing_and_nothing_written() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.settings(), &Settings::default());
        assert_eq!(store.resolved_hot_key(), HotKeyPreset::CommandShiftSpace.hot_key());
        assert!(!store.path().exists());
    }

    #[test]
    fn setters_persist_immediately() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.set_appearance(AppearanceMode::Dark);
        store.set_hot_key_preset(HotKeyPreset::CommandOptionP);

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.settings().appearance, AppearanceMode::Dark);
        assert_eq!(reloaded.settings().hot_key_preset, HotKeyPreset::CommandOptionP);
    }

    #[test]
    fn opacity_and_font_size_are_clamped() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.set_window_opacity(0.1);
        assert_eq!(store.settings().window_opacity, 0.6);
        store.set_window_opacity(3.0);
        assert_eq!(store.settings().window_opacity, 1.0);

        store.set_font_size(40.0);
        assert_eq!(store.settings().font_size, 20.0);
        store.set_font_size(2.0);
        assert_eq!(store.settings().font_size, 11.0);
    }

    #[test]
    fn out_of_range_file_values_are_clamped_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "windowOpacity = 0.2\nfontSize = 99.0\n").unwrap();

        let store = SettingsStore::load(&path);

        assert_eq!(store.settings().window_opacity, 0.6);
        assert_eq!(store.settings().font_size, 20.0);
        assert_eq!(store.settings().appearance, AppearanceMode::System);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "appearance = = [").unwrap();

        let store = SettingsStore::load(&path);
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn invalid_value_resets_only_its_own_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            "appearance = \"neon\"\nwindowOpacity = 0.75\nhotKeyMode = \"custom\"\ncustomHotKeyCode = 40\n",
        )
        .unwrap();

        let mut store = SettingsStore::load(&path);
        assert_eq!(store.settings().appearance, AppearanceMode::System);
        assert_eq!(store.settings().window_opacity, 0.75);
        assert_eq!(store.settings().hot_key_mode, HotKeyMode::Custom);
        assert_eq!(store.resolved_hot_key().key_code, 40);

        store.set_font_size(14.0);

        let reloaded = SettingsStore::load(&path);
        assert_eq!(reloaded.settings().window_opacity, 0.75);
        assert_eq!(reloaded.settings().hot_key_mode, HotKeyMode::Custom);
        assert_eq!(reloaded.resolved_hot_key().key_code, 40);
        assert_eq!(reloaded.settings().font_size, 14.0);
    }

    #[test]
    fn integer_font_size_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "fontSize = 15\nfontStyle = 7\n").unwrap();

        let store = SettingsStore::load(&path);
        assert_eq!(store.settings().font_size, 15.0);
        assert_eq!(store.settings().font_style, FontStyle::default());
    }

    #[test]
    fn font_size_for_token_is_clamped() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.set_font_size(20.0);
        assert_eq!(store.font_size_for(FontToken::Title), 24.0);
        assert_eq!(store.font_size_for(FontToken::Body), 20.0);

        store.set_font_size(11.0);
        assert_eq!(store.font_size_for(FontToken::Badge), 10.0);
        assert_eq!(store.font_size_for(FontToken::Subtitle), 12.0);
    }

    #[test]
    fn custom_mode_uses_recorded_hot_key() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let recorded = HotKey::parse("Ctrl+Opt+K").unwrap();

        assert!(store.set_custom_hot_key(recorded));
        store.set_hot_key_mode(HotKeyMode::Custom);

        assert_eq!(store.resolved_hot_key(), recorded);
        assert_eq!(store_in(&dir).resolved_hot_key(), recorded);
    }

    #[test]
    fn custom_hot_key_requires_modifier() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(!store.set_custom_hot_key(HotKey::new(35, Modifiers::NONE)));
        assert!(!store.path().exists());
    }

    #[test]
    fn set_by_key_parses_values() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.set_by_key("fontStyle", "Avenir Next").unwrap();
        store.set_by_key("windowOpacity", "0.75").unwrap();
        store.set_by_key("hotKeyPreset", "commandOptionSpace").unwrap();

        assert_eq!(store.settings().font_style, FontStyle::AvenirNext);
        assert_eq!(store.settings().window_opacity, 0.75);
        assert_eq!(
            store.settings().hot_key_preset,
            HotKeyPreset::CommandOptionSpace
        );
        assert!(store.set_by_key("fontSize", "big").is_err());
        assert!(store.set_by_key("customHotKey", "P").is_err());
        assert!(store.set_by_key("nope", "1").is_err());
    }

    #[test]
    fn font_names() {
        assert_eq!(FontStyle::System.font_name(true), None);
        assert_eq!(FontStyle::Menlo.font_name(true), Some("Menlo-Bold"));
        assert_eq!(FontStyle::Georgia.font_name(false), Some("Georgia"));
    }
}
