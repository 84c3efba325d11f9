use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::Duration;

const APP_DIR_NAME: &str = "earnit";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "EARNIT_CONFIG_PATH";
const DEFAULT_CURRENCY: &str = "$";
const DEFAULT_TICK_SECONDS: u64 = 1;

/// ANSI styling for the terminal front-end. Empty strings disable styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub highlight: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn highlight(&self, text: &str) -> String {
        self.wrap(self.highlight, text)
    }

    pub fn mute(&self, text: &str) -> String {
        self.wrap(self.muted, text)
    }

    fn wrap(&self, style: &str, text: &str) -> String {
        if style.is_empty() {
            text.to_string()
        } else {
            format!("{style}{text}{}", self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("alarm") => Palette {
            highlight: "\x1b[1;37;41m",
            muted: "\x1b[2m",
            reset: "\x1b[0m",
        },
        Some("noir") => Palette {
            highlight: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            highlight: "\x1b[38;5;108m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            highlight: "",
            muted: "",
            reset: "",
        },
    }
}

/// Lowercases a theme name, folds separators to `_` and resolves aliases.
pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
        } else if !cleaned.is_empty() && !cleaned.ends_with('_') {
            cleaned.push('_');
        }
    }

    let name = match cleaned.trim_matches('_') {
        "" | "vanilla" | "light" | "plain" => "default",
        "dark" | "dark_mode" | "darkmode" => "noir",
        "red" | "flash" => "alarm",
        other => other,
    };
    Some(name.to_string())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    /// Alert interval given to newly created accounts. `0` disables alerts.
    #[serde(default)]
    pub alert_minutes: Option<u32>,
    /// How long the interactive loop waits for input before re-checking
    /// alerts.
    #[serde(default)]
    pub tick_seconds: Option<u64>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
}

impl Config {
    pub fn alert_interval(&self) -> Option<Duration> {
        match self.alert_minutes {
            Some(minutes) if minutes > 0 => Some(Duration::minutes(i64::from(minutes))),
            _ => None,
        }
    }

    pub fn tick(&self) -> std::time::Duration {
        let seconds = match self.tick_seconds {
            Some(seconds) if seconds > 0 => seconds,
            _ => DEFAULT_TICK_SECONDS,
        };
        std::time::Duration::from_secs(seconds)
    }

    pub fn currency_symbol(&self) -> &str {
        match self.currency_symbol.as_deref().map(str::trim) {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ => DEFAULT_CURRENCY,
        }
    }

    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub alert_minutes: Option<u32>,
    pub tick_seconds: Option<u64>,
    pub currency_symbol: Option<String>,
}

/// Per-user directory holding the config and account files.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_input("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_input("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the config, falling back to defaults on any problem. The problem
/// is handed back so the caller can report it.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_input(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref() {
        merged.theme = canonical_theme_name(theme);
    }
    if let Some(minutes) = overrides.alert_minutes {
        merged.alert_minutes = Some(minutes);
    }
    if let Some(seconds) = overrides.tick_seconds {
        merged.tick_seconds = Some(seconds);
    }
    if let Some(symbol) = overrides.currency_symbol.as_ref() {
        merged.currency_symbol = Some(symbol.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, canonical_theme_name, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, palette_for_theme,
    };
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::Duration;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("earnit-{nanos}-{file_name}"))
    }

    #[test]
    fn missing_config_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn invalid_config_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.unwrap().code(), "invalid_input");
    }

    #[test]
    fn reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "alert_minutes": 45,
            "tick_seconds": 2,
            "currency_symbol": "€"
        });
        fs::write(&path, content.to_string()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.alert_interval(), Some(Duration::minutes(45)));
        assert_eq!(loaded.tick(), std::time::Duration::from_secs(2));
        assert_eq!(loaded.currency_symbol(), "€");
    }

    #[test]
    fn defaults_fill_gaps() {
        let config = Config {
            alert_minutes: Some(0),
            tick_seconds: Some(0),
            currency_symbol: Some("  ".into()),
            ..Config::default()
        };
        assert_eq!(config.alert_interval(), None);
        assert_eq!(config.tick(), std::time::Duration::from_secs(1));
        assert_eq!(config.currency_symbol(), "$");
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            theme: Some("default".into()),
            alert_minutes: Some(30),
            tick_seconds: Some(5),
            currency_symbol: Some("$".into()),
        };
        let overrides = ConfigOverrides {
            theme: Some("Solarized".into()),
            alert_minutes: Some(10),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme.as_deref(), Some("solarized"));
        assert_eq!(merged.alert_minutes, Some(10));
        assert_eq!(merged.tick_seconds, Some(5));
        assert_eq!(merged.currency_symbol.as_deref(), Some("$"));
        assert_eq!(base.alert_minutes, Some(30));
    }

    #[test]
    fn merge_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("noir".into()),
            ..Config::default()
        };
        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Vanilla"), Some("default".into()));
        assert_eq!(canonical_theme_name("dark-mode"), Some("noir".into()));
        assert_eq!(canonical_theme_name("RED"), Some("alarm".into()));
        assert_eq!(canonical_theme_name("  "), Some("default".into()));
        assert_eq!(canonical_theme_name("--Ocean  Blue--"), Some("ocean_blue".into()));
    }

    #[test]
    fn palette_wraps_only_when_styled() {
        let plain = palette_for_theme(None);
        assert_eq!(plain.highlight("x"), "x");

        let alarm = palette_for_theme(Some("flash"));
        assert_eq!(alarm.highlight("x"), "\x1b[1;37;41mx\x1b[0m");
        assert_eq!(palette_for_theme(Some("oceanic")), plain);
    }
}
