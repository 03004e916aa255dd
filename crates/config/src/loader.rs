use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::PlazaConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["plaza.toml", "plaza.yaml", "plaza.yml", "plaza.json"];

/// File holding the persisted token and theme when no override is configured.
const STORAGE_FILENAME: &str = "storage.json";

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, discovery only looks in this
/// directory and the default storage file lives there too.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PlazaConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply `PLAZA_*`
/// environment overrides.
///
/// Search order:
/// 1. `./plaza.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/plaza/plaza.{toml,yaml,yml,json}` (user-global)
///
/// A missing or unreadable file yields the defaults.
pub fn discover_and_load() -> PlazaConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                PlazaConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            PlazaConfig::default()
        },
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config
}

fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        // Override is set, don't fall through to other locations.
        return first_existing(&dir);
    }

    if let Some(path) = first_existing(Path::new(".")) {
        return Some(path);
    }

    config_dir().and_then(|dir| first_existing(&dir))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/plaza/`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("plaza"))
}

/// Storage file for `config`: the configured path, else `storage.json` in the
/// config directory.
pub fn storage_path(config: &PlazaConfig) -> PathBuf {
    if let Some(path) = &config.storage.path {
        return path.clone();
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from(".plaza"))
        .join(STORAGE_FILENAME)
}

/// Edit the config file in place and save it.
///
/// The file is read as written: `${VAR}` placeholders are kept and `PLAZA_*`
/// environment overrides are not applied, so neither leaks into the saved
/// file. Writes to the discovered path, or `plaza.toml` in the config
/// directory when none exists yet, and returns the path written to.
pub fn update_config(edit: impl FnOnce(&mut PlazaConfig)) -> anyhow::Result<PathBuf> {
    let path = target_path();
    update_config_at(&path, edit)?;
    Ok(path)
}

/// [`update_config`] against an explicit file. A missing file starts from the
/// defaults.
pub fn update_config_at(path: &Path, edit: impl FnOnce(&mut PlazaConfig)) -> anyhow::Result<()> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_config(&raw, path)?
    } else {
        PlazaConfig::default()
    };
    edit(&mut config);
    write_config(&config, path)
}

fn target_path() -> PathBuf {
    find_config_file().unwrap_or_else(|| {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILENAMES[0])
    })
}

fn write_config(config: &PlazaConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::to_string_pretty(config)?,
        Some("yaml" | "yml") => serde_yaml::to_string(config)?,
        _ => toml::to_string_pretty(config).context("serialize config")?,
    };
    std::fs::write(path, raw)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PlazaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
