//! Persisted colour theme preference.

use std::{fmt, str::FromStr, sync::Arc};

use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
};

use crate::storage::{Storage, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Green,
    Blue,
    Crystal,
    Gold,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Green, Theme::Blue, Theme::Crystal, Theme::Gold];

    /// Identifier stored on disk.
    pub fn id(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Crystal => "crystal",
            Self::Gold => "gold",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "Dark green",
            Self::Blue => "Dark blue",
            Self::Crystal => "Crystal",
            Self::Gold => "White and gold",
        }
    }

    /// Accent colour as a hex string.
    pub fn accent(self) -> &'static str {
        match self {
            Self::Green => "#22c55e",
            Self::Blue => "#3b82f6",
            Self::Crystal => "#06b6d4",
            Self::Gold => "#eab308",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme: {s} (expected green, blue, crystal or gold)"))
    }
}

/// Theme choice kept under [`THEME_KEY`].
#[derive(Clone)]
pub struct ThemePreference {
    storage: Arc<dyn Storage>,
}

impl ThemePreference {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored theme; missing or unrecognised values give the default.
    pub fn get(&self) -> Theme {
        self.storage
            .get(THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn set(&self, theme: Theme) -> Result<()> {
        self.storage
            .set(THEME_KEY, theme.id())
            .context("failed to persist theme")
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::storage::MemoryStorage};

    #[test]
    fn defaults_to_green() {
        let pref = ThemePreference::new(Arc::new(MemoryStorage::new()));
        assert_eq!(pref.get(), Theme::Green);
    }

    #[test]
    fn unknown_stored_value_falls_back() {
        let storage = MemoryStorage::with_entries([(THEME_KEY, "purple")]);
        let pref = ThemePreference::new(Arc::new(storage));
        assert_eq!(pref.get(), Theme::Green);
    }

    #[test]
    fn set_persists_identifier() {
        let storage = Arc::new(MemoryStorage::new());
        let pref = ThemePreference::new(storage.clone());
        pref.set(Theme::Crystal).unwrap();
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("crystal"));
        assert_eq!(pref.get(), Theme::Crystal);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("GOLD".parse::<Theme>().unwrap(), Theme::Gold);
        assert!("neon".parse::<Theme>().is_err());
    }
}
