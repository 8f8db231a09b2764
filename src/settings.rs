//! User settings kept in the local store.
//!
//! [`Settings`] is the explicit context object handed to whatever needs the
//! credential or display preferences; nothing reads these keys directly.

use crate::error::{Error, Result};
use crate::store::KeyValueStore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const KEY_API_KEY: &str = "api_key";
const KEY_THEME: &str = "theme";
const KEY_BG_IMAGE: &str = "bg_image";
const KEY_BG_OPACITY: &str = "bg_opacity";

/// Opacity used when none (or garbage) is stored.
pub const DEFAULT_BG_OPACITY: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        })
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(Error::Config(format!("unknown theme {other:?}"))),
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored credential, if any non-blank one is set.
    pub fn api_key(&self) -> Option<String> {
        self.store
            .get(KEY_API_KEY)
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.store.set(KEY_API_KEY, key.trim())
    }

    pub fn clear_api_key(&self) -> Result<()> {
        self.store.remove(KEY_API_KEY)
    }

    /// Credential to use: an explicit override wins over the stored one.
    pub fn resolve_api_key(&self, override_key: Option<&str>) -> Option<String> {
        override_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .or_else(|| self.api_key())
    }

    pub fn theme(&self) -> Theme {
        self.store
            .get(KEY_THEME)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(KEY_THEME, &theme.to_string())
    }

    /// Background image data blob (typically a data URL).
    pub fn background_image(&self) -> Option<String> {
        self.store.get(KEY_BG_IMAGE)
    }

    pub fn set_background_image(&self, blob: Option<&str>) -> Result<()> {
        match blob {
            Some(b) => self.store.set(KEY_BG_IMAGE, b),
            None => self.store.remove(KEY_BG_IMAGE),
        }
    }

    pub fn background_opacity(&self) -> f32 {
        self.store
            .get(KEY_BG_OPACITY)
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(DEFAULT_BG_OPACITY)
    }

    pub fn set_background_opacity(&self, opacity: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(Error::Config(format!(
                "opacity must be within 0.0..=1.0, got {opacity}"
            )));
        }
        self.store.set(KEY_BG_OPACITY, &opacity.to_string())
    }
}
