//! # Locale Module
//!
//! Chooses between English and Japanese text. The language is resolved once
//! at startup and passed down explicitly; nothing reads the environment per
//! render.

use std::env;

/// Environment variables consulted, in order. The first non-empty one wins.
pub const LOCALE_VARS: [&str; 3] = ["LANG", "LC_ALL", "LC_MESSAGES"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    English,
    Japanese,
}

impl Lang {
    /// Interpret a POSIX locale value such as `ja_JP.UTF-8`.
    pub fn from_locale(value: &str) -> Self {
        if value.to_ascii_lowercase().starts_with("ja") {
            Lang::Japanese
        } else {
            Lang::English
        }
    }

    pub fn from_env() -> Self {
        let value = LOCALE_VARS
            .iter()
            .filter_map(|k| env::var(k).ok())
            .find(|v| !v.is_empty())
            .unwrap_or_default();
        Self::from_locale(&value)
    }

    /// Select the variant of a localized string pair.
    pub fn pick(self, en: &'static str, ja: &'static str) -> &'static str {
        match self {
            Lang::English => en,
            Lang::Japanese => ja,
        }
    }
}
