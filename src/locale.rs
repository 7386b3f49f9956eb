//! Locale codes.
//!
//! Pages only carry plain strings; this type is used where locales enter the
//! system from the outside (configuration, query strings) and have to be
//! validated first.

use anyhow::{bail, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A validated locale code such as `en`, `de`, `pt-BR` or `zh_Hant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

static LOCALE_REGEX: OnceLock<Regex> = OnceLock::new();

impl Locale {
    /// Validate a locale code.
    ///
    /// # Example
    /// ```ignore
    /// let german = Locale::parse("de")?;
    /// ```
    pub fn parse(code: &str) -> Result<Locale> {
        let regex = LOCALE_REGEX.get_or_init(|| {
            Regex::new(r"^[a-z]{2,3}([-_][A-Za-z]{2,4})?$").expect("Invalid locale regex")
        });

        let code = code.trim();
        if !regex.is_match(code) {
            bail!("Invalid locale code: '{}'", code);
        }
        Ok(Locale(code.to_string()))
    }

    /// Parse a comma-separated list, skipping empty items.
    pub fn parse_list(list: &str) -> Result<Vec<Locale>> {
        list.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(Locale::parse)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
