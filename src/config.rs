use crate::locale::Locale;
use crate::model::PageType;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Site data
    pub site_data_path: String,
    pub base_url: String,

    // Locales
    pub default_locale: Locale,
    pub supported_locales: Vec<Locale>,
    pub translation_page_types: Vec<PageType>,

    // Indexing
    pub index_protected: bool,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_locale = Locale::parse(
            &std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),
        )
        .context("DEFAULT_LOCALE is invalid")?;

        let supported_locales = match std::env::var("SUPPORTED_LOCALES") {
            Ok(list) => Locale::parse_list(&list).context("SUPPORTED_LOCALES is invalid")?,
            Err(_) => vec![default_locale.clone()],
        };

        let translation_page_types = parse_page_types(
            &std::env::var("TRANSLATION_PAGE_TYPES")
                .unwrap_or_else(|_| "localized_regular".to_string()),
        )?;

        Ok(Self {
            // Site data
            site_data_path: std::env::var("SITE_DATA_PATH").context("SITE_DATA_PATH not set")?,
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            // Locales
            default_locale,
            supported_locales,
            translation_page_types,

            // Indexing
            index_protected: std::env::var("INDEX_PROTECTED")
                .ok()
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    pub fn supported_locale_codes(&self) -> Vec<String> {
        self.supported_locales
            .iter()
            .map(|locale| locale.as_str().to_string())
            .collect()
    }
}

/// Parse a comma-separated list of page type names.
fn parse_page_types(list: &str) -> Result<Vec<PageType>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            PageType::from_name(name)
                .with_context(|| format!("Unknown page type in TRANSLATION_PAGE_TYPES: '{}'", name))
        })
        .collect()
}
