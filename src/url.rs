//! URL building for pages.

use crate::model::{Page, PageType};

/// Turns a page into an absolute URL.
pub trait UrlGenerator: Send + Sync {
    /// URL of `page` in `locale`, with `parameters` appended to the path
    /// (for example `/my-news-item`).
    fn page_url(&self, page: &Page, locale: &str, parameters: &str) -> String;
}

/// `{base}/{locale}/{alias}{parameters}.html` URLs.
#[derive(Debug, Clone)]
pub struct PathUrlGenerator {
    base_url: String,
}

impl PathUrlGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

impl UrlGenerator for PathUrlGenerator {
    fn page_url(&self, page: &Page, locale: &str, parameters: &str) -> String {
        if page.page_type == PageType::Redirect {
            if let Some(url) = &page.url {
                return url.clone();
            }
        }

        if page.is_root() {
            return format!("{}/{}/", self.base_url, locale);
        }

        let alias = if page.alias.is_empty() {
            page.id.to_string()
        } else {
            page.alias.clone()
        };
        format!("{}/{}/{}{}.html", self.base_url, locale, alias, parameters)
    }
}
