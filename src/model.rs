//! Page records as read from the content store.
//!
//! Pages form rooted trees. The root of each tree carries the locale for all
//! of its descendants, and translations of the same page are linked through
//! `language_main`.

use serde::{Deserialize, Serialize};

/// Seconds of slack applied to the `stop` side of a visibility window.
///
/// A page that expires within the next minute is already treated as
/// unpublished so that cached listings do not link to it.
pub const STOP_GRACE_SECONDS: i64 = 60;

/// Discriminates how a page behaves when it is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Ordinary content page
    Regular,
    /// Content page that only exists inside a localized tree
    LocalizedRegular,
    /// Redirects to an external URL
    Redirect,
    /// Forwards to another page of the site (`jump_to` or first child)
    Forward,
    /// Top-level page of a tree; carries the locale
    Root,
    /// Error page (404, 403, ...)
    Error,
}

impl PageType {
    /// Parse the snake_case name used in configuration and site files.
    pub fn from_name(name: &str) -> Option<PageType> {
        match name.trim() {
            "regular" => Some(PageType::Regular),
            "localized_regular" => Some(PageType::LocalizedRegular),
            "redirect" => Some(PageType::Redirect),
            "forward" => Some(PageType::Forward),
            "root" => Some(PageType::Root),
            "error" => Some(PageType::Error),
            _ => None,
        }
    }

    /// Whether pages of this type render content and can be listed in a
    /// sitemap or search index.
    pub fn is_content(&self) -> bool {
        matches!(self, PageType::Regular | PageType::LocalizedRegular)
    }
}

/// Per-page sitemap setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SitemapPolicy {
    /// Always list the page, even when it is protected
    Always,
    /// Never list the page
    Never,
    /// List the page when it is otherwise eligible
    #[default]
    Default,
}

/// A node of the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,

    /// Parent page id (0 = top level)
    #[serde(default)]
    pub parent_id: u64,

    /// Id of the tree's root page (0 if this page is itself a root)
    #[serde(default)]
    pub root_id: u64,

    #[serde(rename = "type")]
    pub page_type: PageType,

    /// 0 for a main page, otherwise the id of the main page this translates
    #[serde(default)]
    pub language_main: u64,

    /// Locale of a root page; empty on other pages
    #[serde(default)]
    pub locale: Option<String>,

    /// Locale of the page's root when it was joined in at load time
    #[serde(default)]
    pub root_locale: Option<String>,

    /// Root pages only: whether other trees may fall back to translations
    /// living under this root
    #[serde(default)]
    pub fallback_enabled: bool,

    /// Root pages only: a value > 0 marks this root as a pointer to another
    /// root, which never acts as a fallback source
    #[serde(default)]
    pub locale_override_root_id: u64,

    #[serde(default)]
    pub translation_disabled: bool,

    #[serde(default)]
    pub protected: bool,

    #[serde(default)]
    pub sitemap_policy: SitemapPolicy,

    /// Exclude from the search index
    #[serde(default)]
    pub no_search: bool,

    #[serde(default)]
    pub published: bool,

    /// Unix timestamp from which the page is visible
    #[serde(default)]
    pub start: Option<i64>,

    /// Unix timestamp at which the page stops being visible
    #[serde(default)]
    pub stop: Option<i64>,

    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub title: String,

    /// Sibling order
    #[serde(default)]
    pub sorting: i64,

    /// Target page of a forward page (0 = first child)
    #[serde(default)]
    pub jump_to: u64,

    /// Target of a redirect page
    #[serde(default)]
    pub url: Option<String>,
}

impl Page {
    /// Whether this page is the original of its translation group.
    pub fn is_main(&self) -> bool {
        self.language_main == 0
    }

    pub fn is_root(&self) -> bool {
        self.page_type == PageType::Root || self.root_id == 0
    }

    /// Whether the page may act as a source of cross-locale fallback lookups.
    ///
    /// Only meaningful on root pages.
    pub fn allows_fallback(&self) -> bool {
        self.fallback_enabled && self.locale_override_root_id == 0
    }

    /// Whether the page is published at `now` (unix seconds).
    pub fn is_published_at(&self, now: i64) -> bool {
        is_visible(self.published, self.start, self.stop, now)
    }
}

/// Shared visibility-window test for pages and content records.
pub fn is_visible(published: bool, start: Option<i64>, stop: Option<i64>, now: i64) -> bool {
    published
        && start.map_or(true, |start| start <= now)
        && stop.map_or(true, |stop| stop > now + STOP_GRACE_SECONDS)
}
