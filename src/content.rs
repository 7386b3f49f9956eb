//! Content records that hang off pages: articles, news items, calendar
//! events and FAQ entries, plus the containers that group them.

use crate::model::{is_visible, Page};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Kinds of dependent content that are routed through a container's
/// jump-target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    News,
    Event,
    Faq,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::News, ContentKind::Event, ContentKind::Faq];

    /// Parse the name used in URLs and site files.
    pub fn from_name(name: &str) -> Option<ContentKind> {
        match name {
            "news" => Some(ContentKind::News),
            "event" | "events" => Some(ContentKind::Event),
            "faq" | "faqs" => Some(ContentKind::Faq),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Event => "event",
            ContentKind::Faq => "faq",
        }
    }

    /// Name of the container that groups items of this kind.
    pub fn container_name(&self) -> &'static str {
        match self {
            ContentKind::News => "news archive",
            ContentKind::Event => "calendar",
            ContentKind::Faq => "FAQ category",
        }
    }
}

/// Where a content item points to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Rendered on the container's reader page
    #[default]
    Default,
    /// Links to another page of the site
    Internal,
    /// Links to an article
    Article,
    /// Links to an external URL
    External,
}

impl SourceKind {
    /// Whether items with this source are routed to a page at all.
    pub fn is_page_routable(&self) -> bool {
        matches!(self, SourceKind::Default | SourceKind::Internal)
    }
}

/// An article placed in a column of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    /// Owning page id
    pub pid: u64,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub title: String,
    /// Layout section ("main", "left", ...)
    #[serde(default = "default_column")]
    pub in_column: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    /// Listed as a teaser and reachable through its own URL
    #[serde(default)]
    pub show_teaser: bool,
}

fn default_column() -> String {
    "main".to_string()
}

impl Article {
    pub fn is_published_at(&self, now: i64) -> bool {
        is_visible(self.published, self.start, self.stop, now)
    }

    /// URL fragment of the article, falling back to its id.
    pub fn slug(&self) -> String {
        if self.alias.is_empty() {
            self.id.to_string()
        } else {
            self.alias.clone()
        }
    }
}

/// News archive, calendar or FAQ category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: u64,
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    /// Reader page on which the container's items are rendered
    #[serde(default)]
    pub jump_to: u64,
    #[serde(default)]
    pub protected: bool,
}

/// News item, calendar event or FAQ entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: u64,
    /// Owning container id
    pub pid: u64,
    pub kind: ContentKind,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: SourceKind,
    /// Target page of an `internal` item
    #[serde(default)]
    pub jump_to: u64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
}

impl ContentEntry {
    pub fn is_published_at(&self, now: i64) -> bool {
        is_visible(self.published, self.start, self.stop, now)
    }

    pub fn slug(&self) -> String {
        if self.alias.is_empty() {
            self.id.to_string()
        } else {
            self.alias.clone()
        }
    }
}

/// Narrow view of a routable content item shared by all kinds.
pub trait ContentItem {
    fn kind(&self) -> ContentKind;
    fn source_kind(&self) -> SourceKind;
    /// Target page of an `internal` item, if any.
    fn jump_target_page_id(&self) -> Option<u64>;
    /// Owning container id.
    fn container_id(&self) -> u64;
}

impl ContentItem for ContentEntry {
    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn source_kind(&self) -> SourceKind {
        self.source
    }

    fn jump_target_page_id(&self) -> Option<u64> {
        (self.source == SourceKind::Internal && self.jump_to > 0).then_some(self.jump_to)
    }

    fn container_id(&self) -> u64 {
        self.pid
    }
}

/// Anything a URL can be generated for.
#[derive(Debug, Clone)]
pub enum Content {
    Page(Arc<Page>),
    Entry(ContentEntry),
}

impl Content {
    pub fn as_page(&self) -> Option<&Arc<Page>> {
        match self {
            Content::Page(page) => Some(page),
            Content::Entry(_) => None,
        }
    }

    pub fn as_entry(&self) -> Option<&ContentEntry> {
        match self {
            Content::Entry(entry) => Some(entry),
            Content::Page(_) => None,
        }
    }
}

impl From<Arc<Page>> for Content {
    fn from(page: Arc<Page>) -> Self {
        Content::Page(page)
    }
}

impl From<ContentEntry> for Content {
    fn from(entry: ContentEntry) -> Self {
        Content::Entry(entry)
    }
}

/// Reference to an article by layout section, as in `main:12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSelector {
    pub section: String,
    pub article: String,
}

static SELECTOR_REGEX: OnceLock<Regex> = OnceLock::new();

impl ArticleSelector {
    /// Parse a `section:id-or-alias` pair.
    ///
    /// Returns `None` for malformed input, including an empty section or
    /// article part. Callers surface that as "not found".
    pub fn parse(input: &str) -> Option<ArticleSelector> {
        let regex = SELECTOR_REGEX.get_or_init(|| {
            Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*):([A-Za-z0-9_-]+)$")
                .expect("Invalid selector regex")
        });

        let captures = regex.captures(input.trim())?;
        Some(ArticleSelector {
            section: captures[1].to_string(),
            article: captures[2].to_string(),
        })
    }

    /// Whether `article` is the one this selector points at.
    pub fn matches(&self, article: &Article) -> bool {
        article.in_column == self.section
            && (article.alias == self.article || article.id.to_string() == self.article)
    }
}
