//! Content store boundary.
//!
//! The resolver only ever reads through the [`ContentStore`] trait. The
//! [`MemoryStore`] implementation serves a site loaded from a JSON file and is
//! what the binaries and tests run against.

use crate::content::{Article, Container, ContentEntry, ContentKind};
use crate::model::Page;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read site data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse site data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter predicates for page lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    /// Every page whose `language_main` equals the given main page id
    ByLanguageMain(u64),
    /// Direct children of a page, in sibling order
    ByParent(u64),
    /// All root pages
    Roots,
}

/// Read access to pages and the content attached to them.
///
/// Lookups that find nothing return `Ok(None)` or an empty list. Errors are
/// reserved for failures of the store itself.
pub trait ContentStore {
    fn find_page(&self, id: u64) -> StoreResult<Option<Arc<Page>>>;

    /// Pages matching `query`. `ByLanguageMain` and `Roots` results are in
    /// ascending id order, `ByParent` results in sibling order.
    fn find_pages(&self, query: &PageQuery) -> StoreResult<Vec<Arc<Page>>>;

    /// First page (ascending id) whose `language_main` is `main_id` and whose
    /// root page has locale `locale`.
    fn find_translation_in_locale(
        &self,
        main_id: u64,
        locale: &str,
    ) -> StoreResult<Option<Arc<Page>>>;

    /// Articles of a page, in id order.
    fn find_articles(&self, page_id: u64) -> StoreResult<Vec<Article>>;

    fn find_container(&self, kind: ContentKind, id: u64) -> StoreResult<Option<Container>>;

    fn find_containers(&self, kind: ContentKind) -> StoreResult<Vec<Container>>;

    /// Items of a container, in id order.
    fn find_entries(&self, kind: ContentKind, container_id: u64)
        -> StoreResult<Vec<ContentEntry>>;

    fn find_entry(&self, kind: ContentKind, id: u64) -> StoreResult<Option<ContentEntry>>;
}

/// On-disk layout of a site file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteData {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub entries: Vec<ContentEntry>,
}

/// In-memory store over a fully loaded site.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: BTreeMap<u64, Arc<Page>>,
    articles: Vec<Article>,
    containers: Vec<Container>,
    entries: Vec<ContentEntry>,
}

impl MemoryStore {
    pub fn new(data: SiteData) -> Self {
        let mut pages = BTreeMap::new();
        for page in data.pages {
            let id = page.id;
            if pages.insert(id, Arc::new(page)).is_some() {
                warn!("Duplicate page id {} in site data, keeping the last one", id);
            }
        }

        let mut articles = data.articles;
        articles.sort_by_key(|article| article.id);
        let mut entries = data.entries;
        entries.sort_by_key(|entry| entry.id);

        Self {
            pages,
            articles,
            containers: data.containers,
            entries,
        }
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let data: SiteData = serde_json::from_str(json)?;
        Ok(Self::new(data))
    }

    /// Load a site file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let store = Self::from_json(&contents)?;
        info!(
            "Loaded {} pages, {} articles, {} containers and {} entries from {}",
            store.pages.len(),
            store.articles.len(),
            store.containers.len(),
            store.entries.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Locale of the root of `page`, or of `page` itself when it is a root.
    fn root_locale_of<'p>(&'p self, page: &'p Page) -> Option<&'p str> {
        if page.is_root() {
            return page.locale.as_deref();
        }
        self.pages
            .get(&page.root_id)
            .and_then(|root| root.locale.as_deref())
    }
}

impl ContentStore for MemoryStore {
    fn find_page(&self, id: u64) -> StoreResult<Option<Arc<Page>>> {
        Ok(self.pages.get(&id).cloned())
    }

    fn find_pages(&self, query: &PageQuery) -> StoreResult<Vec<Arc<Page>>> {
        let pages = match query {
            PageQuery::ByLanguageMain(0) => {
                return Err(StoreError::InvalidQuery(
                    "language_main must be a page id".to_string(),
                ))
            }
            PageQuery::ByLanguageMain(main_id) => self
                .pages
                .values()
                .filter(|page| page.language_main == *main_id)
                .cloned()
                .collect(),
            PageQuery::ByParent(parent_id) => {
                let mut children: Vec<Arc<Page>> = self
                    .pages
                    .values()
                    .filter(|page| page.parent_id == *parent_id && page.id != *parent_id)
                    .cloned()
                    .collect();
                children.sort_by_key(|page| (page.sorting, page.id));
                children
            }
            PageQuery::Roots => self
                .pages
                .values()
                .filter(|page| page.root_id == 0)
                .cloned()
                .collect(),
        };
        Ok(pages)
    }

    fn find_translation_in_locale(
        &self,
        main_id: u64,
        locale: &str,
    ) -> StoreResult<Option<Arc<Page>>> {
        if main_id == 0 || locale.is_empty() {
            return Err(StoreError::InvalidQuery(format!(
                "translation lookup needs a main page and a locale (got {} / '{}')",
                main_id, locale
            )));
        }

        Ok(self
            .pages
            .values()
            .find(|page| page.language_main == main_id && self.root_locale_of(page) == Some(locale))
            .cloned())
    }

    fn find_articles(&self, page_id: u64) -> StoreResult<Vec<Article>> {
        Ok(self
            .articles
            .iter()
            .filter(|article| article.pid == page_id)
            .cloned()
            .collect())
    }

    fn find_container(&self, kind: ContentKind, id: u64) -> StoreResult<Option<Container>> {
        Ok(self
            .containers
            .iter()
            .find(|container| container.kind == kind && container.id == id)
            .cloned())
    }

    fn find_containers(&self, kind: ContentKind) -> StoreResult<Vec<Container>> {
        Ok(self
            .containers
            .iter()
            .filter(|container| container.kind == kind)
            .cloned()
            .collect())
    }

    fn find_entries(
        &self,
        kind: ContentKind,
        container_id: u64,
    ) -> StoreResult<Vec<ContentEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.pid == container_id)
            .cloned()
            .collect())
    }

    fn find_entry(&self, kind: ContentKind, id: u64) -> StoreResult<Option<ContentEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|entry| entry.kind == kind && entry.id == id)
            .cloned())
    }
}
