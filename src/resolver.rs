//! Translation lookups over the page tree.
//!
//! A [`TranslationResolver`] answers "which page is the counterpart of this
//! page in locale X" and memoizes every answer for the lifetime of the
//! instance. Create one per request or CLI run; it is not `Sync` and must not
//! be shared between units of work.

use crate::metrics::ResolverMetrics;
use crate::model::{Page, PageType};
use crate::store::{ContentStore, PageQuery, StoreResult};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pages of one translation group keyed by locale.
pub type TranslationGroup = BTreeMap<String, Arc<Page>>;

/// A page given either by id or as an already loaded record.
#[derive(Debug, Clone)]
pub enum PageRef {
    Id(u64),
    Page(Arc<Page>),
}

impl PageRef {
    pub fn id(&self) -> u64 {
        match self {
            PageRef::Id(id) => *id,
            PageRef::Page(page) => page.id,
        }
    }
}

impl From<u64> for PageRef {
    fn from(id: u64) -> Self {
        PageRef::Id(id)
    }
}

impl From<Arc<Page>> for PageRef {
    fn from(page: Arc<Page>) -> Self {
        PageRef::Page(page)
    }
}

impl From<&Arc<Page>> for PageRef {
    fn from(page: &Arc<Page>) -> Self {
        PageRef::Page(Arc::clone(page))
    }
}

/// Request-scoped translation resolver.
pub struct TranslationResolver<'a> {
    store: &'a dyn ContentStore,
    current_locale: String,
    translation_types: HashSet<PageType>,
    /// page id -> main page (`None` is a cached result)
    base_page_cache: RefCell<HashMap<u64, Option<Arc<Page>>>>,
    /// locale -> page id -> translated page
    translated_page_cache: RefCell<HashMap<String, HashMap<u64, Option<Arc<Page>>>>>,
    /// main page id -> group
    translation_group_cache: RefCell<HashMap<u64, Arc<TranslationGroup>>>,
    metrics: ResolverMetrics,
}

impl<'a> TranslationResolver<'a> {
    /// Create a resolver for one unit of work in `current_locale`.
    ///
    /// Only `localized_regular` pages count as translation types until
    /// [`with_translation_types`](Self::with_translation_types) says otherwise.
    pub fn new(store: &'a dyn ContentStore, current_locale: impl Into<String>) -> Self {
        Self {
            store,
            current_locale: current_locale.into(),
            translation_types: HashSet::from([PageType::LocalizedRegular]),
            base_page_cache: RefCell::new(HashMap::new()),
            translated_page_cache: RefCell::new(HashMap::new()),
            translation_group_cache: RefCell::new(HashMap::new()),
            metrics: ResolverMetrics::new(),
        }
    }

    pub fn with_translation_types(mut self, types: impl IntoIterator<Item = PageType>) -> Self {
        self.translation_types = types.into_iter().collect();
        self
    }

    /// The underlying store, for one lookup.
    ///
    /// Every call is counted as a store query, so callers fetch the store
    /// again for each lookup instead of holding on to it.
    pub fn store(&self) -> &'a dyn ContentStore {
        self.metrics.record_store_query();
        self.store
    }

    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// Locale of the unit of work this resolver serves.
    pub fn get_current_language(&self) -> &str {
        &self.current_locale
    }

    pub fn is_translation_type(&self, page_type: PageType) -> bool {
        self.translation_types.contains(&page_type)
    }

    /// Forget every cached answer.
    pub fn clear(&self) {
        self.base_page_cache.borrow_mut().clear();
        self.translated_page_cache.borrow_mut().clear();
        self.translation_group_cache.borrow_mut().clear();
    }

    /// Load a page through the store, counting the query.
    pub fn find_page(&self, id: u64) -> StoreResult<Option<Arc<Page>>> {
        self.metrics.record_store_query();
        self.store.find_page(id)
    }

    /// Root page of `page`, or `None` when `page` is itself a root or its
    /// root cannot be loaded.
    pub fn get_root_page(&self, page: &Page) -> StoreResult<Option<Arc<Page>>> {
        if page.is_root() {
            return Ok(None);
        }
        self.find_page(page.root_id)
    }

    /// The original-language page of `page`'s translation group.
    pub fn get_main_page(&self, page: &Arc<Page>) -> StoreResult<Option<Arc<Page>>> {
        if page.is_main() {
            return Ok(Some(Arc::clone(page)));
        }
        self.find_page(page.language_main)
    }

    /// Main page of a translation-type page; other pages are returned as is.
    pub fn get_base_page(&self, page: &Arc<Page>) -> StoreResult<Option<Arc<Page>>> {
        if !self.is_translation_type(page.page_type) {
            return Ok(Some(Arc::clone(page)));
        }

        if let Some(cached) = self.base_page_cache.borrow().get(&page.id) {
            self.metrics.record_cache_hit();
            return Ok(cached.clone());
        }
        self.metrics.record_cache_miss();

        let base = self.get_main_page(page)?;
        if base.is_none() {
            debug!(
                "Page {} points to missing main page {}",
                page.id, page.language_main
            );
        }
        self.base_page_cache
            .borrow_mut()
            .insert(page.id, base.clone());
        Ok(base)
    }

    /// Locale of the tree `page` belongs to.
    pub fn get_page_locale(&self, page: &Page) -> StoreResult<Option<String>> {
        if let Some(locale) = &page.root_locale {
            return Ok(Some(locale.clone()));
        }
        if page.is_root() {
            return Ok(page.locale.clone());
        }
        Ok(self
            .get_root_page(page)?
            .and_then(|root| root.locale.clone()))
    }

    /// Every page of `page`'s translation group, keyed by locale.
    ///
    /// Members are visited in ascending id order and a later member replaces
    /// an earlier one with the same locale. Such duplicates are data errors
    /// and are logged. The group is computed once per main page; later calls
    /// return the same shared map.
    pub fn get_page_translations(&self, page: &Arc<Page>) -> StoreResult<Arc<TranslationGroup>> {
        let Some(main) = self.get_main_page(page)? else {
            debug!("Page {} has no main page, no translations", page.id);
            return Ok(Arc::new(TranslationGroup::new()));
        };

        if let Some(group) = self.translation_group_cache.borrow().get(&main.id) {
            self.metrics.record_cache_hit();
            return Ok(Arc::clone(group));
        }
        self.metrics.record_cache_miss();

        let mut group = TranslationGroup::new();
        if let Some(locale) = self.get_page_locale(&main)? {
            group.insert(locale, Arc::clone(&main));
        }

        self.metrics.record_store_query();
        let members = self
            .store
            .find_pages(&PageQuery::ByLanguageMain(main.id))?;

        for member in members {
            let Some(locale) = self.get_page_locale(&member)? else {
                debug!("Translation {} of page {} has no locale", member.id, main.id);
                continue;
            };

            if let Some(previous) = group.insert(locale.clone(), Arc::clone(&member)) {
                self.metrics.record_duplicate_locale();
                warn!(
                    "Pages {} and {} both translate page {} into '{}', using {}",
                    previous.id, member.id, main.id, locale, member.id
                );
            }
        }

        let group = Arc::new(group);
        self.translation_group_cache
            .borrow_mut()
            .insert(main.id, Arc::clone(&group));
        Ok(group)
    }

    /// Counterpart of `page` in `locale` (the current locale when `None`).
    ///
    /// Returns the page itself when it already lives in `locale` or opted out
    /// of translation, the fallback translation when its tree allows
    /// fallback, and `None` otherwise.
    pub fn get_translated_page(
        &self,
        page: impl Into<PageRef>,
        locale: Option<&str>,
    ) -> StoreResult<Option<Arc<Page>>> {
        let page = page.into();
        let locale = locale.unwrap_or(&self.current_locale).to_string();
        let id = page.id();

        let cached = self
            .translated_page_cache
            .borrow()
            .get(&locale)
            .and_then(|pages| pages.get(&id).cloned());
        if let Some(cached) = cached {
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let resolved = match page {
            PageRef::Page(page) => Some(page),
            PageRef::Id(id) => self.find_page(id)?,
        };
        let translated = match resolved {
            Some(page) => self.translate(page, &locale)?,
            None => {
                debug!("Page {} not found, nothing to translate", id);
                None
            }
        };

        self.translated_page_cache
            .borrow_mut()
            .entry(locale)
            .or_default()
            .insert(id, translated.clone());
        Ok(translated)
    }

    fn translate(&self, page: Arc<Page>, locale: &str) -> StoreResult<Option<Arc<Page>>> {
        if !self.is_translation_type(page.page_type) && page.translation_disabled {
            return Ok(Some(page));
        }

        let Some(root) = self.get_root_page(&page)? else {
            debug!("Page {} has no loadable root, no translation possible", page.id);
            return Ok(None);
        };

        if root.locale.as_deref() == Some(locale) {
            return Ok(Some(page));
        }

        if !root.allows_fallback() {
            debug!(
                "Root {} does not take part in fallback, no '{}' page for {}",
                root.id, locale, page.id
            );
            return Ok(None);
        }

        self.metrics.record_store_query();
        let translated = self.store.find_translation_in_locale(page.id, locale)?;
        if translated.is_none() {
            debug!("No '{}' translation of page {}", locale, page.id);
        }
        Ok(translated)
    }
}
