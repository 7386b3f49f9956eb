//! Sitemap and search-index URL collection.
//!
//! A [`PageCollector`] walks the page tree below a set of parent pages and
//! lists every URL a crawler may visit: eligible pages, their teaser
//! articles, and the items of news archives, calendars and FAQ categories
//! rendered on translated reader pages.

use crate::content::{Content, ContentKind, SourceKind};
use crate::content_url::{AliasParameters, ParameterBuilder};
use crate::model::{Page, SitemapPolicy};
use crate::resolver::TranslationResolver;
use crate::store::{PageQuery, StoreResult};
use crate::url::UrlGenerator;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// What the collected URLs are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorMode {
    Sitemap,
    Search,
}

/// Cached outcome of the eligibility check for a translated reader page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Unknown,
    Eligible,
    Ineligible,
}

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub mode: CollectorMode,
    /// Index protected pages in search mode
    pub index_protected: bool,
    /// Attach `hreflang` alternates to page URLs
    pub alternates: bool,
    /// Unix timestamp used for publication checks
    pub now: i64,
}

impl CollectorOptions {
    pub fn new(mode: CollectorMode) -> Self {
        Self {
            mode,
            index_protected: false,
            alternates: false,
            now: chrono::Utc::now().timestamp(),
        }
    }
}

/// One collected URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub url: String,
    /// Page the URL points at
    pub page_id: u64,
    /// `(locale, url)` of the page's translations
    pub alternates: Vec<(String, String)>,
}

/// Deduplicating list that keeps first-seen order.
#[derive(Debug, Default)]
struct UrlList {
    entries: Vec<SitemapEntry>,
    seen: HashSet<String>,
}

impl UrlList {
    fn push(&mut self, entry: SitemapEntry) {
        if self.seen.insert(entry.url.clone()) {
            self.entries.push(entry);
        }
    }
}

pub struct PageCollector<'r, 'a> {
    translations: &'r TranslationResolver<'a>,
    urls: &'r dyn UrlGenerator,
    options: CollectorOptions,
    /// (reader page id, translated page id) -> eligibility
    processed: RefCell<HashMap<(u64, u64), Eligibility>>,
}

impl<'r, 'a> PageCollector<'r, 'a> {
    pub fn new(
        translations: &'r TranslationResolver<'a>,
        urls: &'r dyn UrlGenerator,
        options: CollectorOptions,
    ) -> Self {
        Self {
            translations,
            urls,
            options,
            processed: RefCell::new(HashMap::new()),
        }
    }

    /// Collect URLs below each of `parent_ids`.
    ///
    /// Every parent is walked in the locale of its own tree.
    pub fn collect(&self, parent_ids: &[u64]) -> StoreResult<Vec<SitemapEntry>> {
        let mut list = UrlList::default();

        for &parent_id in parent_ids {
            let locale = self.locale_for(parent_id)?;
            debug!("Collecting {:?} URLs below page {} ({})", self.options.mode, parent_id, locale);
            let mut reached = HashSet::new();
            self.visit_children(parent_id, &locale, &mut reached, &mut list)?;
            self.collect_containers(&locale, &reached, &mut list)?;
        }

        info!(
            "Collected {} {:?} URLs below {} parent page(s)",
            list.entries.len(),
            self.options.mode,
            parent_ids.len()
        );
        Ok(list.entries)
    }

    /// Cached eligibility of a translated reader page.
    pub fn eligibility(&self, reader_id: u64, translated_id: u64) -> Eligibility {
        self.processed
            .borrow()
            .get(&(reader_id, translated_id))
            .copied()
            .unwrap_or(Eligibility::Unknown)
    }

    fn locale_for(&self, page_id: u64) -> StoreResult<String> {
        let locale = match self.translations.find_page(page_id)? {
            Some(page) => self.translations.get_page_locale(&page)?,
            None => None,
        };
        Ok(locale.unwrap_or_else(|| self.translations.get_current_language().to_string()))
    }

    /// Whether protection rules allow indexing `page` and its subtree.
    fn allows_protected(&self, page: &Page) -> bool {
        if !page.protected {
            return true;
        }
        match self.options.mode {
            CollectorMode::Sitemap => page.sitemap_policy == SitemapPolicy::Always,
            CollectorMode::Search => self.options.index_protected,
        }
    }

    fn is_listable(&self, page: &Page) -> bool {
        page.page_type.is_content()
            && page.is_published_at(self.options.now)
            && page.sitemap_policy != SitemapPolicy::Never
            && !(self.options.mode == CollectorMode::Search && page.no_search)
    }

    /// Walk the subtree below `parent_id`, recording every page whose
    /// subtree may be indexed in `reached`.
    fn visit_children(
        &self,
        parent_id: u64,
        locale: &str,
        reached: &mut HashSet<u64>,
        list: &mut UrlList,
    ) -> StoreResult<()> {
        let children = self
            .translations
            .store()
            .find_pages(&PageQuery::ByParent(parent_id))?;

        for page in children {
            if !self.allows_protected(&page) {
                debug!("Skipping protected subtree at page {}", page.id);
                continue;
            }
            if !reached.insert(page.id) {
                debug!("Page {} already visited, parent links form a cycle", page.id);
                continue;
            }

            if self.is_listable(&page) {
                list.push(SitemapEntry {
                    url: self.urls.page_url(&page, locale, ""),
                    page_id: page.id,
                    alternates: self.alternates_for(&page)?,
                });
                self.collect_articles(&page, locale, list)?;
            }

            self.visit_children(page.id, locale, reached, list)?;
        }
        Ok(())
    }

    fn collect_articles(&self, page: &Page, locale: &str, list: &mut UrlList) -> StoreResult<()> {
        for article in self.translations.store().find_articles(page.id)? {
            if article.show_teaser && article.is_published_at(self.options.now) {
                let parameters = format!("/articles/{}", article.slug());
                list.push(SitemapEntry {
                    url: self.urls.page_url(page, locale, &parameters),
                    page_id: page.id,
                    alternates: Vec::new(),
                });
            }
        }
        Ok(())
    }

    fn alternates_for(&self, page: &Arc<Page>) -> StoreResult<Vec<(String, String)>> {
        if !self.options.alternates {
            return Ok(Vec::new());
        }

        let group = self.translations.get_page_translations(page)?;
        if group.len() < 2 {
            return Ok(Vec::new());
        }

        Ok(group
            .iter()
            .filter(|(_, member)| self.is_listable(member) && self.allows_protected(member))
            .map(|(locale, member)| (locale.clone(), self.urls.page_url(member, locale, "")))
            .collect())
    }

    /// List the items of every container whose translated reader page lies
    /// in the walked subtree.
    fn collect_containers(
        &self,
        locale: &str,
        reached: &HashSet<u64>,
        list: &mut UrlList,
    ) -> StoreResult<()> {
        for kind in ContentKind::ALL {
            for container in self.translations.store().find_containers(kind)? {
                if container.jump_to == 0 {
                    continue;
                }
                if container.protected
                    && !(self.options.mode == CollectorMode::Search && self.options.index_protected)
                {
                    continue;
                }

                let Some(target) = self
                    .translations
                    .get_translated_page(container.jump_to, Some(locale))?
                else {
                    debug!(
                        "{} {} has no '{}' reader page",
                        kind.container_name(),
                        container.id,
                        locale
                    );
                    continue;
                };

                if !reached.contains(&target.id) {
                    debug!(
                        "Reader page {} of {} {} is outside the collected tree",
                        target.id,
                        kind.container_name(),
                        container.id
                    );
                    continue;
                }

                if !self.check_target(container.jump_to, &target) {
                    continue;
                }

                let target_locale = self
                    .translations
                    .get_page_locale(&target)?
                    .unwrap_or_else(|| locale.to_string());

                for entry in self.translations.store().find_entries(kind, container.id)? {
                    if entry.source != SourceKind::Default || !entry.is_published_at(self.options.now) {
                        continue;
                    }
                    let parameters = AliasParameters.parameters_for(&Content::Entry(entry), &target);
                    list.push(SitemapEntry {
                        url: self.urls.page_url(&target, &target_locale, &parameters),
                        page_id: target.id,
                        alternates: Vec::new(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Eligibility of a translated reader page, computed once per
    /// `(reader_id, target.id)`.
    fn check_target(&self, reader_id: u64, target: &Page) -> bool {
        let key = (reader_id, target.id);
        match self.eligibility(reader_id, target.id) {
            Eligibility::Eligible => true,
            Eligibility::Ineligible => false,
            Eligibility::Unknown => {
                self.translations.metrics().record_eligibility_check();
                let eligible = self.is_listable(target) && self.allows_protected(target);
                let state = if eligible {
                    Eligibility::Eligible
                } else {
                    Eligibility::Ineligible
                };
                self.processed.borrow_mut().insert(key, state);
                eligible
            }
        }
    }
}

/// Render collected entries as a sitemap document.
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" \
         xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
    );

    for entry in entries {
        let _ = writeln!(xml, "  <url>\n    <loc>{}</loc>", escape_xml(&entry.url));
        for (locale, url) in &entry.alternates {
            let _ = writeln!(
                xml,
                "    <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>",
                escape_xml(locale),
                escape_xml(url)
            );
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Article, Container, ContentEntry};
    use crate::model::fixtures::page;
    use crate::model::PageType;
    use crate::resolver::fixtures::bilingual_site;
    use crate::store::testing::CountingStore;
    use crate::store::{MemoryStore, SiteData};
    use crate::url::PathUrlGenerator;

    const NOW: i64 = 1_700_000_000;

    fn options(mode: CollectorMode) -> CollectorOptions {
        CollectorOptions {
            now: NOW,
            ..CollectorOptions::new(mode)
        }
    }

    fn urls_of(entries: &[SitemapEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.url.as_str()).collect()
    }

    fn news_item(id: u64, pid: u64, alias: &str) -> ContentEntry {
        ContentEntry {
            id,
            pid,
            kind: ContentKind::News,
            alias: alias.to_string(),
            title: String::new(),
            source: SourceKind::Default,
            jump_to: 0,
            published: true,
            start: None,
            stop: None,
        }
    }

    fn archive(id: u64, jump_to: u64) -> Container {
        Container {
            id,
            kind: ContentKind::News,
            title: String::new(),
            jump_to,
            protected: false,
        }
    }

    // ==================== Tree Traversal Tests ====================

    #[test]
    fn test_collects_published_pages_depth_first() {
        let mut site = bilingual_site();
        site.pages.push(page(111, 11, 1));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[1]).unwrap();
        assert_eq!(
            urls_of(&entries),
            vec![
                "https://example.com/en/page-11.html",
                "https://example.com/en/page-111.html",
                "https://example.com/en/page-12.html",
            ]
        );
    }

    #[test]
    fn test_unpublished_parent_still_visits_children() {
        let mut site = bilingual_site();
        site.pages[2].published = false;
        site.pages.push(page(111, 11, 1));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[1]).unwrap();
        let collected = urls_of(&entries);
        assert!(!collected.contains(&"https://example.com/en/page-11.html"));
        assert!(collected.contains(&"https://example.com/en/page-111.html"));
    }

    #[test]
    fn test_expiring_page_is_excluded() {
        let mut site = bilingual_site();
        site.pages[3].stop = Some(NOW + 30);
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[1]).unwrap();
        assert_eq!(urls_of(&entries), vec!["https://example.com/en/page-11.html"]);
    }

    #[test]
    fn test_sitemap_policy_never_and_non_content_types() {
        let mut site = bilingual_site();
        site.pages[2].sitemap_policy = SitemapPolicy::Never;
        site.pages.push(Page {
            page_type: PageType::Forward,
            ..page(13, 1, 1)
        });
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[1]).unwrap();
        assert_eq!(urls_of(&entries), vec!["https://example.com/en/page-12.html"]);
    }

    #[test]
    fn test_protected_subtree_skipped_unless_allowed() {
        let mut site = bilingual_site();
        site.pages[2].protected = true;
        site.pages.push(page(111, 11, 1));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let sitemap = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        assert_eq!(urls_of(&sitemap), vec!["https://example.com/en/page-12.html"]);

        let search_options = CollectorOptions {
            index_protected: true,
            ..options(CollectorMode::Search)
        };
        let search = PageCollector::new(&translations, &urls, search_options)
            .collect(&[1])
            .unwrap();
        assert_eq!(search.len(), 3);
    }

    #[test]
    fn test_always_policy_lists_protected_page_in_sitemap() {
        let mut site = bilingual_site();
        site.pages[2].protected = true;
        site.pages[2].sitemap_policy = SitemapPolicy::Always;
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_search_mode_skips_no_search_pages() {
        let mut site = bilingual_site();
        site.pages[3].no_search = true;
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let search = PageCollector::new(&translations, &urls, options(CollectorMode::Search))
            .collect(&[1])
            .unwrap();
        assert_eq!(urls_of(&search), vec!["https://example.com/en/page-11.html"]);

        let sitemap = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        assert_eq!(sitemap.len(), 2);
    }

    #[test]
    fn test_teaser_articles_are_listed() {
        let mut site = bilingual_site();
        site.articles.push(Article {
            id: 7,
            pid: 11,
            alias: "intro".to_string(),
            title: String::new(),
            in_column: "main".to_string(),
            published: true,
            start: None,
            stop: None,
            show_teaser: true,
        });
        site.articles.push(Article {
            id: 8,
            pid: 11,
            alias: "hidden".to_string(),
            title: String::new(),
            in_column: "main".to_string(),
            published: true,
            start: None,
            stop: None,
            show_teaser: false,
        });
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        let collected = urls_of(&entries);
        assert!(collected.contains(&"https://example.com/en/page-11/articles/intro.html"));
        assert!(!collected.iter().any(|url| url.contains("hidden")));
    }

    // ==================== Container Tests ====================

    #[test]
    fn test_news_items_listed_on_translated_reader_page() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 11));
        site.entries.push(news_item(100, 5, "launch"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[2])
            .unwrap();
        assert_eq!(
            urls_of(&entries),
            vec![
                "https://example.com/de/page-21.html",
                "https://example.com/de/page-21/launch.html",
            ]
        );
    }

    #[test]
    fn test_untranslated_reader_page_is_skipped() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 12));
        site.entries.push(news_item(100, 5, "launch"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[2])
            .unwrap();
        assert!(!urls_of(&entries).iter().any(|url| url.contains("launch")));
    }

    #[test]
    fn test_non_default_items_are_not_listed() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 11));
        let mut external = news_item(100, 5, "elsewhere");
        external.source = SourceKind::External;
        site.entries.push(external);
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        assert!(!urls_of(&entries).iter().any(|url| url.contains("elsewhere")));
    }

    #[test]
    fn test_eligibility_checked_once_per_translated_target() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 11));
        site.containers.push(archive(6, 11));
        site.entries.push(news_item(100, 5, "first"));
        site.entries.push(news_item(101, 6, "second"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[2]).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(translations.metrics().eligibility_checks(), 1);
        assert_eq!(collector.eligibility(11, 21), Eligibility::Eligible);
    }

    #[test]
    fn test_ineligible_target_short_circuits() {
        let mut site = bilingual_site();
        site.pages[4].published = false;
        site.containers.push(archive(5, 11));
        site.containers.push(archive(6, 11));
        site.entries.push(news_item(100, 5, "first"));
        site.entries.push(news_item(101, 6, "second"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let entries = collector.collect(&[2]).unwrap();

        assert!(entries.is_empty());
        assert_eq!(translations.metrics().eligibility_checks(), 1);
        assert_eq!(collector.eligibility(11, 21), Eligibility::Ineligible);
        assert_eq!(collector.eligibility(12, 12), Eligibility::Unknown);
    }

    #[test]
    fn test_urls_are_deduplicated() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 11));
        site.entries.push(news_item(100, 5, "launch"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1, 1])
            .unwrap();
        let unique: HashSet<&str> = urls_of(&entries).into_iter().collect();
        assert_eq!(unique.len(), entries.len());
    }

    #[test]
    fn test_items_below_protected_ancestor_are_not_listed() {
        let mut site = bilingual_site();
        site.pages.push(Page {
            protected: true,
            ..page(13, 1, 1)
        });
        site.pages.push(page(131, 13, 1));
        site.containers.push(archive(5, 131));
        site.entries.push(news_item(100, 5, "secret"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        let collected = urls_of(&entries);
        assert!(!collected.iter().any(|url| url.contains("page-131")));
        assert!(!collected.iter().any(|url| url.contains("secret")));

        let search_options = CollectorOptions {
            index_protected: true,
            ..options(CollectorMode::Search)
        };
        let search = PageCollector::new(&translations, &urls, search_options)
            .collect(&[1])
            .unwrap();
        assert!(urls_of(&search).contains(&"https://example.com/en/page-131/secret.html"));
    }

    #[test]
    fn test_items_outside_walked_subtree_are_not_listed() {
        let mut site = bilingual_site();
        site.pages.push(page(13, 1, 1));
        site.pages.push(page(131, 13, 1));
        site.containers.push(archive(5, 131));
        site.entries.push(news_item(100, 5, "secret"));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap));

        let below_11 = collector.collect(&[11]).unwrap();
        assert!(below_11.is_empty());
        assert_eq!(translations.metrics().eligibility_checks(), 0);

        let below_13 = collector.collect(&[13]).unwrap();
        assert_eq!(
            urls_of(&below_13),
            vec![
                "https://example.com/en/page-131.html",
                "https://example.com/en/page-131/secret.html",
            ]
        );
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut site = bilingual_site();
        site.pages.push(page(31, 32, 1));
        site.pages.push(page(32, 31, 1));
        let store = MemoryStore::new(site);
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[31])
            .unwrap();
        assert_eq!(
            urls_of(&entries),
            vec![
                "https://example.com/en/page-32.html",
                "https://example.com/en/page-31.html",
            ]
        );
    }

    #[test]
    fn test_every_store_lookup_is_counted() {
        let mut site = bilingual_site();
        site.containers.push(archive(5, 11));
        site.entries.push(news_item(100, 5, "launch"));
        let store = CountingStore::new(site);
        let translations = TranslationResolver::new(&store, "de");
        let urls = PathUrlGenerator::new("https://example.com");

        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1, 2])
            .unwrap();

        assert!(urls_of(&entries).contains(&"https://example.com/de/page-21/launch.html"));
        assert_eq!(store.calls("find_containers"), 2 * ContentKind::ALL.len());
        assert!(store.calls("find_entries") > 0);
        assert!(store.calls("find_articles") > 0);
        assert_eq!(translations.metrics().store_queries(), store.total_calls());
    }

    // ==================== Alternates Tests ====================

    #[test]
    fn test_alternates_attached_to_translated_pages() {
        let store = MemoryStore::new(bilingual_site());
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let collector_options = CollectorOptions {
            alternates: true,
            ..options(CollectorMode::Sitemap)
        };

        let entries = PageCollector::new(&translations, &urls, collector_options)
            .collect(&[1])
            .unwrap();

        let a1 = entries.iter().find(|entry| entry.page_id == 11).unwrap();
        assert_eq!(
            a1.alternates,
            vec![
                ("de".to_string(), "https://example.com/de/page-21.html".to_string()),
                ("en".to_string(), "https://example.com/en/page-11.html".to_string()),
            ]
        );
        let a2 = entries.iter().find(|entry| entry.page_id == 12).unwrap();
        assert!(a2.alternates.is_empty());
    }

    // ==================== XML Tests ====================

    #[test]
    fn test_render_sitemap_xml() {
        let entries = vec![SitemapEntry {
            url: "https://example.com/en/a&b.html".to_string(),
            page_id: 1,
            alternates: vec![("de".to_string(), "https://example.com/de/a.html".to_string())],
        }];

        let xml = render_sitemap_xml(&entries);
        assert!(xml.contains("<loc>https://example.com/en/a&amp;b.html</loc>"));
        assert!(xml.contains("hreflang=\"de\""));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_render_empty_sitemap() {
        let xml = render_sitemap_xml(&[]);
        assert!(xml.contains("<urlset"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_missing_parent_collects_nothing() {
        let store = MemoryStore::new(SiteData::default());
        let translations = TranslationResolver::new(&store, "en");
        let urls = PathUrlGenerator::new("https://example.com");
        let entries = PageCollector::new(&translations, &urls, options(CollectorMode::Sitemap))
            .collect(&[1])
            .unwrap();
        assert!(entries.is_empty());
    }
}
