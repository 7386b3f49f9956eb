//! Navigation helpers built on the translation resolver: language-switch
//! links, localized forward targets and article lookup by section.

use crate::content::{Article, ArticleSelector, Content};
use crate::content_url::{ContentUrlResolverChain, ResolveRequest};
use crate::context::Context;
use crate::model::{Page, PageType};
use crate::store::{PageQuery, StoreResult};
use crate::url::UrlGenerator;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One entry of a language switcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternateLink {
    pub locale: String,
    pub page_id: u64,
    pub url: String,
    /// Link to the page currently shown
    pub active: bool,
    /// No translation exists; the link points to the locale's root page
    pub fallback: bool,
}

/// Builds language-switch links for a page.
pub struct LanguageSwitcher<'c> {
    chain: &'c ContentUrlResolverChain,
    urls: &'c dyn UrlGenerator,
    /// Locales that get a link even without a translation
    locales: Vec<String>,
}

impl<'c> LanguageSwitcher<'c> {
    pub fn new(chain: &'c ContentUrlResolverChain, urls: &'c dyn UrlGenerator) -> Self {
        Self {
            chain,
            urls,
            locales: Vec::new(),
        }
    }

    pub fn with_locales(mut self, locales: Vec<String>) -> Self {
        self.locales = locales;
        self
    }

    /// Links to every translation of `page`, followed by root-page links for
    /// configured locales that have none.
    ///
    /// The `changelanguage` context is active while the URLs are generated so
    /// that the locale-aware page resolver does not redirect each link back to
    /// the current locale.
    pub fn alternates(
        &self,
        page: &Arc<Page>,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Vec<AlternateLink>> {
        let _scope = request.contexts.scope(Context::change_language());
        let translations = request.translations;

        let current = translations
            .get_page_locale(page)?
            .unwrap_or_else(|| translations.get_current_language().to_string());
        let group = translations.get_page_translations(page)?;

        let mut links = Vec::new();
        for (locale, member) in group.iter() {
            let content = Content::Page(Arc::clone(member));
            let Some(url) = self.chain.generate_url(&content, request, self.urls)? else {
                debug!("No URL for '{}' translation {}", locale, member.id);
                continue;
            };
            links.push(AlternateLink {
                locale: locale.clone(),
                page_id: member.id,
                url,
                active: *locale == current,
                fallback: false,
            });
        }

        let missing: Vec<&String> = self
            .locales
            .iter()
            .filter(|locale| !group.contains_key(*locale))
            .collect();
        if !missing.is_empty() {
            let roots = translations.store().find_pages(&PageQuery::Roots)?;
            for locale in missing {
                let Some(root) = roots
                    .iter()
                    .find(|root| root.locale.as_deref() == Some(locale.as_str()) && root.published)
                else {
                    continue;
                };
                links.push(AlternateLink {
                    locale: locale.clone(),
                    page_id: root.id,
                    url: self.urls.page_url(root, locale, ""),
                    active: *locale == current,
                    fallback: true,
                });
            }
        }

        Ok(links)
    }
}

/// Point a forward page at the translation of its target.
///
/// Returns a detached copy with `jump_to` replaced when the target has a
/// counterpart in `locale`; otherwise returns `page` itself. The stored page
/// is never modified.
pub fn rewrite_jump_target(
    page: &Arc<Page>,
    request: &ResolveRequest<'_, '_>,
) -> StoreResult<Arc<Page>> {
    if page.page_type != PageType::Forward || page.jump_to == 0 {
        return Ok(Arc::clone(page));
    }

    match request
        .translations
        .get_translated_page(page.jump_to, request.locale)?
    {
        Some(target) if target.id != page.jump_to => {
            let mut detached = Page::clone(page);
            detached.jump_to = target.id;
            Ok(Arc::new(detached))
        }
        _ => Ok(Arc::clone(page)),
    }
}

/// Find the published article of `page_id` addressed by a `section:id`
/// selector. Malformed selectors find nothing.
pub fn find_article(
    request: &ResolveRequest<'_, '_>,
    page_id: u64,
    selector: &str,
    now: i64,
) -> StoreResult<Option<Article>> {
    let Some(selector) = ArticleSelector::parse(selector) else {
        debug!("Malformed article selector '{}'", selector);
        return Ok(None);
    };

    Ok(request
        .translations
        .store()
        .find_articles(page_id)?
        .into_iter()
        .find(|article| selector.matches(article) && article.is_published_at(now)))
}
