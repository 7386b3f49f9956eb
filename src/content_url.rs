//! Content URL resolvers.
//!
//! Each resolver knows how to route one kind of content to a page. They are
//! tried in order by a [`ContentUrlResolverChain`]; the first resolver that
//! returns a result wins. Locale handling is delegated to the
//! [`TranslationResolver`] carried by the [`ResolveRequest`].

use crate::content::{Content, ContentItem, ContentKind, SourceKind};
use crate::context::{Context, ContextStack};
use crate::model::{Page, PageType};
use crate::resolver::TranslationResolver;
use crate::store::{PageQuery, StoreResult};
use crate::url::UrlGenerator;
use std::sync::Arc;
use tracing::debug;

/// Outcome of routing a content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentUrlResult {
    /// Send the client to this page with an HTTP redirect
    Redirect(Arc<Page>),
    /// Render the content on this page
    Resolve(Arc<Page>),
}

impl ContentUrlResult {
    pub fn page(&self) -> &Arc<Page> {
        match self {
            ContentUrlResult::Redirect(page) | ContentUrlResult::Resolve(page) => page,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, ContentUrlResult::Redirect(_))
    }
}

/// Everything a resolver needs for one call.
#[derive(Clone, Copy)]
pub struct ResolveRequest<'r, 'a> {
    pub translations: &'r TranslationResolver<'a>,
    pub contexts: &'r ContextStack,
    /// Target locale; the resolver's current locale when `None`
    pub locale: Option<&'r str>,
}

impl<'r, 'a> ResolveRequest<'r, 'a> {
    pub fn new(translations: &'r TranslationResolver<'a>, contexts: &'r ContextStack) -> Self {
        Self {
            translations,
            contexts,
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: &'r str) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Translate `page`, keeping the original when there is no counterpart.
    fn translated_or_original(&self, page: &Arc<Page>) -> StoreResult<Arc<Page>> {
        Ok(self
            .translations
            .get_translated_page(page, self.locale)?
            .unwrap_or_else(|| Arc::clone(page)))
    }
}

/// Routes content items to pages.
pub trait ContentUrlResolver: Send + Sync {
    /// Route `content`, or return `None` when this resolver does not apply.
    fn resolve(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>>;

    /// URL parameters for rendering `content` on `page`, or `None` when this
    /// resolver does not handle `content`.
    fn parameters_for_content(
        &self,
        _content: &Content,
        _page: &Arc<Page>,
        _request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<String>> {
        Ok(None)
    }
}

/// Builds the path parameters that identify a content item on its page.
pub trait ParameterBuilder: Send + Sync {
    fn parameters_for(&self, content: &Content, page: &Page) -> String;
}

/// `/{alias}` parameters for entries; pages need none.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliasParameters;

impl ParameterBuilder for AliasParameters {
    fn parameters_for(&self, content: &Content, _page: &Page) -> String {
        match content {
            Content::Entry(entry) => format!("/{}", entry.slug()),
            Content::Page(_) => String::new(),
        }
    }
}

/// Routes pages without any locale handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPageResolver;

impl DefaultPageResolver {
    pub fn resolve_page(
        &self,
        page: &Arc<Page>,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        match page.page_type {
            PageType::Redirect => Ok(Some(ContentUrlResult::Redirect(Arc::clone(page)))),
            PageType::Forward => {
                let target = if page.jump_to > 0 {
                    match request.translations.find_page(page.jump_to)? {
                        Some(target) => Some(request.translated_or_original(&target)?),
                        None => None,
                    }
                } else {
                    request
                        .translations
                        .store()
                        .find_pages(&PageQuery::ByParent(page.id))?
                        .into_iter()
                        .find(|child| child.page_type.is_content() && child.published)
                };

                match target {
                    Some(target) => Ok(Some(ContentUrlResult::Redirect(target))),
                    None => {
                        debug!("Forward page {} has no target", page.id);
                        Ok(None)
                    }
                }
            }
            _ => Ok(Some(ContentUrlResult::Resolve(Arc::clone(page)))),
        }
    }
}

impl ContentUrlResolver for DefaultPageResolver {
    fn resolve(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        match content.as_page() {
            Some(page) => self.resolve_page(page, request),
            None => Ok(None),
        }
    }
}

/// Routes pages to their counterpart in the requested locale.
///
/// Defers (returns `None`) while language-switch links are being built, so
/// that those links point at the page they were generated for.
#[derive(Debug, Clone, Copy, Default)]
pub struct I18nPageResolver {
    fallback: DefaultPageResolver,
}

impl ContentUrlResolver for I18nPageResolver {
    fn resolve(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        let Some(page) = content.as_page() else {
            return Ok(None);
        };

        if request
            .contexts
            .match_current_context(&Context::change_language(), false)
        {
            debug!("Language switch in progress, deferring page {}", page.id);
            return Ok(None);
        }

        match request.translations.get_translated_page(page, request.locale)? {
            Some(translated) if translated.id != page.id => {
                Ok(Some(ContentUrlResult::Resolve(translated)))
            }
            _ => self.fallback.resolve_page(page, request),
        }
    }
}

/// Routes news items, calendar events or FAQ entries.
///
/// One instance handles one [`ContentKind`]; all kinds follow the same rules.
pub struct EntryResolver {
    kind: ContentKind,
    parameters: Box<dyn ParameterBuilder>,
}

impl EntryResolver {
    pub fn new(kind: ContentKind) -> Self {
        Self::with_parameters(kind, Box::new(AliasParameters))
    }

    pub fn with_parameters(kind: ContentKind, parameters: Box<dyn ParameterBuilder>) -> Self {
        Self { kind, parameters }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    fn redirect_to(
        &self,
        target_id: u64,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        let Some(target) = request.translations.find_page(target_id)? else {
            debug!("Internal {} target page {} not found", self.kind.name(), target_id);
            return Ok(None);
        };
        let target = request.translated_or_original(&target)?;
        Ok(Some(ContentUrlResult::Redirect(target)))
    }

    fn resolve_on_reader_page(
        &self,
        container_id: u64,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        let Some(container) = request
            .translations
            .store()
            .find_container(self.kind, container_id)?
        else {
            debug!("{} {} not found", self.kind.container_name(), container_id);
            return Ok(None);
        };
        if container.jump_to == 0 {
            debug!(
                "{} {} has no reader page",
                self.kind.container_name(),
                container.id
            );
            return Ok(None);
        }

        let Some(reader) = request.translations.find_page(container.jump_to)? else {
            return Ok(None);
        };
        let reader = request.translated_or_original(&reader)?;
        Ok(Some(ContentUrlResult::Resolve(reader)))
    }
}

impl ContentUrlResolver for EntryResolver {
    fn resolve(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        let Some(entry) = content.as_entry() else {
            return Ok(None);
        };
        if entry.kind() != self.kind || !entry.source_kind().is_page_routable() {
            return Ok(None);
        }

        match entry.source_kind() {
            SourceKind::Internal => match entry.jump_target_page_id() {
                Some(target_id) => self.redirect_to(target_id, request),
                None => Ok(None),
            },
            _ => self.resolve_on_reader_page(entry.container_id(), request),
        }
    }

    fn parameters_for_content(
        &self,
        content: &Content,
        page: &Arc<Page>,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<String>> {
        match content.as_entry() {
            Some(entry) if entry.kind() == self.kind => {
                let page = request.translated_or_original(page)?;
                Ok(Some(self.parameters.parameters_for(content, &page)))
            }
            _ => Ok(None),
        }
    }
}

/// Ordered list of resolvers.
pub struct ContentUrlResolverChain {
    resolvers: Vec<Box<dyn ContentUrlResolver>>,
}

impl ContentUrlResolverChain {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Locale-aware page routing, then plain page routing, then one entry
    /// resolver per content kind.
    pub fn with_defaults() -> Self {
        let mut chain = Self::new()
            .with(Box::new(I18nPageResolver::default()))
            .with(Box::new(DefaultPageResolver));
        for kind in ContentKind::ALL {
            chain = chain.with(Box::new(EntryResolver::new(kind)));
        }
        chain
    }

    pub fn with(mut self, resolver: Box<dyn ContentUrlResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn resolve(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<Option<ContentUrlResult>> {
        for resolver in &self.resolvers {
            if let Some(result) = resolver.resolve(content, request)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    pub fn parameters_for_content(
        &self,
        content: &Content,
        page: &Arc<Page>,
        request: &ResolveRequest<'_, '_>,
    ) -> StoreResult<String> {
        for resolver in &self.resolvers {
            if let Some(parameters) = resolver.parameters_for_content(content, page, request)? {
                return Ok(parameters);
            }
        }
        Ok(String::new())
    }

    /// Absolute URL for `content`, or `None` when it cannot be routed.
    pub fn generate_url(
        &self,
        content: &Content,
        request: &ResolveRequest<'_, '_>,
        urls: &dyn UrlGenerator,
    ) -> StoreResult<Option<String>> {
        if request
            .contexts
            .match_current_context(&Context::UrlGuard, true)
        {
            debug!("URL generation re-entered while building parameters, skipping");
            return Ok(None);
        }

        let Some(result) = self.resolve(content, request)? else {
            return Ok(None);
        };

        let page = result.page();
        let parameters = match result {
            ContentUrlResult::Resolve(_) => {
                // Entered after resolving so that resolvers still see the
                // context their caller entered.
                let _guard = request.contexts.scope(Context::UrlGuard);
                self.parameters_for_content(content, page, request)?
            }
            ContentUrlResult::Redirect(_) => String::new(),
        };
        let locale = request
            .translations
            .get_page_locale(page)?
            .unwrap_or_else(|| request.translations.get_current_language().to_string());

        Ok(Some(urls.page_url(page, &locale, &parameters)))
    }
}

impl Default for ContentUrlResolverChain {
    fn default() -> Self {
        Self::with_defaults()
    }
}
