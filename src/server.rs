//! HTTP surface over the resolver.
//!
//! Every request gets its own [`TranslationResolver`] and [`ContextStack`].
//! Both are built and dropped inside a synchronous function so that no
//! request-scoped state is held across an await point.

use crate::collector::{render_sitemap_xml, CollectorMode, CollectorOptions, PageCollector};
use crate::config::Config;
use crate::content::{Article, Content, ContentKind};
use crate::content_url::{ContentUrlResolverChain, ResolveRequest};
use crate::context::ContextStack;
use crate::locale::Locale;
use crate::model::Page;
use crate::navigation::{find_article, rewrite_jump_target, AlternateLink, LanguageSwitcher};
use crate::resolver::TranslationResolver;
use crate::store::{MemoryStore, PageQuery, StoreError};
use crate::url::PathUrlGenerator;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub struct AppState {
    pub config: Config,
    pub store: MemoryStore,
    pub chain: ContentUrlResolverChain,
    pub urls: PathUrlGenerator,
}

impl AppState {
    pub fn new(config: Config, store: MemoryStore) -> Self {
        let urls = PathUrlGenerator::new(config.base_url.clone());
        Self {
            config,
            store,
            chain: ContentUrlResolverChain::with_defaults(),
            urls,
        }
    }

    /// Run `f` with a fresh resolver for `locale`.
    fn with_request<T>(
        &self,
        locale: &Locale,
        f: impl FnOnce(&ResolveRequest<'_, '_>) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let translations = TranslationResolver::new(&self.store, locale.as_str())
            .with_translation_types(self.config.translation_page_types.iter().copied());
        let contexts = ContextStack::new();
        let request = ResolveRequest::new(&translations, &contexts);

        let result = f(&request);
        debug!("Resolver metrics: {:?}", translations.metrics().report());
        result
    }

    fn locale(&self, query: &LocaleQuery) -> Result<Locale, ApiError> {
        match &query.locale {
            Some(code) => Locale::parse(code).map_err(|e| ApiError::BadRequest(e.to_string())),
            None => Ok(self.config.default_locale.clone()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SitemapQuery {
    pub locale: Option<String>,
    /// Collect search-index URLs instead of sitemap URLs
    #[serde(default)]
    pub search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub id: u64,
    pub locale: Option<String>,
    pub title: String,
    pub url: Option<String>,
}

/// Forward target of a page in the requested locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpTarget {
    pub id: u64,
    pub jump_to: u64,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub pages: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sitemap.xml", get(sitemap))
        .route("/pages/:id/translation", get(translation))
        .route("/pages/:id/translations", get(translations))
        .route("/pages/:id/alternates", get(alternates))
        .route("/pages/:id/jump-target", get(jump_target))
        .route("/pages/:id/articles/:selector", get(article))
        .route("/content/:kind/:id", get(content_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        pages: state.store.page_count(),
    })
}

async fn sitemap(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SitemapQuery>,
) -> Result<Response, ApiError> {
    let body = build_sitemap(&state, &query)?;
    if query.search {
        Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
    } else {
        Ok(([(header::CONTENT_TYPE, "application/xml")], body).into_response())
    }
}

async fn translation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<PageSummary>, ApiError> {
    translated_page(&state, id, &query).map(Json)
}

async fn translations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<BTreeMap<String, PageSummary>>, ApiError> {
    translation_group(&state, id).map(Json)
}

async fn alternates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<Vec<AlternateLink>>, ApiError> {
    alternate_links(&state, id, &query).map(Json)
}

async fn jump_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<JumpTarget>, ApiError> {
    localized_jump_target(&state, id, &query).map(Json)
}

async fn article(
    State(state): State<Arc<AppState>>,
    Path((id, selector)): Path<(u64, String)>,
) -> Result<Json<Article>, ApiError> {
    page_article(&state, id, &selector, chrono::Utc::now().timestamp()).map(Json)
}

async fn content_url(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, u64)>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let url = entry_url(&state, &kind, id, &query)?;
    Ok(Json(serde_json::json!({ "url": url })))
}

/// Sitemap XML, or a newline-separated URL list in search mode.
pub fn build_sitemap(state: &AppState, query: &SitemapQuery) -> Result<String, ApiError> {
    let locale = state.locale(&LocaleQuery {
        locale: query.locale.clone(),
    })?;
    let mode = if query.search {
        CollectorMode::Search
    } else {
        CollectorMode::Sitemap
    };

    state.with_request(&locale, |request| {
        let roots: Vec<u64> = request
            .translations
            .store()
            .find_pages(&PageQuery::Roots)?
            .iter()
            .filter(|root| query.locale.is_none() || root.locale.as_deref() == Some(locale.as_str()))
            .map(|root| root.id)
            .collect();

        let mut options = CollectorOptions::new(mode);
        options.index_protected = state.config.index_protected;
        options.alternates = mode == CollectorMode::Sitemap;

        let collector = PageCollector::new(request.translations, &state.urls, options);
        let entries = collector.collect(&roots)?;

        Ok(match mode {
            CollectorMode::Sitemap => render_sitemap_xml(&entries),
            CollectorMode::Search => entries
                .iter()
                .map(|entry| format!("{}\n", entry.url))
                .collect(),
        })
    })
}

pub fn translated_page(
    state: &AppState,
    id: u64,
    query: &LocaleQuery,
) -> Result<PageSummary, ApiError> {
    let locale = state.locale(query)?;
    state.with_request(&locale, |request| {
        let page = request
            .translations
            .get_translated_page(id, None)?
            .ok_or_else(|| ApiError::NotFound(format!("No '{}' page for {}", locale, id)))?;
        summarize(state, request, &page)
    })
}

pub fn translation_group(
    state: &AppState,
    id: u64,
) -> Result<BTreeMap<String, PageSummary>, ApiError> {
    let locale = state.config.default_locale.clone();
    state.with_request(&locale, |request| {
        let page = request
            .translations
            .find_page(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Page {} not found", id)))?;

        let group = request.translations.get_page_translations(&page)?;
        let mut summaries = BTreeMap::new();
        for (locale, member) in group.iter() {
            summaries.insert(locale.clone(), summarize(state, request, member)?);
        }
        Ok(summaries)
    })
}

pub fn alternate_links(
    state: &AppState,
    id: u64,
    query: &LocaleQuery,
) -> Result<Vec<AlternateLink>, ApiError> {
    let locale = state.locale(query)?;
    state.with_request(&locale, |request| {
        let page = request
            .translations
            .find_page(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Page {} not found", id)))?;

        Ok(LanguageSwitcher::new(&state.chain, &state.urls)
            .with_locales(state.config.supported_locale_codes())
            .alternates(&page, request)?)
    })
}

pub fn entry_url(
    state: &AppState,
    kind: &str,
    id: u64,
    query: &LocaleQuery,
) -> Result<String, ApiError> {
    let kind = ContentKind::from_name(kind)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown content kind '{}'", kind)))?;
    let locale = state.locale(query)?;

    state.with_request(&locale, |request| {
        let entry = request
            .translations
            .store()
            .find_entry(kind, id)?
            .ok_or_else(|| ApiError::NotFound(format!("No {} entry {}", kind.name(), id)))?;

        state
            .chain
            .generate_url(&Content::Entry(entry), request, &state.urls)?
            .ok_or_else(|| ApiError::NotFound(format!("{} entry {} has no URL", kind.name(), id)))
    })
}

/// The forward target of page `id`, pointed at its counterpart in the
/// requested locale when one exists.
pub fn localized_jump_target(
    state: &AppState,
    id: u64,
    query: &LocaleQuery,
) -> Result<JumpTarget, ApiError> {
    let locale = state.locale(query)?;
    state.with_request(&locale, |request| {
        let page = request
            .translations
            .find_page(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Page {} not found", id)))?;

        let rewritten = rewrite_jump_target(&page, request)?;
        Ok(JumpTarget {
            id: rewritten.id,
            jump_to: rewritten.jump_to,
        })
    })
}

/// The published article of page `id` addressed by a `section:id` selector.
pub fn page_article(
    state: &AppState,
    id: u64,
    selector: &str,
    now: i64,
) -> Result<Article, ApiError> {
    let locale = state.config.default_locale.clone();
    state.with_request(&locale, |request| {
        find_article(request, id, selector, now)?.ok_or_else(|| {
            ApiError::NotFound(format!("No article '{}' on page {}", selector, id))
        })
    })
}

fn summarize(
    state: &AppState,
    request: &ResolveRequest<'_, '_>,
    page: &Arc<Page>,
) -> Result<PageSummary, ApiError> {
    let content = Content::Page(Arc::clone(page));
    Ok(PageSummary {
        id: page.id,
        locale: request.translations.get_page_locale(page)?,
        title: page.title.clone(),
        url: state.chain.generate_url(&content, request, &state.urls)?,
    })
}
