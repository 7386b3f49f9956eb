//! Resolution of localized page variants.
//!
//! Pages of a site are grouped into translation groups: one main page in the
//! site's original language plus one page per additional language that points
//! back at it. [`resolver::TranslationResolver`] answers which member of a
//! group serves a given locale, [`content_url`] routes pages and content
//! entries to the page that renders them, and [`collector`] walks page trees
//! to build sitemaps and search indexes.

pub mod collector;
pub mod config;
pub mod content;
pub mod content_url;
pub mod context;
pub mod locale;
pub mod metrics;
pub mod model;
pub mod navigation;
pub mod resolver;
pub mod server;
pub mod store;
pub mod url;
pub mod validator;
