//! Sitemap binary - validates translation groups and prints sitemap URLs
//!
//! Usage:
//!   cargo run --bin sitemap                     # Sitemap XML for every root page
//!   cargo run --bin sitemap -- --search         # Search-index URL list
//!   cargo run --bin sitemap -- --strict 1 2     # Only below pages 1 and 2, fail on data errors
//!
//! Required environment variables:
//! - SITE_DATA_PATH
//!
//! Optional:
//! - BASE_URL (defaults to http://localhost:8080)
//! - DEFAULT_LOCALE (defaults to en)
//! - TRANSLATION_PAGE_TYPES (defaults to localized_regular)
//! - INDEX_PROTECTED (defaults to false)

use anyhow::{bail, Context, Result};
use page_translations::collector::{
    render_sitemap_xml, CollectorMode, CollectorOptions, PageCollector,
};
use page_translations::config::Config;
use page_translations::resolver::TranslationResolver;
use page_translations::store::{ContentStore, MemoryStore, PageQuery};
use page_translations::url::PathUrlGenerator;
use page_translations::validator::{all_pages, TranslationGroupValidator};
use tracing::{info, warn};

struct Args {
    search: bool,
    strict: bool,
    parent_ids: Vec<u64>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args {
            search: false,
            strict: false,
            parent_ids: Vec::new(),
        };

        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--search" => args.search = true,
                "--strict" => args.strict = true,
                id => args.parent_ids.push(
                    id.parse()
                        .with_context(|| format!("Expected a page id, got '{}'", id))?,
                ),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays a clean document
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("page_translations=info".parse()?),
        )
        .init();

    let args = Args::parse()?;
    let config = Config::from_env()?;
    let store = MemoryStore::from_path(&config.site_data_path)?;

    let translations = TranslationResolver::new(&store, config.default_locale.as_str())
        .with_translation_types(config.translation_page_types.iter().copied());

    let report = TranslationGroupValidator::validate(&translations, &all_pages(&store)?)?;
    for error in &report.errors {
        warn!("Translation data error: {}", error);
    }
    for warning in &report.warnings {
        warn!("Translation data warning: {}", warning);
    }
    if args.strict && report.has_errors() {
        bail!("{} translation data error(s)", report.errors.len());
    }

    let parent_ids = if args.parent_ids.is_empty() {
        store
            .find_pages(&PageQuery::Roots)?
            .iter()
            .map(|root| root.id)
            .collect()
    } else {
        args.parent_ids
    };

    let mode = if args.search {
        CollectorMode::Search
    } else {
        CollectorMode::Sitemap
    };
    let mut options = CollectorOptions::new(mode);
    options.index_protected = config.index_protected;
    options.alternates = !args.search;

    let urls = PathUrlGenerator::new(config.base_url.clone());
    let collector = PageCollector::new(&translations, &urls, options);
    let entries = collector.collect(&parent_ids)?;

    if args.search {
        for entry in &entries {
            println!("{}", entry.url);
        }
    } else {
        print!("{}", render_sitemap_xml(&entries));
    }

    info!(
        "Resolver metrics: {}",
        serde_json::to_string(&translations.metrics().report())?
    );
    Ok(())
}
