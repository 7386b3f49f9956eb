//! Translation group validation.
//!
//! The resolver tolerates inconsistent translation data at request time.
//! This module reports the same inconsistencies up front, so that they can be
//! fixed before a sitemap or search index is built from them.

use crate::model::Page;
use crate::resolver::TranslationResolver;
use crate::store::{ContentStore, PageQuery, StoreResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Findings of a validation run over the page tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Inconsistencies that change which page a lookup returns
    pub errors: Vec<String>,

    /// Pages that silently drop out of translation lookups
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for translation groups.
pub struct TranslationGroupValidator;

impl TranslationGroupValidator {
    /// Validate the translation links between `pages`.
    ///
    /// Reports:
    /// - translations whose main page is missing or is itself a translation
    /// - more than one page per locale in a translation group
    /// - translations whose locale cannot be determined
    pub fn validate(
        translations: &TranslationResolver<'_>,
        pages: &[Arc<Page>],
    ) -> StoreResult<ValidationReport> {
        let mut report = ValidationReport::new();
        // (main id, locale) -> member ids
        let mut members: BTreeMap<(u64, String), Vec<u64>> = BTreeMap::new();

        for page in pages.iter().filter(|page| !page.is_main()) {
            match translations.find_page(page.language_main)? {
                None => {
                    report.errors.push(format!(
                        "Page {} translates missing page {}",
                        page.id, page.language_main
                    ));
                    continue;
                }
                Some(main) if !main.is_main() => {
                    report.errors.push(format!(
                        "Page {} translates page {}, which is itself a translation of {}",
                        page.id, main.id, main.language_main
                    ));
                    continue;
                }
                Some(main) => {
                    if let Some(locale) = translations.get_page_locale(&main)? {
                        members
                            .entry((main.id, locale))
                            .or_default()
                            .push(main.id);
                    }
                }
            }

            match translations.get_page_locale(page)? {
                Some(locale) => members
                    .entry((page.language_main, locale))
                    .or_default()
                    .push(page.id),
                None => report.warnings.push(format!(
                    "Translation {} of page {} has no locale",
                    page.id, page.language_main
                )),
            }
        }

        for ((main_id, locale), mut ids) in members {
            ids.sort_unstable();
            ids.dedup();
            if ids.len() > 1 {
                report.errors.push(format!(
                    "Translation group of page {} has {} pages for '{}': {:?}",
                    main_id,
                    ids.len(),
                    locale,
                    ids
                ));
            }
        }

        Ok(report)
    }
}

/// Every page reachable from the root pages, depth first.
pub fn all_pages(store: &dyn ContentStore) -> StoreResult<Vec<Arc<Page>>> {
    let mut pages = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<Arc<Page>> = store.find_pages(&PageQuery::Roots)?;
    stack.reverse();

    while let Some(page) = stack.pop() {
        if !seen.insert(page.id) {
            continue;
        }
        let mut children = store.find_pages(&PageQuery::ByParent(page.id))?;
        children.reverse();
        stack.extend(children);
        pages.push(page);
    }

    Ok(pages)
}
