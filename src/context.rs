//! Reentrancy guard for resolution passes.
//!
//! Rendering code enters a [`Context`] before it starts work that may
//! re-enter the resolver (building language-switch links, for example), and
//! nested code checks the top of the stack to decide whether to short-circuit.

use std::cell::RefCell;
use tracing::debug;

/// Module type entered while language-switch links are generated.
pub const CHANGE_LANGUAGE_MODULE: &str = "changelanguage";

/// Marker pushed onto a [`ContextStack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// A frontend module is rendering. `module_id` 0 matches any module of
    /// the same type in non-strict comparisons.
    FrontendModule { module_type: String, module_id: u64 },
    /// Work is being done on behalf of a specific locale
    Locale(String),
    /// URL parameters are being built; nested URL generation yields nothing
    UrlGuard,
}

impl Context {
    pub fn frontend_module(module_type: impl Into<String>, module_id: u64) -> Self {
        Context::FrontendModule {
            module_type: module_type.into(),
            module_id,
        }
    }

    /// Wildcard context for the language switcher.
    pub fn change_language() -> Self {
        Self::frontend_module(CHANGE_LANGUAGE_MODULE, 0)
    }

    pub fn locale(locale: impl Into<String>) -> Self {
        Context::Locale(locale.into())
    }

    /// Compare two contexts.
    ///
    /// A frontend-module id of 0 on either side is a wildcard unless `strict`
    /// is set, in which case ids must be equal.
    pub fn matches(&self, other: &Context, strict: bool) -> bool {
        match (self, other) {
            (
                Context::FrontendModule {
                    module_type: a_type,
                    module_id: a_id,
                },
                Context::FrontendModule {
                    module_type: b_type,
                    module_id: b_id,
                },
            ) => {
                if a_type != b_type {
                    return false;
                }
                if strict {
                    return a_id == b_id;
                }
                *a_id == 0 || *b_id == 0 || a_id == b_id
            }
            (Context::Locale(a), Context::Locale(b)) => a == b,
            (Context::UrlGuard, Context::UrlGuard) => true,
            _ => false,
        }
    }
}

/// LIFO stack of contexts for one unit of work.
///
/// Uses interior mutability so that collaborators can share `&ContextStack`.
/// The stack is not `Sync`; every request owns its own.
#[derive(Debug, Default)]
pub struct ContextStack {
    stack: RefCell<Vec<Context>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, context: Context) {
        debug!("Entering context {:?}", context);
        self.stack.borrow_mut().push(context);
    }

    /// Whether the most recently entered context matches `context`.
    pub fn match_current_context(&self, context: &Context, strict: bool) -> bool {
        self.stack
            .borrow()
            .last()
            .map(|current| current.matches(context, strict))
            .unwrap_or(false)
    }

    /// Leave `context`.
    ///
    /// Finds the first (bottom-most) entry that strictly matches and drops it
    /// together with everything entered after it. Does nothing when no entry
    /// matches.
    pub fn leave(&self, context: &Context) {
        let mut stack = self.stack.borrow_mut();
        if let Some(position) = stack.iter().position(|entry| entry.matches(context, true)) {
            if position + 1 < stack.len() {
                debug!(
                    "Leaving {:?} also discards {} nested context(s)",
                    context,
                    stack.len() - position - 1
                );
            }
            stack.truncate(position);
        }
    }

    /// Enter `context` until the returned guard is dropped.
    pub fn scope(&self, context: Context) -> ContextScope<'_> {
        self.enter(context.clone());
        ContextScope {
            stack: self,
            context,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.borrow().is_empty()
    }

    /// Drop every entry, for reuse at the start of a new unit of work.
    pub fn clear(&self) {
        self.stack.borrow_mut().clear();
    }
}

/// Leaves its context when dropped.
#[must_use = "the context is left as soon as the scope is dropped"]
pub struct ContextScope<'a> {
    stack: &'a ContextStack,
    context: Context,
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.stack.leave(&self.context);
    }
}
