//! Named extension points.
//!
//! A [`HookRegistry`] maps each [`Hook`] to an ordered list of handlers. Handlers
//! run in registration order; a handler returning [`HookFlow::Stop`] has fully
//! handled the event and the remaining handlers are skipped. The registry is
//! filled once at startup and only read afterwards.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};

use crate::app::{RawdogError, Result};
use crate::config::Config;
use crate::domain::{Article, Feed};
use crate::normalizer::ParsedFeed;
use crate::template::Substitutions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Startup,
    Shutdown,
    ConfigOption,
    FeedFetched,
    ArticleAdded,
    ArticleReseen,
    OutputSort,
    OutputSortedFilter,
    OutputItemBits,
    OutputBits,
    OutputWrite,
}

impl Hook {
    pub fn name(self) -> &'static str {
        match self {
            Hook::Startup => "startup",
            Hook::Shutdown => "shutdown",
            Hook::ConfigOption => "config_option",
            Hook::FeedFetched => "feed_fetched",
            Hook::ArticleAdded => "article_added",
            Hook::ArticleReseen => "article_reseen",
            Hook::OutputSort => "output_sort",
            Hook::OutputSortedFilter => "output_sorted_filter",
            Hook::OutputItemBits => "output_item_bits",
            Hook::OutputBits => "output_bits",
            Hook::OutputWrite => "output_write",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a handler tells the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookFlow {
    /// Auxiliary work only; run the next handler.
    Continue,
    /// The event is fully handled; skip the remaining handlers.
    Stop,
}

/// The arguments of one dispatched event. Mutable fields are the sanctioned
/// way for handlers to change what the core does next.
pub enum HookContext<'a> {
    Startup {
        config: &'a Config,
    },
    Shutdown {
        config: &'a Config,
    },
    ConfigOption {
        name: &'a str,
        value: &'a toml::Value,
    },
    FeedFetched {
        feed: &'a Feed,
        document: &'a mut ParsedFeed,
    },
    ArticleAdded {
        feed: &'a Feed,
        article: &'a Article,
        now: DateTime<Utc>,
    },
    ArticleReseen {
        feed: &'a Feed,
        article: &'a Article,
        now: DateTime<Utc>,
    },
    OutputSort {
        articles: &'a mut Vec<Article>,
    },
    OutputSortedFilter {
        feeds: &'a BTreeMap<String, Feed>,
        articles: &'a mut Vec<Article>,
    },
    OutputItemBits {
        feed: &'a Feed,
        article: &'a Article,
        bits: &'a mut Substitutions,
    },
    OutputBits {
        bits: &'a mut Substitutions,
    },
    OutputWrite {
        path: &'a str,
        document: &'a str,
    },
}

impl HookContext<'_> {
    pub fn hook(&self) -> Hook {
        match self {
            HookContext::Startup { .. } => Hook::Startup,
            HookContext::Shutdown { .. } => Hook::Shutdown,
            HookContext::ConfigOption { .. } => Hook::ConfigOption,
            HookContext::FeedFetched { .. } => Hook::FeedFetched,
            HookContext::ArticleAdded { .. } => Hook::ArticleAdded,
            HookContext::ArticleReseen { .. } => Hook::ArticleReseen,
            HookContext::OutputSort { .. } => Hook::OutputSort,
            HookContext::OutputSortedFilter { .. } => Hook::OutputSortedFilter,
            HookContext::OutputItemBits { .. } => Hook::OutputItemBits,
            HookContext::OutputBits { .. } => Hook::OutputBits,
            HookContext::OutputWrite { .. } => Hook::OutputWrite,
        }
    }
}

pub type Handler = Box<dyn Fn(&mut HookContext<'_>) -> anyhow::Result<HookFlow>>;

#[derive(Default)]
pub struct HookRegistry {
    handlers: HashMap<Hook, Vec<Handler>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the chain for `hook`.
    pub fn register<F>(&mut self, hook: Hook, handler: F)
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<HookFlow> + 'static,
    {
        self.handlers.entry(hook).or_default().push(Box::new(handler));
    }

    pub fn handler_count(&self, hook: Hook) -> usize {
        self.handlers.get(&hook).map_or(0, Vec::len)
    }

    /// Run the chain for the context's hook. Returns `true` iff some handler
    /// stopped the chain. Handler errors are not caught.
    pub fn dispatch(&self, ctx: &mut HookContext<'_>) -> Result<bool> {
        let hook = ctx.hook();
        let Some(handlers) = self.handlers.get(&hook) else {
            return Ok(false);
        };

        for handler in handlers {
            let flow = handler(&mut *ctx).map_err(|source| RawdogError::Hook { hook, source })?;
            if flow == HookFlow::Stop {
                tracing::debug!(hook = %hook, "hook chain stopped");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn bits_ctx(bits: &mut Substitutions) -> HookContext<'_> {
        HookContext::OutputBits { bits }
    }

    #[test]
    fn test_dispatch_without_handlers_is_unhandled() {
        let hooks = HookRegistry::new();
        let mut bits = Substitutions::new();
        assert!(!hooks.dispatch(&mut bits_ctx(&mut bits)).unwrap());
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut hooks = HookRegistry::new();
        for name in ["first", "second", "third"] {
            hooks.register(Hook::OutputBits, move |ctx| {
                if let HookContext::OutputBits { bits } = ctx {
                    let order = bits.get("order").unwrap_or_default().to_string();
                    bits.insert("order", format!("{order}{name},"));
                }
                Ok(HookFlow::Continue)
            });
        }

        let mut bits = Substitutions::new();
        let handled = hooks.dispatch(&mut bits_ctx(&mut bits)).unwrap();
        assert!(!handled);
        assert_eq!(bits.get("order"), Some("first,second,third,"));
    }

    #[test]
    fn test_stop_short_circuits_chain() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = HookRegistry::new();

        let c = calls.clone();
        hooks.register(Hook::OutputBits, move |_| {
            c.borrow_mut().push("a");
            Ok(HookFlow::Continue)
        });
        let c = calls.clone();
        hooks.register(Hook::OutputBits, move |_| {
            c.borrow_mut().push("b");
            Ok(HookFlow::Stop)
        });
        let c = calls.clone();
        hooks.register(Hook::OutputBits, move |_| {
            c.borrow_mut().push("c");
            Ok(HookFlow::Continue)
        });

        let mut bits = Substitutions::new();
        assert!(hooks.dispatch(&mut bits_ctx(&mut bits)).unwrap());
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_hooks_are_independent_by_name() {
        let mut hooks = HookRegistry::new();
        hooks.register(Hook::OutputBits, |_| Ok(HookFlow::Stop));

        let mut articles = Vec::new();
        let mut ctx = HookContext::OutputSort {
            articles: &mut articles,
        };
        assert!(!hooks.dispatch(&mut ctx).unwrap());
        assert_eq!(hooks.handler_count(Hook::OutputBits), 1);
        assert_eq!(hooks.handler_count(Hook::OutputSort), 0);
    }

    #[test]
    fn test_handler_error_propagates() {
        let ran_after = Rc::new(RefCell::new(false));
        let mut hooks = HookRegistry::new();
        hooks.register(Hook::OutputBits, |_| Err(anyhow::anyhow!("plugin exploded")));
        let flag = ran_after.clone();
        hooks.register(Hook::OutputBits, move |_| {
            *flag.borrow_mut() = true;
            Ok(HookFlow::Continue)
        });

        let mut bits = Substitutions::new();
        let err = hooks.dispatch(&mut bits_ctx(&mut bits)).unwrap_err();
        match err {
            RawdogError::Hook { hook, source } => {
                assert_eq!(hook, Hook::OutputBits);
                assert!(source.to_string().contains("plugin exploded"));
            }
            e => panic!("Expected Hook error, got {:?}", e),
        }
        assert!(!*ran_after.borrow());
    }
}
