//! `selectfeeds = ["url", ...]` limits the page to articles from those feeds.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::bail;

use crate::hooks::{Hook, HookContext, HookFlow, HookRegistry};

const DIRECTIVE: &str = "selectfeeds";

pub fn register(hooks: &mut HookRegistry) {
    let selected: Rc<RefCell<BTreeSet<String>>> = Rc::default();

    let feeds = selected.clone();
    hooks.register(Hook::ConfigOption, move |ctx| {
        let HookContext::ConfigOption { name, value } = ctx else {
            return Ok(HookFlow::Continue);
        };
        if *name != DIRECTIVE {
            return Ok(HookFlow::Continue);
        }

        let mut feeds = feeds.borrow_mut();
        match value {
            toml::Value::String(s) => feeds.extend(s.split_whitespace().map(String::from)),
            toml::Value::Array(urls) => {
                for url in urls.iter() {
                    let Some(url) = url.as_str() else {
                        bail!("{} expects feed URLs, got {}", DIRECTIVE, url);
                    };
                    feeds.insert(url.to_string());
                }
            }
            other => bail!("{} expects a list of feed URLs, got {}", DIRECTIVE, other),
        }
        Ok(HookFlow::Stop)
    });

    hooks.register(Hook::OutputSortedFilter, move |ctx| {
        if let HookContext::OutputSortedFilter { articles, .. } = ctx {
            let selected = selected.borrow();
            if !selected.is_empty() {
                articles.retain(|a| selected.contains(&a.feed));
            }
        }
        Ok(HookFlow::Continue)
    });
}
