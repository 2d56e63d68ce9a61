//! Hide articles with a per-feed `filter` option.
//!
//! A filter is a list of rules separated by `;`. Each rule starts with `show`
//! or `hide`, followed by field/regex pairs; the rule applies when every pair
//! matches. The last rule that applies decides:
//!
//! ```text
//! filter = "hide title \"^Sponsored\" ; show title Sponsored link example.com"
//! ```
//!
//! Fields are `title`, `link` and `description`. A malformed filter is logged
//! and hides nothing.

use regex::Regex;

use crate::domain::Article;
use crate::hooks::{Hook, HookContext, HookFlow, HookRegistry};

pub fn register(hooks: &mut HookRegistry) {
    hooks.register(Hook::OutputSortedFilter, |ctx| {
        if let HookContext::OutputSortedFilter { feeds, articles } = ctx {
            let before = articles.len();
            articles.retain(|article| {
                let Some(filter) = feeds.get(&article.feed).and_then(|f| f.option("filter")) else {
                    return true;
                };
                match hides(filter, article) {
                    Ok(hide) => !hide,
                    Err(reason) => {
                        tracing::warn!(feed = %article.feed, filter, "{}", reason);
                        true
                    }
                }
            });
            if articles.len() < before {
                tracing::info!(count = before - articles.len(), "article_filter hid articles");
            }
        }
        Ok(HookFlow::Continue)
    });
}

/// Split on spaces, keeping `"quoted strings"` together.
pub fn parse_quoted(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = s.trim_start();

    while !rest.is_empty() {
        let (word, remainder) = if let Some(quoted) = rest.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match rest.find(' ') {
                Some(end) => (&rest[..end], &rest[end..]),
                None => (rest, ""),
            }
        };
        words.push(word.to_string());
        rest = remainder.trim_start();
    }

    words
}

fn field<'a>(article: &'a Article, name: &str) -> Option<&'a str> {
    let value = match name {
        "title" => &article.title,
        "link" => &article.link,
        "description" => &article.description,
        _ => return None,
    };
    Some(value.as_deref().unwrap_or(""))
}

/// Whether `filter` hides `article`.
pub fn hides(filter: &str, article: &Article) -> Result<bool, String> {
    let words = parse_quoted(filter);
    let mut hide = false;
    let mut i = 0;

    while i < words.len() {
        let action = match words[i].as_str() {
            "show" => false,
            "hide" => true,
            other => return Err(format!("Expected show or hide but got {}", other)),
        };
        i += 1;

        let mut matched = true;
        while i < words.len() && words[i] != ";" {
            let Some(pattern) = words.get(i + 1) else {
                return Err("Expected regexp at end of filter".to_string());
            };
            let value = field(article, &words[i])
                .ok_or_else(|| format!("Bad field name {}", words[i]))?;
            let re = Regex::new(pattern)
                .map_err(|e| format!("Bad regular expression {}: {}", pattern, e))?;
            if !re.is_match(value) {
                matched = false;
            }
            i += 2;
        }

        if matched {
            hide = action;
        }
        if i < words.len() {
            i += 1;
        }
    }

    Ok(hide)
}
