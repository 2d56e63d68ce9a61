//! Per-feed description shortening. `truncate = N` cuts the rendered
//! description to N characters, backing off so a tag isn't split;
//! `killtags = true` replaces markup with spaces first.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::hooks::{Hook, HookContext, HookFlow, HookRegistry};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

pub fn register(hooks: &mut HookRegistry) {
    hooks.register(Hook::OutputItemBits, |ctx| {
        let HookContext::OutputItemBits { feed, bits, .. } = ctx else {
            return Ok(HookFlow::Continue);
        };

        let limit = match feed.option("truncate") {
            Some(n) => n
                .trim()
                .parse::<usize>()
                .with_context(|| format!("bad truncate option {:?} for {}", n, feed.url))?,
            None => 0,
        };
        let killtags = feed.option("killtags") == Some("true");
        if limit == 0 && !killtags {
            return Ok(HookFlow::Continue);
        }

        if let Some(description) = bits.get("description") {
            let shortened = shorten(description, limit, killtags);
            bits.insert("description", shortened);
        }
        Ok(HookFlow::Continue)
    });
}

pub fn shorten(text: &str, limit: usize, killtags: bool) -> String {
    let text = if killtags {
        TAG.replace_all(text, " ").into_owned()
    } else {
        text.to_string()
    };

    let cut = if limit == 0 {
        None
    } else {
        text.char_indices().nth(limit).map(|(i, _)| i)
    };
    let Some(mut cut) = cut else {
        return text.trim().to_string();
    };

    let head = &text[..cut];
    if let Some(open) = head.rfind('<') {
        if head.rfind('>').map_or(true, |close| close < open) {
            cut = open;
        }
    }

    format!("{}...", text[..cut].trim_end()).trim().to_string()
}
