//! Fixed links for sites without a feed, available as `__links__`:
//!
//! ```toml
//! [[link]]
//! url = "https://example.com/"
//! name = "Example"
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;

use crate::hooks::{Hook, HookContext, HookFlow, HookRegistry};

const DIRECTIVE: &str = "link";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    pub url: String,
    pub name: String,
}

pub fn register(hooks: &mut HookRegistry) {
    let links: Rc<RefCell<Vec<Link>>> = Rc::default();

    let configured = links.clone();
    hooks.register(Hook::ConfigOption, move |ctx| {
        let HookContext::ConfigOption { name, value } = ctx else {
            return Ok(HookFlow::Continue);
        };
        if *name != DIRECTIVE {
            return Ok(HookFlow::Continue);
        }

        let parsed: Vec<Link> = (*value)
            .clone()
            .try_into()
            .context("link entries need a url and a name")?;
        configured.borrow_mut().extend(parsed);
        Ok(HookFlow::Stop)
    });

    hooks.register(Hook::OutputBits, move |ctx| {
        if let HookContext::OutputBits { bits } = ctx {
            bits.insert("links", render(&links.borrow()));
        }
        Ok(HookFlow::Continue)
    });
}

fn render(links: &[Link]) -> String {
    links
        .iter()
        .map(|link| {
            format!(
                "<a href=\"{}\">{}</a>\n",
                encode_double_quoted_attribute(&link.url),
                encode_text(&link.name)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::template::Substitutions;
    use std::path::Path;

    fn output_bits(hooks: &HookRegistry) -> Substitutions {
        let mut bits = Substitutions::new();
        hooks
            .dispatch(&mut HookContext::OutputBits { bits: &mut bits })
            .unwrap();
        bits
    }

    #[test]
    fn test_links_rendered() {
        let mut hooks = HookRegistry::new();
        register(&mut hooks);

        let mut config = Config::default();
        config
            .apply_str(
                r#"
[[link]]
url = "https://example.com/?a=1&b=2"
name = "Fish & Chips"

[[link]]
url = "https://example.org/"
name = "Other"
"#,
                Path::new("config.toml"),
                &hooks,
            )
            .unwrap();

        assert_eq!(
            output_bits(&hooks).get("links"),
            Some(
                "<a href=\"https://example.com/?a=1&amp;b=2\">Fish &amp; Chips</a>\n\
                 <a href=\"https://example.org/\">Other</a>\n"
            )
        );
    }

    #[test]
    fn test_no_links_is_empty() {
        let mut hooks = HookRegistry::new();
        register(&mut hooks);
        assert_eq!(output_bits(&hooks).get("links"), Some(""));
    }

    #[test]
    fn test_incomplete_link_is_an_error() {
        let mut hooks = HookRegistry::new();
        register(&mut hooks);

        let mut config = Config::default();
        let result = config.apply_str(
            "[[link]]\nurl = \"https://example.com/\"\n",
            Path::new("config.toml"),
            &hooks,
        );
        assert!(result.is_err());
    }
}
