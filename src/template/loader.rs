use std::fs;
use std::path::Path;

use crate::app::{RawdogError, Result};
use crate::config::Config;

use super::{default_item_template, default_page_template};

/// Sentinel config value selecting the built-in template.
pub const DEFAULT_TEMPLATE: &str = "default";

/// The page and item templates in use for this run, read once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub page: String,
    pub item: String,
}

impl Templates {
    /// Resolve the configured templates. File names are relative to `base`.
    pub fn load(config: &Config, base: &Path) -> Result<Self> {
        let page = if config.template == DEFAULT_TEMPLATE {
            default_page_template(config.use_refresh, config.show_feeds)
        } else {
            read_template(&base.join(&config.template))?
        };

        let item = if config.item_template == DEFAULT_TEMPLATE {
            default_item_template()
        } else {
            read_template(&base.join(&config.item_template))?
        };

        Ok(Self { page, item })
    }
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| RawdogError::Template {
        path: path.to_path_buf(),
        source,
    })
}
