//! Configuration management.
//!
//! Configuration is read from `config.toml` in the state directory, plus any
//! files named with `--config` or `include`. Later files override scalar
//! settings and append feeds. Top-level keys the core doesn't know are offered
//! to extensions through the `config_option` hook.

mod period;

pub use period::{parse_period, PeriodSpec};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::app::Result;
use crate::domain::feed::DEFAULT_PERIOD;
use crate::hooks::{HookContext, HookRegistry};

const MAX_INCLUDE_DEPTH: usize = 16;

/// A feed as configured: identity, poll period and options.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    /// Poll period in minutes.
    pub period: u32,
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feeds: Vec<FeedConfig>,
    /// Output path, or "-" for stdout.
    pub output_file: String,
    /// 0 means unlimited.
    pub max_articles: usize,
    /// Minutes; 0 means unlimited.
    pub max_age: u64,
    pub day_format: String,
    pub time_format: String,
    pub use_refresh: bool,
    pub show_feeds: bool,
    pub day_sections: bool,
    pub time_sections: bool,
    /// Per-fetch timeout in seconds.
    pub timeout: u64,
    pub template: String,
    pub item_template: String,
    pub verbose: bool,
    pub feed_defaults: BTreeMap<String, String>,
    /// State directory; relative `include` paths resolve against it.
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            output_file: "output.html".into(),
            max_articles: 200,
            max_age: 0,
            day_format: "%A, %d %B %Y".into(),
            time_format: "%I:%M %p".into(),
            use_refresh: false,
            show_feeds: true,
            day_sections: true,
            time_sections: true,
            timeout: 30,
            template: "default".into(),
            item_template: "default".into(),
            verbose: false,
            feed_defaults: BTreeMap::new(),
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    output_file: Option<String>,
    max_articles: Option<usize>,
    max_age: Option<u64>,
    day_format: Option<String>,
    time_format: Option<String>,
    use_refresh: Option<bool>,
    show_feeds: Option<bool>,
    day_sections: Option<bool>,
    time_sections: Option<bool>,
    timeout: Option<u64>,
    template: Option<String>,
    item_template: Option<String>,
    verbose: Option<bool>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    feed_defaults: BTreeMap<String, toml::Value>,
    #[serde(default)]
    feeds: Vec<FeedEntry>,
    #[serde(flatten)]
    extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedEntry {
    url: String,
    period: Option<PeriodSpec>,
    #[serde(default)]
    options: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Load the configuration rooted at `path`.
    pub fn load(path: &Path, hooks: &HookRegistry) -> Result<Self> {
        let mut config = Self {
            dir: path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
            ..Self::default()
        };
        config.apply_file(path, hooks)?;
        Ok(config)
    }

    /// Read another config file on top of this one.
    pub fn apply_file(&mut self, path: &Path, hooks: &HookRegistry) -> Result<()> {
        self.apply_file_at_depth(path, hooks, 0)
    }

    /// Apply config text as if read from `path`.
    pub fn apply_str(&mut self, content: &str, path: &Path, hooks: &HookRegistry) -> Result<()> {
        self.apply_str_at_depth(content, path, hooks, 0)
    }

    fn apply_file_at_depth(&mut self, path: &Path, hooks: &HookRegistry, depth: usize) -> Result<()> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(ConfigError::IncludeDepth {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.apply_str_at_depth(&content, path, hooks, depth)
    }

    fn apply_str_at_depth(
        &mut self,
        content: &str,
        path: &Path,
        hooks: &HookRegistry,
        depth: usize,
    ) -> Result<()> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(v) = file.output_file {
            self.output_file = v;
        }
        if let Some(v) = file.max_articles {
            self.max_articles = v;
        }
        if let Some(v) = file.max_age {
            self.max_age = v;
        }
        if let Some(v) = file.day_format {
            self.day_format = v;
        }
        if let Some(v) = file.time_format {
            self.time_format = v;
        }
        if let Some(v) = file.use_refresh {
            self.use_refresh = v;
        }
        if let Some(v) = file.show_feeds {
            self.show_feeds = v;
        }
        if let Some(v) = file.day_sections {
            self.day_sections = v;
        }
        if let Some(v) = file.time_sections {
            self.time_sections = v;
        }
        if let Some(v) = file.timeout {
            self.timeout = v;
        }
        if let Some(v) = file.template {
            self.template = v;
        }
        if let Some(v) = file.item_template {
            self.item_template = v;
        }
        if let Some(v) = file.verbose {
            self.verbose = v;
        }

        validate_time_format(&self.day_format)?;
        validate_time_format(&self.time_format)?;

        for (name, value) in &file.feed_defaults {
            self.feed_defaults
                .insert(name.clone(), option_string(&defaults_owner(path), name, value)?);
        }

        for entry in file.feeds {
            let period = match &entry.period {
                Some(spec) => spec.minutes().map_err(|reason| ConfigError::BadPeriod {
                    url: entry.url.clone(),
                    reason,
                })?,
                None => DEFAULT_PERIOD,
            };
            let mut options = self.feed_defaults.clone();
            for (name, value) in &entry.options {
                options.insert(name.clone(), option_string(&entry.url, name, value)?);
            }
            self.feeds.push(FeedConfig {
                url: entry.url,
                period,
                options,
            });
        }

        for (name, value) in &file.extra {
            let handled = hooks.dispatch(&mut HookContext::ConfigOption { name, value })?;
            if !handled {
                return Err(ConfigError::UnknownDirective {
                    path: path.to_path_buf(),
                    name: name.clone(),
                }
                .into());
            }
        }

        for include in &file.include {
            let target = self.dir.join(include);
            self.apply_file_at_depth(&target, hooks, depth + 1)?;
        }

        Ok(())
    }
}

fn defaults_owner(path: &Path) -> String {
    format!("feed_defaults in {}", path.display())
}

/// Feed options are strings; scalar TOML values are accepted and stringified.
fn option_string(owner: &str, name: &str, value: &toml::Value) -> std::result::Result<String, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        _ => Err(ConfigError::BadFeedOption {
            url: owner.to_string(),
            name: name.to_string(),
        }),
    }
}

fn validate_time_format(format: &str) -> std::result::Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::BadTimeFormat(format.to_string()));
    }
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Can't read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("In {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("In {path}: unknown config directive: {name}")]
    UnknownDirective { path: PathBuf, name: String },

    #[error("Bad period for feed {url}: {reason}")]
    BadPeriod { url: String, reason: String },

    #[error("Bad option {name} for {url}: expected a string, number or boolean")]
    BadFeedOption { url: String, name: String },

    #[error("Bad time format: {0}")]
    BadTimeFormat(String),

    #[error("Too many nested includes at {path}")]
    IncludeDepth { path: PathBuf },
}
