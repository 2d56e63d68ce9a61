use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::article::short_hash;

/// Default poll period in minutes for feeds that don't name one.
pub const DEFAULT_PERIOD: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub url: String,
    /// Poll period in minutes.
    pub period: u32,
    pub options: BTreeMap<String, String>,
    pub etag: Option<String>,
    pub modified: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub last_update: DateTime<Utc>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            url,
            period: DEFAULT_PERIOD,
            options: BTreeMap::new(),
            etag: None,
            modified: None,
            title: None,
            link: None,
            last_update: DateTime::UNIX_EPOCH,
        }
    }

    /// Whether the feed's period has elapsed since its last update attempt.
    pub fn needs_update(&self, now: DateTime<Utc>) -> bool {
        now - self.last_update >= Duration::minutes(i64::from(self.period))
    }

    pub fn next_update(&self) -> DateTime<Utc> {
        self.last_update + Duration::minutes(i64::from(self.period))
    }

    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.link.as_deref())
            .unwrap_or(&self.url)
    }

    pub fn html_link(&self) -> String {
        let name = self.display_name();
        match &self.link {
            Some(link) => format!("<a href=\"{}\">{}</a>", link, name),
            None => name.to_string(),
        }
    }

    pub fn url_hash(&self) -> String {
        short_hash(&self.url)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Basic-auth credentials, present only when both `user` and `password` are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.option("user"), self.option("password")) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }

    /// Proxies keyed by scheme, taken from `<scheme>_proxy` options.
    pub fn proxies(&self) -> BTreeMap<String, String> {
        self.options
            .iter()
            .filter_map(|(key, value)| {
                key.strip_suffix("_proxy")
                    .filter(|scheme| !scheme.is_empty())
                    .map(|scheme| (scheme.to_string(), value.clone()))
            })
            .collect()
    }
}
