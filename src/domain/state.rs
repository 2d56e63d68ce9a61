use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::app::Result;
use crate::domain::{Article, Feed};
use crate::hooks::{HookContext, HookRegistry};
use crate::normalizer::IncomingItem;

/// Articles not re-seen for longer than this are dropped once their feed
/// has been fetched again with content.
pub const EXPIRY_WINDOW: Duration = Duration::hours(24);

/// Everything that persists between runs: the known feeds and their articles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    pub feeds: BTreeMap<String, Feed>,
    pub articles: ArticleStore,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Articles keyed by fingerprint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleStore {
    articles: BTreeMap<String, Article>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Article> {
        self.articles.get(fingerprint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    /// Insert an article as-is, replacing any with the same fingerprint.
    pub fn insert(&mut self, article: Article) {
        self.articles.insert(article.fingerprint.clone(), article);
    }

    /// Merge one fetch's items for `feed`. New fingerprints become articles
    /// first seen at `now`; known ones only get `last_seen` refreshed, their
    /// content and sequence stay as first seen.
    ///
    /// Returns whether the fetch carried at least one item.
    pub fn merge(
        &mut self,
        feed: &Feed,
        items: &[IncomingItem],
        now: DateTime<Utc>,
        hooks: &HookRegistry,
    ) -> Result<bool> {
        for (sequence, item) in items.iter().enumerate() {
            let article = Article::new(&feed.url, item, sequence as u32, now);

            match self.articles.get_mut(&article.fingerprint) {
                Some(existing) => {
                    existing.last_seen = now;
                    hooks.dispatch(&mut HookContext::ArticleReseen {
                        feed,
                        article: existing,
                        now,
                    })?;
                }
                None => {
                    hooks.dispatch(&mut HookContext::ArticleAdded {
                        feed,
                        article: &article,
                        now,
                    })?;
                    self.insert(article);
                }
            }
        }

        Ok(!items.is_empty())
    }

    /// Drop articles whose feed is gone, and articles of feeds in `seen`
    /// (fetched with at least one item this cycle) that have not been seen
    /// within [`EXPIRY_WINDOW`]. Returns the number removed.
    pub fn expire(
        &mut self,
        feeds: &BTreeMap<String, Feed>,
        seen: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = self.articles.len();
        self.articles.retain(|_, article| {
            if !feeds.contains_key(&article.feed) {
                return false;
            }
            !(seen.contains(&article.feed) && now - article.last_seen > EXPIRY_WINDOW)
        });
        before - self.articles.len()
    }
}
