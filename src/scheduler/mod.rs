//! One update cycle: reconcile the configured feeds with the known ones, fetch
//! the feeds that are due, merge what came back and expire stale articles.
//!
//! Feeds are fetched one after another. A failing feed is logged and skipped;
//! it never stops the cycle.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::app::{RawdogError, Result};
use crate::config::FeedConfig;
use crate::domain::{AggregateState, Feed};
use crate::fetcher::{FetchRequest, FetchStatus, Fetcher};
use crate::hooks::{HookContext, HookRegistry};

/// What happened during one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub added_feeds: Vec<String>,
    pub removed_feeds: Vec<String>,
    /// Feeds a fetch was attempted for, in order.
    pub fetched: Vec<String>,
    /// Feeds whose fetch was logged as an error.
    pub failed: Vec<String>,
    pub new_articles: usize,
    pub expired: usize,
}

/// Make the known feed set match the configuration. New feeds are due at once;
/// existing ones take their period and options from the configuration.
pub fn reconcile(state: &mut AggregateState, configured: &[FeedConfig], report: &mut CycleReport) {
    let mut wanted = HashSet::new();

    for fc in configured {
        wanted.insert(fc.url.as_str());
        let feed = state.feeds.entry(fc.url.clone()).or_insert_with(|| {
            tracing::info!(feed = %fc.url, "Adding new feed");
            report.added_feeds.push(fc.url.clone());
            Feed::new(fc.url.clone())
        });
        feed.period = fc.period;
        feed.options = fc.options.clone();
    }

    let gone: Vec<String> = state
        .feeds
        .keys()
        .filter(|url| !wanted.contains(url.as_str()))
        .cloned()
        .collect();
    for url in gone {
        tracing::info!(feed = %url, "Removing feed no longer in configuration");
        state.feeds.remove(&url);
        report.removed_feeds.push(url);
    }
}

/// Feeds to fetch this cycle: just `target` if given, otherwise every feed
/// whose period has elapsed.
pub fn select_due(
    state: &AggregateState,
    now: DateTime<Utc>,
    target: Option<&str>,
) -> Result<Vec<String>> {
    match target {
        Some(url) => {
            if state.feeds.contains_key(url) {
                Ok(vec![url.to_string()])
            } else {
                Err(RawdogError::FeedNotFound(url.to_string()))
            }
        }
        None => Ok(state
            .feeds
            .values()
            .filter(|feed| feed.needs_update(now))
            .map(|feed| feed.url.clone())
            .collect()),
    }
}

pub async fn run_cycle(
    state: &mut AggregateState,
    configured: &[FeedConfig],
    now: DateTime<Utc>,
    target: Option<&str>,
    fetcher: &dyn Fetcher,
    hooks: &HookRegistry,
) -> Result<CycleReport> {
    let mut report = CycleReport::default();

    reconcile(state, configured, &mut report);
    let due = select_due(state, now, target)?;
    let total = due.len();
    let before = state.articles.len();
    let mut seen = HashSet::new();

    for (count, url) in due.into_iter().enumerate() {
        let Some(feed) = state.feeds.get_mut(&url) else {
            continue;
        };
        tracing::info!(count = count + 1, total, feed = %url, "Updating feed");
        report.fetched.push(url.clone());
        feed.last_update = now;

        let request = FetchRequest {
            url: &feed.url,
            etag: feed.etag.as_deref(),
            modified: feed.modified.as_deref(),
            credentials: feed.credentials(),
            proxies: feed.proxies(),
        };
        let result = fetcher.fetch(&request).await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(feed = %url, error = %e, "Feed update failed");
                report.failed.push(url);
                continue;
            }
        };

        match response.classify() {
            FetchStatus::Ok => {}
            FetchStatus::Moved => {
                tracing::warn!(
                    feed = %url,
                    status = response.status,
                    new_url = %response.url,
                    "Feed has moved; change the configuration to use the new URL"
                );
            }
            FetchStatus::Gone => {
                tracing::error!(
                    feed = %url,
                    status = response.status,
                    "Feed is no longer available; remove it from the configuration"
                );
                report.failed.push(url);
                continue;
            }
            FetchStatus::Error => {
                tracing::error!(feed = %url, status = response.status, "Error fetching feed");
                report.failed.push(url);
                continue;
            }
        }

        if response.etag.is_some() {
            feed.etag = response.etag;
        }
        if response.modified.is_some() {
            feed.modified = response.modified;
        }

        let Some(mut document) = response.document else {
            tracing::debug!(feed = %url, "Feed not modified");
            continue;
        };
        if document.title.is_some() {
            feed.title = document.title.clone();
        }
        if document.link.is_some() {
            feed.link = document.link.clone();
        }

        let feed: &Feed = feed;
        hooks.dispatch(&mut HookContext::FeedFetched {
            feed,
            document: &mut document,
        })?;

        if state.articles.merge(feed, &document.items, now, hooks)? {
            seen.insert(url);
        }
    }

    report.new_articles = state.articles.len() - before;
    report.expired = state.articles.expire(&state.feeds, &seen, now);
    if report.expired > 0 {
        tracing::info!(count = report.expired, "Expired articles");
    }

    Ok(report)
}
