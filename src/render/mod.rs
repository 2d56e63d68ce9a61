//! Turning the article store into one HTML page.

mod output;
mod sanitise;
mod sections;

pub use output::{write_output, STDOUT};
pub use sanitise::sanitise_html;
pub use sections::DayWriter;

use std::cmp::Ordering;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::app::{Result, VERSION};
use crate::config::Config;
use crate::domain::{AggregateState, Article, Feed};
use crate::hooks::{HookContext, HookRegistry};
use crate::template::{fill_template, Substitutions, Templates};

/// Longest meta refresh interval, in minutes.
const MAX_REFRESH: u32 = 24 * 60;

/// Newest first; then by feed, position within the fetch and fingerprint.
pub fn compare_articles(a: &Article, b: &Article) -> Ordering {
    b.added
        .cmp(&a.added)
        .then_with(|| a.feed.cmp(&b.feed))
        .then_with(|| a.sequence.cmp(&b.sequence))
        .then_with(|| a.fingerprint.cmp(&b.fingerprint))
}

pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(compare_articles);
}

pub struct Renderer<'a, Tz: TimeZone> {
    config: &'a Config,
    templates: &'a Templates,
    hooks: &'a HookRegistry,
    tz: Tz,
}

impl<'a, Tz> Renderer<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(config: &'a Config, templates: &'a Templates, hooks: &'a HookRegistry, tz: Tz) -> Self {
        Self {
            config,
            templates,
            hooks,
            tz,
        }
    }

    /// The articles that make it onto the page, in page order.
    pub fn select(&self, state: &AggregateState, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let mut articles: Vec<Article> = state.articles.iter().cloned().collect();

        let sorted = self.hooks.dispatch(&mut HookContext::OutputSort {
            articles: &mut articles,
        })?;
        if !sorted {
            sort_articles(&mut articles);
        }

        self.hooks.dispatch(&mut HookContext::OutputSortedFilter {
            feeds: &state.feeds,
            articles: &mut articles,
        })?;

        if self.config.max_articles != 0 {
            articles.truncate(self.config.max_articles);
        }

        if self.config.max_age != 0 {
            let limit = i64::try_from(self.config.max_age.saturating_mul(60)).unwrap_or(i64::MAX);
            if let Some(cut) = articles
                .iter()
                .position(|a| (now - a.added).num_seconds() > limit)
            {
                articles.truncate(cut);
            }
        }

        Ok(articles)
    }

    pub fn compose(&self, state: &AggregateState, now: DateTime<Utc>) -> Result<String> {
        let articles = self.select(state, now)?;

        let mut items = String::new();
        let mut days = DayWriter::new(self.config);
        let mut count = 0;
        for article in &articles {
            let Some(feed) = state.feeds.get(&article.feed) else {
                continue;
            };
            days.time(&mut items, &article.added.with_timezone(&self.tz));

            let mut bits = self.item_bits(feed, article);
            self.hooks.dispatch(&mut HookContext::OutputItemBits {
                feed,
                article,
                bits: &mut bits,
            })?;
            items.push_str(&fill_template(&self.templates.item, &bits));
            count += 1;
        }
        days.close(&mut items, 0);
        tracing::info!(selected = count, total = state.articles.len(), "Selected articles to write");

        let mut bits = Substitutions::new();
        bits.insert("version", VERSION);
        bits.insert("refresh", refresh_header(state));
        bits.insert("items", items);
        bits.insert("num_items", count.to_string());
        bits.insert("feeds", self.feeds_table(state));
        self.hooks
            .dispatch(&mut HookContext::OutputBits { bits: &mut bits })?;

        Ok(fill_template(&self.templates.page, &bits))
    }

    pub fn item_bits(&self, feed: &Feed, article: &Article) -> Substitutions {
        let base = Some(feed.url.as_str());
        let link = article.link.as_deref().filter(|l| !l.is_empty());
        let title = article
            .title
            .as_deref()
            .map(|t| sanitise_html(t, base))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| match link {
                Some(_) => "Link".to_string(),
                None => "Article".to_string(),
            });
        let description = article.description.as_deref().unwrap_or("");
        let description = if feed.option("format") == Some("text") && !description.is_empty() {
            format!("<pre>{}</pre>", html_escape::encode_text(description))
        } else {
            sanitise_html(description, base)
        };

        let mut bits = Substitutions::new();
        bits.insert(
            "title",
            match link {
                Some(link) => format!(
                    "<a href=\"{}\">{}</a>",
                    html_escape::encode_double_quoted_attribute(link),
                    title
                ),
                None => title.clone(),
            },
        );
        bits.insert("title_no_link", title);
        bits.insert("link", link.unwrap_or(""));
        bits.insert("feed_title_no_link", feed.display_name());
        bits.insert("feed_title", feed.html_link());
        bits.insert("feed_url", feed.url.as_str());
        bits.insert("feed_hash", feed.url_hash());
        bits.insert("hash", article.short_id());
        bits.insert("description", description);
        bits.insert("added", self.format_time(&article.added));
        bits.insert(
            "date",
            article
                .date
                .map(|d| self.format_time(&d))
                .unwrap_or_default(),
        );
        bits
    }

    /// The feed status table, sorted by display name.
    pub fn feeds_table(&self, state: &AggregateState) -> String {
        let mut feeds: Vec<&Feed> = state.feeds.values().collect();
        feeds.sort_by_cached_key(|f| f.display_name().to_lowercase());

        let mut out = String::from(
            "<table id=\"feeds\">\n<tr id=\"feedsheader\">\n\
             <th>Feed</th><th>RSS</th><th>Last update</th><th>Next update</th>\n</tr>\n",
        );
        for feed in feeds {
            out.push_str("<tr class=\"feedsrow\">\n");
            out.push_str(&format!("<td>{}</td>\n", feed.html_link()));
            out.push_str(&format!(
                "<td><a class=\"xmlbutton\" href=\"{}\">XML</a></td>\n",
                feed.url
            ));
            out.push_str(&format!("<td>{}</td>\n", self.format_time(&feed.last_update)));
            out.push_str(&format!("<td>{}</td>\n", self.format_time(&feed.next_update())));
            out.push_str("</tr>\n");
        }
        out.push_str("</table>");
        out
    }

    fn format_time(&self, when: &DateTime<Utc>) -> String {
        let local = when.with_timezone(&self.tz);
        format!(
            "{}, {}",
            local.format(&self.config.time_format),
            local.format(&self.config.day_format)
        )
    }
}

/// Meta refresh tag for the most frequently polled feed.
fn refresh_header(state: &AggregateState) -> String {
    let minutes = state
        .feeds
        .values()
        .map(|f| f.period)
        .fold(MAX_REFRESH, u32::min);
    format!(
        "<meta http-equiv=\"Refresh\" content=\"{}\">",
        u64::from(minutes) * 60
    )
}
