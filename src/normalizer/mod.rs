use chrono::{DateTime, Utc};
use feed_rs::parser;

/// One entry of a fetched feed, before it becomes an article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub link: Option<String>,
    pub items: Vec<IncomingItem>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<ParsedFeed, feed_rs::parser::ParseFeedError> {
        let feed = parser::parse(body)?;

        let link = feed
            .links
            .iter()
            .find(|l| l.rel.as_deref() != Some("self"))
            .map(|l| l.href.clone());

        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let description = entry
                    .content
                    .and_then(|c| c.body)
                    .or_else(|| entry.summary.map(|s| s.content));

                IncomingItem {
                    title: entry.title.map(|t| t.content),
                    link: entry.links.first().map(|l| l.href.clone()),
                    description,
                    date: entry.published.or(entry.updated),
                }
            })
            .collect();

        Ok(ParsedFeed {
            title: feed.title.map(|t| t.content),
            link,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test &amp; Feed</title>
    <link>https://example.com/</link>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <link rel="self" href="https://example.com/feed.atom"/>
  <link href="https://example.com/"/>
  <id>urn:test</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>Summary text</summary>
    <content type="html">Full content</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let doc = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("Test & Feed".into()));
        assert_eq!(doc.link, Some("https://example.com/".into()));
        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].title, Some("Test Item 1".into()));
        assert_eq!(doc.items[0].link, Some("https://example.com/item1".into()));
        assert_eq!(doc.items[0].description, Some("This is item 1".into()));
        assert_eq!(
            doc.items[0].date,
            DateTime::from_timestamp(1_704_067_200, 0)
        );
        assert_eq!(doc.items[1].description, None);
        assert_eq!(doc.items[1].date, None);
    }

    #[test]
    fn test_parse_atom_prefers_content() {
        let doc = Normalizer::new().normalize(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("Atom Test Feed".into()));
        assert_eq!(doc.link, Some("https://example.com/".into()));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].link, Some("https://example.com/atom1".into()));
        assert_eq!(doc.items[0].description, Some("Full content".into()));
    }

    #[test]
    fn test_escaped_markup_stays_escaped() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>AT&amp;T</title>
  <item>
    <title>Tom &amp;amp; Jerry</title>
    <description>&lt;p&gt;Use &amp;lt;script&amp;gt; carefully&lt;/p&gt;</description>
  </item>
</channel></rss>"#;
        let doc = Normalizer::new().normalize(rss.as_bytes()).unwrap();

        assert_eq!(doc.title, Some("AT&T".into()));
        assert_eq!(doc.items[0].title, Some("Tom &amp; Jerry".into()));
        assert_eq!(
            doc.items[0].description,
            Some("<p>Use &lt;script&gt; carefully</p>".into())
        );
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(Normalizer::new().normalize(b"<not valid xml").is_err());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let normalizer = Normalizer::new();
        let a = normalizer.normalize(RSS_SAMPLE.as_bytes()).unwrap();
        let b = normalizer.normalize(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(a, b);
    }
}
