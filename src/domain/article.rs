use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::normalizer::IncomingItem;

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub fingerprint: String,
    /// URL of the owning feed.
    pub feed: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    /// Position within the fetch that first produced this article.
    pub sequence: u32,
    pub date: Option<DateTime<Utc>>,
    pub added: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Article {
    pub fn new(feed: &str, item: &IncomingItem, sequence: u32, now: DateTime<Utc>) -> Self {
        let fingerprint = Self::fingerprint(
            feed,
            item.title.as_deref(),
            item.link.as_deref(),
            item.description.as_deref(),
        );
        Self {
            fingerprint,
            feed: feed.to_string(),
            title: item.title.clone(),
            link: item.link.clone(),
            description: item.description.clone(),
            sequence,
            date: item.date,
            added: now,
            last_seen: now,
        }
    }

    /// Content-derived identity: a pure function of feed, title, link and
    /// description. Absent fields hash differently from empty ones.
    pub fn fingerprint(
        feed: &str,
        title: Option<&str>,
        link: Option<&str>,
        description: Option<&str>,
    ) -> String {
        let mut hasher = Sha256::new();
        hash_field(&mut hasher, Some(feed));
        hash_field(&mut hasher, title);
        hash_field(&mut hasher, link);
        hash_field(&mut hasher, description);
        hex::encode(hasher.finalize())
    }

    pub fn short_id(&self) -> String {
        short_hash(&self.fingerprint)
    }
}

fn hash_field(hasher: &mut Sha256, field: Option<&str>) {
    match field {
        Some(value) => {
            hasher.update([1u8]);
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Eight hex digits identifying `s`, short enough to type.
pub fn short_hash(s: &str) -> String {
    let digest = hex::encode(Sha256::digest(s.as_bytes()));
    digest[digest.len() - 8..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "https://example.com/feed.xml";

    #[test]
    fn test_fingerprint_deterministic() {
        let a = Article::fingerprint(FEED, Some("Title"), Some("https://x/1"), Some("Body"));
        let b = Article::fingerprint(FEED, Some("Title"), Some("https://x/1"), Some("Body"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_covers_every_field() {
        let base = Article::fingerprint(FEED, Some("T"), Some("L"), Some("D"));
        assert_ne!(base, Article::fingerprint("https://other/", Some("T"), Some("L"), Some("D")));
        assert_ne!(base, Article::fingerprint(FEED, Some("T2"), Some("L"), Some("D")));
        assert_ne!(base, Article::fingerprint(FEED, Some("T"), Some("L2"), Some("D")));
        assert_ne!(base, Article::fingerprint(FEED, Some("T"), Some("L"), Some("D2")));
    }

    #[test]
    fn test_fingerprint_absent_differs_from_empty() {
        let absent = Article::fingerprint(FEED, None, Some("L"), None);
        let empty = Article::fingerprint(FEED, Some(""), Some("L"), None);
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_fingerprint_field_boundaries_matter() {
        let a = Article::fingerprint(FEED, Some("ab"), Some("c"), None);
        let b = Article::fingerprint(FEED, Some("a"), Some("bc"), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_article_timestamps() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let item = IncomingItem {
            title: Some("Hello".into()),
            link: Some("https://example.com/hello".into()),
            description: None,
            date: None,
        };
        let article = Article::new(FEED, &item, 3, now);
        assert_eq!(article.added, now);
        assert_eq!(article.last_seen, now);
        assert_eq!(article.sequence, 3);
        assert_eq!(
            article.fingerprint,
            Article::fingerprint(FEED, Some("Hello"), Some("https://example.com/hello"), None)
        );
    }

    #[test]
    fn test_short_hash() {
        let h = short_hash(FEED);
        assert_eq!(h.len(), 8);
        assert_eq!(h, short_hash(FEED));
        assert_ne!(h, short_hash("https://example.com/other.xml"));
    }
}
