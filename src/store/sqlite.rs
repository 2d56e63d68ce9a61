use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use rusqlite_migration::{Migrations, M};

use crate::app::{RawdogError, Result};
use crate::domain::{AggregateState, Article, Feed};
use crate::store::StateStore;

const MEMORY: &str = ":memory:";

/// Take the database's exclusive lock and keep it for the connection's lifetime.
fn lock_exclusive(conn: &Connection, path: &Path) -> Result<()> {
    let locked = conn
        .busy_timeout(Duration::ZERO)
        .and_then(|_| conn.pragma_update(None, "locking_mode", "EXCLUSIVE"))
        .and_then(|_| conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;"));
    match locked {
        Ok(()) => Ok(()),
        Err(e) if e.sqlite_error_code() == Some(ErrorCode::DatabaseBusy) => {
            Err(RawdogError::Locked(path.to_path_buf()))
        }
        Err(e) => Err(corrupt(path, e)),
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Open the state file and hold it exclusively until the store is dropped.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| corrupt(&path, e))?;
        lock_exclusive(&conn, &path)?;
        let store = Self {
            conn: Mutex::new(conn),
            path,
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(MEMORY),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![
            M::up(include_str!("../../migrations/001-initial/up.sql")),
            M::up(include_str!("../../migrations/002-article-order/up.sql")),
        ]);

        let mut conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| corrupt(&self.path, e))?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| corrupt(&self.path, e))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RawdogError::Other(format!("State database lock poisoned: {}", e)))
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn required_datetime(&self, s: &str) -> Result<DateTime<Utc>> {
        Self::parse_datetime(s).ok_or_else(|| RawdogError::CorruptState {
            path: self.path.clone(),
            reason: format!("bad timestamp {:?}", s),
        })
    }

    fn load_feeds(&self, conn: &Connection) -> Result<BTreeMap<String, Feed>> {
        let mut stmt = conn.prepare(
            "SELECT url, period, etag, modified, title, link, last_update FROM feeds",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut feeds = BTreeMap::new();
        for (url, period, etag, modified, title, link, last_update) in rows {
            let mut feed = Feed::new(url.clone());
            feed.period = u32::try_from(period).unwrap_or(u32::MAX);
            feed.etag = etag;
            feed.modified = modified;
            feed.title = title;
            feed.link = link;
            feed.last_update = self.required_datetime(&last_update)?;
            feeds.insert(url, feed);
        }

        let mut stmt = conn.prepare("SELECT feed_url, name, value FROM feed_options")?;
        let options = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for option in options {
            let (url, name, value) = option?;
            if let Some(feed) = feeds.get_mut(&url) {
                feed.options.insert(name, value);
            }
        }

        Ok(feeds)
    }

    fn load_articles(&self, conn: &Connection) -> Result<Vec<Article>> {
        let mut stmt = conn.prepare(
            "SELECT fingerprint, feed_url, title, link, description, sequence, published_at, added, last_seen
             FROM articles",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut articles = Vec::with_capacity(rows.len());
        for (fingerprint, feed, title, link, description, sequence, published, added, last_seen) in rows {
            articles.push(Article {
                fingerprint,
                feed,
                title,
                link,
                description,
                sequence: sequence.and_then(|s| u32::try_from(s).ok()).unwrap_or(0),
                date: published.as_deref().and_then(Self::parse_datetime),
                added: self.required_datetime(&added)?,
                last_seen: self.required_datetime(&last_seen)?,
            });
        }
        Ok(articles)
    }
}

fn corrupt(path: &Path, e: impl std::fmt::Display) -> RawdogError {
    RawdogError::CorruptState {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl StateStore for SqliteStore {
    fn load(&self) -> Result<AggregateState> {
        let conn = self.conn()?;
        let feeds = self.load_feeds(&conn)?;
        let mut state = AggregateState {
            feeds,
            ..AggregateState::default()
        };
        for article in self.load_articles(&conn)? {
            state.articles.insert(article);
        }
        tracing::debug!(
            feeds = state.feeds.len(),
            articles = state.articles.len(),
            "Loaded state"
        );
        Ok(state)
    }

    fn save(&self, state: &AggregateState) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM articles", [])?;
        tx.execute("DELETE FROM feed_options", [])?;
        tx.execute("DELETE FROM feeds", [])?;

        {
            let mut insert_feed = tx.prepare(
                "INSERT INTO feeds (url, period, etag, modified, title, link, last_update)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let mut insert_option =
                tx.prepare("INSERT INTO feed_options (feed_url, name, value) VALUES (?1, ?2, ?3)")?;
            for feed in state.feeds.values() {
                insert_feed.execute(params![
                    feed.url,
                    feed.period,
                    feed.etag,
                    feed.modified,
                    feed.title,
                    feed.link,
                    feed.last_update.to_rfc3339()
                ])?;
                for (name, value) in &feed.options {
                    insert_option.execute(params![feed.url, name, value])?;
                }
            }

            let mut insert_article = tx.prepare(
                "INSERT INTO articles
                 (fingerprint, feed_url, title, link, description, sequence, published_at, added, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for article in state.articles.iter() {
                insert_article.execute(params![
                    article.fingerprint,
                    article.feed,
                    article.title,
                    article.link,
                    article.description,
                    article.sequence,
                    article.date.map(|d| d.to_rfc3339()),
                    article.added.to_rfc3339(),
                    article.last_seen.to_rfc3339()
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            feeds = state.feeds.len(),
            articles = state.articles.len(),
            "Saved state"
        );
        Ok(())
    }
}
