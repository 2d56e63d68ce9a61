//! # rawdog
//!
//! An RSS/Atom aggregator that merges many feeds into one static HTML page.
//!
//! ## Architecture
//!
//! Each run loads the saved state, optionally updates it, and optionally
//! writes the page:
//!
//! ```text
//! Config → Scheduler → Fetcher → Normalizer → ArticleStore → Renderer → page
//! ```
//!
//! Extensions attach to named points of that flow through a [`hooks::HookRegistry`].
//!
//! ## Quick Start
//!
//! ```bash
//! mkdir ~/.rawdog
//! cat > ~/.rawdog/config.toml <<EOF
//! output_file = "output.html"
//!
//! [[feeds]]
//! url = "https://blog.rust-lang.org/feed.xml"
//! period = "1h"
//! EOF
//!
//! # Fetch due feeds, then write ~/.rawdog/output.html
//! rawdog run
//!
//! # Force one feed
//! rawdog update --feed https://blog.rust-lang.org/feed.xml
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, hooks,
/// state store and fetcher for one run.
pub mod app;

/// Command-line interface using clap.
///
/// - `update [--feed URL]` - Fetch due feeds (or one feed)
/// - `write` - Write the output page
/// - `run` - Update, then write
/// - `list` - List known feeds
/// - `show-template [--item]` - Print the template in use
pub mod cli;

/// TOML configuration, loaded from `config.toml` in the state directory.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a subscribed feed and its fetch bookkeeping
/// - [`Article`](domain::Article): an item identified by a content fingerprint
/// - [`AggregateState`](domain::AggregateState): everything saved between runs
pub mod domain;

/// HTTP fetching with conditional requests.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Named extension points.
pub mod hooks;

/// Feed parsing into [`ParsedFeed`](normalizer::ParsedFeed).
pub mod normalizer;

/// Built-in extensions.
pub mod plugins;

/// Page composition and atomic output.
pub mod render;

/// The update cycle.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`StateStore`](store::StateStore): load and save the aggregate
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// `__name__` templates.
pub mod template;
