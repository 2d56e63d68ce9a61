pub mod article;
pub mod feed;
pub mod state;

pub use article::{short_hash, Article};
pub use feed::Feed;
pub use state::{AggregateState, ArticleStore, EXPIRY_WINDOW};
