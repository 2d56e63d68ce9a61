pub mod context;
pub mod error;

pub use context::AppContext;
pub use error::{RawdogError, Result};

/// Version string reported in output and the HTTP user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
