pub mod sqlite;

use crate::app::Result;
use crate::domain::AggregateState;

pub use sqlite::SqliteStore;

/// Where the aggregate lives between runs. The whole state is read at startup
/// and written back in one piece.
pub trait StateStore {
    fn load(&self) -> Result<AggregateState>;
    fn save(&self, state: &AggregateState) -> Result<()>;
}
