pub mod error;
pub mod queue;
pub mod store;

pub use error::{Result, StoreError};
pub use queue::{JobQueue, QueueJob};
pub use store::{CompetitorFilter, CompetitorMatch, Store};
