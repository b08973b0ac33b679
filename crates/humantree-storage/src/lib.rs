pub mod convert;
pub mod error;
pub mod hash;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use memory::MemStore;
pub use sqlite::SqliteStore;
pub use traits::{ProgressStore, TreeStore};
pub use types::TreeSummary;
