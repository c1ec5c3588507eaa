//! Work item model and durable store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteItemStore;
pub use store::{ItemFilter, ItemStore, OwnerCount, StateCount, StoreError};
pub use types::{derive_title, sanitize_name, ItemState, NewItem, WorkItem};
