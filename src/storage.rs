//! Persistence of inspection records.

mod document;
/// The workspace store.
pub mod store;

pub use store::{StorageInfo, Store, StoreError};
