//! Persistence for named stores.
//!
//! # Data Flow
//! ```text
//! PersistedStore::open
//!     → Storage::get_item(key)
//!     → JSON merged over the state defaults
//!
//! set / update / replace / reset
//!     → in-memory Store mutation (subscribers notified)
//!     → Storage::set_item(key, JSON of the picked fields)
//! ```

mod persisted;
mod storage;

pub use persisted::{PersistOptions, PersistedStore, StoreDefinition};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, Storage};
