//! # Roost
//!
//! The application shell of a client-side app: a route table with
//! navigation guards, and named reactive stores persisted to a key-value
//! storage provider.
//!
//! ## Router
//!
//! - `RouteTable` - path → view mapping, empty by default
//! - `Router` - resolution, guarded navigation, history, reactive current route
//! - `AuthGuard` - optional login redirect, disabled unless enabled
//!
//! ## Stores
//!
//! - `Store<T>` - thread-safe reactive state container
//! - `PersistedStore<S>` - named store with write-through persistence
//! - `DemoStore` - the `demo` store (`name`, `age`)
//!
//! ## Application context
//!
//! `AppContext` owns the storage provider, the stores and the router, and is
//! passed explicitly to whatever needs them.
//!
//! ```
//! use std::sync::Arc;
//! use roost::{AppContext, MemoryStorage};
//!
//! let storage = MemoryStorage::new();
//! let ctx = AppContext::new(Arc::new(storage.clone()));
//! let demo = ctx.demo_store().unwrap();
//! assert_eq!(demo.get().name, "张三");
//!
//! demo.set("name", "X").unwrap();
//!
//! // A fresh context over the same storage behaves like a page reload.
//! let reloaded = AppContext::new(Arc::new(storage));
//! assert_eq!(reloaded.demo_store().unwrap().get().name, "X");
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod persist;
pub mod router;
pub mod store;

pub use app::AppContext;
pub use config::Config;
pub use error::{Error, Result};
pub use persist::{FileStorage, MemoryStorage, PersistedStore, SharedStorage, Storage, StoreDefinition};
pub use router::{AuthGuard, NavigationOutcome, ResolvedRoute, RouteEntry, RouteTable, Router};
pub use store::{DemoState, DemoStore, Store, Subscription};
