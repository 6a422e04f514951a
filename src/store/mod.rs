//! Reactive state containers.
//!
//! [`Store`] is the in-memory building block; named, persisted stores are
//! layered on top of it in [`crate::persist`].

mod demo;
mod store;

pub use demo::{DemoState, DemoStore};
pub use store::{Store, Subscription};
