//! Client-side routing.
//!
//! # Data Flow
//! ```text
//! push / replace / go (target)
//!     → location.rs (parse & normalize)
//!     → route.rs (table lookup: zero or one entry)
//!     → guard.rs (before-each guards: continue, redirect or abort)
//!     → history.rs + current route (commit, subscribers notified)
//! ```

mod guard;
mod history;
mod location;
mod route;
mod router;

pub use guard::{AuthGuard, GuardDecision, NavigationGuard, StorageToken, TokenSource};
pub use history::MemoryHistory;
pub use location::{normalize_path, Location};
pub use route::{RouteEntry, RouteMeta, RouteTable, ViewRef};
pub use router::{NavigationOutcome, ResolvedRoute, Router, MAX_REDIRECTS};
