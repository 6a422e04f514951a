//! Route resolution and navigation.
//!
//! # Responsibilities
//! - Resolve a target to zero or one route entry
//! - Run guards before committing a navigation
//! - Track history and expose the current route reactively

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::RouterError;
use crate::router::guard::{GuardDecision, NavigationGuard};
use crate::router::history::MemoryHistory;
use crate::router::location::{join_base, normalize_path, strip_base, Location};
use crate::router::route::{RouteEntry, RouteMeta, RouteTable};
use crate::store::{Store, Subscription};

/// Consecutive guard redirects allowed before a navigation fails.
pub const MAX_REDIRECTS: usize = 10;

type AfterHook = Arc<dyn Fn(&ResolvedRoute, Option<&ResolvedRoute>) + Send + Sync>;

/// A location together with the entry it matched, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub location: Location,
    pub matched: Option<RouteEntry>,
}

impl ResolvedRoute {
    pub fn path(&self) -> &str {
        &self.location.path
    }

    pub fn full_path(&self) -> String {
        self.location.full_path()
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.matched.as_ref()?.name.as_deref()
    }

    pub fn meta(&self) -> Option<&RouteMeta> {
        self.matched.as_ref().map(|m| &m.meta)
    }
}

/// Result of a navigation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The requested route is now current.
    Committed(ResolvedRoute),
    /// A guard redirected; `to` is now current.
    Redirected {
        from: ResolvedRoute,
        to: ResolvedRoute,
    },
    /// A guard aborted; the current route is unchanged.
    Aborted { to: ResolvedRoute, reason: String },
    /// The target is already current; nothing changed.
    Duplicated(ResolvedRoute),
}

impl NavigationOutcome {
    /// The route that is current after this navigation, if it changed.
    pub fn committed(&self) -> Option<&ResolvedRoute> {
        match self {
            NavigationOutcome::Committed(route) => Some(route),
            NavigationOutcome::Redirected { to, .. } => Some(to),
            NavigationOutcome::Aborted { .. } | NavigationOutcome::Duplicated(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Commit {
    Push,
    Replace,
    Traverse(isize),
}

struct RouterInner {
    base: String,
    table: RwLock<RouteTable>,
    guards: RwLock<Vec<Arc<dyn NavigationGuard>>>,
    after_hooks: RwLock<Vec<AfterHook>>,
    history: Mutex<MemoryHistory>,
    current: Store<Option<ResolvedRoute>>,
}

/// Client-side router.
///
/// Clones share the same table, guards, history and current route.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// A router over `table` served from the root path.
    pub fn new(table: RouteTable) -> Self {
        Self::build(table, "/".to_string())
    }

    /// A router over `table` served under `base` (e.g. `/app`).
    pub fn with_base(table: RouteTable, base: &str) -> Result<Self, RouterError> {
        if !base.starts_with('/') {
            return Err(RouterError::InvalidPath {
                path: base.to_string(),
                reason: "base must start with '/'",
            });
        }
        Ok(Self::build(table, normalize_path(base)))
    }

    fn build(table: RouteTable, base: String) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                base,
                table: RwLock::new(table),
                guards: RwLock::new(Vec::new()),
                after_hooks: RwLock::new(Vec::new()),
                history: Mutex::new(MemoryHistory::new()),
                current: Store::new(None),
            }),
        }
    }

    pub fn base(&self) -> &str {
        &self.inner.base
    }

    /// Add a route at runtime.
    pub fn add_route(&self, entry: RouteEntry) -> Result<(), RouterError> {
        self.inner.table.write().add(entry)
    }

    /// Remove a named route at runtime.
    pub fn remove_route(&self, name: &str) -> Option<RouteEntry> {
        self.inner.table.write().remove_by_name(name)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.inner.table.read().by_name(name).is_some()
    }

    /// Snapshot of the route entries.
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.inner.table.read().iter().cloned().collect()
    }

    /// Register a guard. Guards run in registration order.
    pub fn before_each(&self, guard: impl NavigationGuard + 'static) {
        self.before_each_shared(Arc::new(guard));
    }

    /// Register a guard the caller keeps a handle to.
    pub fn before_each_shared(&self, guard: Arc<dyn NavigationGuard>) {
        self.inner.guards.write().push(guard);
    }

    /// Register a hook called after every committed navigation.
    pub fn after_each<F>(&self, hook: F)
    where
        F: Fn(&ResolvedRoute, Option<&ResolvedRoute>) + Send + Sync + 'static,
    {
        self.inner.after_hooks.write().push(Arc::new(hook));
    }

    /// Resolve an app-relative target without running guards.
    pub fn resolve(&self, target: impl Into<Location>) -> ResolvedRoute {
        let location = target.into();
        let matched = self.inner.table.read().resolve(&location.path).cloned();
        tracing::debug!(path = %location.path, matched = matched.is_some(), "route resolved");
        ResolvedRoute { location, matched }
    }

    /// Resolve a browser URL, stripping the base path first.
    pub fn resolve_url(&self, url: &str) -> ResolvedRoute {
        let mut location = Location::parse(url);
        location.path = strip_base(&self.inner.base, &location.path);
        self.resolve(location)
    }

    /// Browser URL for a route, including the base path.
    pub fn href(&self, route: &ResolvedRoute) -> String {
        let mut location = route.location.clone();
        location.path = join_base(&self.inner.base, &location.path);
        location.full_path()
    }

    /// The current route, `None` before the first navigation.
    pub fn current(&self) -> Option<ResolvedRoute> {
        self.inner.current.get()
    }

    /// Subscribe to committed navigations.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<ResolvedRoute>) + Send + Sync + 'static,
    {
        self.inner.current.subscribe(callback)
    }

    /// Navigate to `target`, adding a history entry.
    pub fn push(&self, target: impl Into<Location>) -> Result<NavigationOutcome, RouterError> {
        self.navigate(self.resolve(target), Commit::Push)
    }

    /// Navigate to `target`, replacing the current history entry.
    pub fn replace(&self, target: impl Into<Location>) -> Result<NavigationOutcome, RouterError> {
        self.navigate(self.resolve(target), Commit::Replace)
    }

    /// Like [`Router::push`], but an unmatched target is an error and
    /// nothing is committed.
    pub fn push_strict(
        &self,
        target: impl Into<Location>,
    ) -> Result<NavigationOutcome, RouterError> {
        let to = self.resolve(target);
        if !to.is_match() {
            return Err(RouterError::NoMatch(to.full_path()));
        }
        self.navigate(to, Commit::Push)
    }

    /// Go back one history entry.
    pub fn back(&self) -> Result<NavigationOutcome, RouterError> {
        self.go(-1)
    }

    /// Go forward one history entry.
    pub fn forward(&self) -> Result<NavigationOutcome, RouterError> {
        self.go(1)
    }

    /// Move `delta` entries through history. Guards run on the target.
    pub fn go(&self, delta: isize) -> Result<NavigationOutcome, RouterError> {
        let target = self
            .inner
            .history
            .lock()
            .peek(delta)
            .cloned()
            .ok_or(RouterError::HistoryExhausted)?;
        self.navigate(self.resolve(target), Commit::Traverse(delta))
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.inner.history.lock().len()
    }

    fn navigate(
        &self,
        requested: ResolvedRoute,
        mode: Commit,
    ) -> Result<NavigationOutcome, RouterError> {
        let from = self.current();

        if matches!(mode, Commit::Push | Commit::Replace)
            && from.as_ref().is_some_and(|f| f.location == requested.location)
        {
            tracing::debug!(to = %requested.location, "navigation duplicated");
            return Ok(NavigationOutcome::Duplicated(requested));
        }

        let mut to = requested.clone();
        let mut mode = mode;
        let mut redirects = 0;

        loop {
            match self.run_guards(&to, from.as_ref()) {
                GuardDecision::Continue => break,
                GuardDecision::Redirect(target) => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        return Err(RouterError::RedirectLoop {
                            to: requested.full_path(),
                            limit: MAX_REDIRECTS,
                        });
                    }
                    tracing::debug!(from = %to.location, to = %target, "navigation redirected");
                    to = self.resolve(target);
                    // A redirect away from a history entry becomes a new entry.
                    if let Commit::Traverse(_) = mode {
                        mode = Commit::Push;
                    }
                }
                GuardDecision::Abort(reason) => {
                    tracing::debug!(to = %to.location, %reason, "navigation aborted");
                    return Ok(NavigationOutcome::Aborted { to, reason });
                }
            }
        }

        // A redirect back onto the current route changes nothing.
        if redirects > 0 && from.as_ref().is_some_and(|f| f.location == to.location) {
            tracing::debug!(to = %to.location, "redirect landed on the current route");
            return Ok(NavigationOutcome::Duplicated(to));
        }

        self.commit(&to, from.as_ref(), mode);

        if redirects == 0 {
            Ok(NavigationOutcome::Committed(to))
        } else {
            Ok(NavigationOutcome::Redirected {
                from: requested,
                to,
            })
        }
    }

    fn run_guards(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>) -> GuardDecision {
        // Clone the list so guards may register further guards.
        let guards: Vec<Arc<dyn NavigationGuard>> = self.inner.guards.read().clone();
        for guard in guards {
            match guard.check(to, from) {
                GuardDecision::Continue => continue,
                decision => return decision,
            }
        }
        GuardDecision::Continue
    }

    fn commit(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>, mode: Commit) {
        {
            let mut history = self.inner.history.lock();
            match mode {
                Commit::Push => history.push(to.location.clone()),
                Commit::Replace => history.replace(to.location.clone()),
                Commit::Traverse(delta) => {
                    history.go(delta);
                }
            }
        }

        if to.is_match() {
            tracing::debug!(to = %to.location, name = ?to.name(), "navigation committed");
        } else {
            tracing::warn!(to = %to.location, "navigation committed with no matching route");
        }

        self.inner.current.set(Some(to.clone()));

        let hooks: Vec<AfterHook> = self.inner.after_hooks.read().clone();
        for hook in hooks {
            hook(to, from);
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("base", &self.inner.base)
            .field("routes", &self.inner.table.read().len())
            .field("guards", &self.inner.guards.read().len())
            .finish()
    }
}
