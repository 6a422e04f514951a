//! Navigation guards.
//!
//! A guard runs before a navigation is committed and may let it continue,
//! redirect it or abort it. Guards run in registration order and the first
//! decision other than [`GuardDecision::Continue`] wins.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::persist::SharedStorage;
use crate::router::router::ResolvedRoute;

/// What a guard wants to happen to a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Continue,
    Redirect(String),
    Abort(String),
}

/// A check consulted before a navigation completes.
pub trait NavigationGuard: Send + Sync {
    fn check(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>) -> GuardDecision;
}

impl<F> NavigationGuard for F
where
    F: Fn(&ResolvedRoute, Option<&ResolvedRoute>) -> GuardDecision + Send + Sync,
{
    fn check(&self, to: &ResolvedRoute, from: Option<&ResolvedRoute>) -> GuardDecision {
        self(to, from)
    }
}

/// Where the auth guard looks for the current authentication token.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Reads the token from a key in a storage provider.
///
/// Empty values and read failures count as "no token".
#[derive(Debug, Clone)]
pub struct StorageToken {
    storage: SharedStorage,
    key: String,
}

impl StorageToken {
    pub fn new(storage: SharedStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

impl TokenSource for StorageToken {
    fn token(&self) -> Option<String> {
        match self.storage.get_item(&self.key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "token lookup failed");
                None
            }
        }
    }
}

/// Redirects to the login page when no token is present.
///
/// Disabled unless explicitly enabled. When enabled, every navigation to a
/// path other than the login path is redirected there while the token
/// source yields nothing. Routes whose meta sets `requires_auth = false`
/// are exempt.
pub struct AuthGuard {
    enabled: AtomicBool,
    login_path: String,
    token: Box<dyn TokenSource>,
}

impl AuthGuard {
    pub const DEFAULT_LOGIN_PATH: &'static str = "/login";

    /// A disabled guard redirecting to `/login`.
    pub fn new(token: impl TokenSource + 'static) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            login_path: Self::DEFAULT_LOGIN_PATH.to_string(),
            token: Box::new(token),
        }
    }

    pub fn with_login_path(mut self, path: impl AsRef<str>) -> Self {
        self.login_path = crate::router::location::normalize_path(path.as_ref());
        self
    }

    pub fn enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            tracing::info!(enabled, login_path = %self.login_path, "auth guard toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl NavigationGuard for AuthGuard {
    fn check(&self, to: &ResolvedRoute, _from: Option<&ResolvedRoute>) -> GuardDecision {
        if !self.is_enabled() || to.path() == self.login_path {
            return GuardDecision::Continue;
        }
        if to.meta().is_some_and(|m| m.requires_auth == Some(false)) {
            return GuardDecision::Continue;
        }
        if self.token.token().is_some() {
            return GuardDecision::Continue;
        }
        tracing::debug!(to = %to.location, login_path = %self.login_path, "no token, redirecting");
        GuardDecision::Redirect(self.login_path.clone())
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("enabled", &self.is_enabled())
            .field("login_path", &self.login_path)
            .finish()
    }
}
