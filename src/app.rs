//! Application context.
//!
//! The application root owns one [`AppContext`] and hands it (or the store
//! and router handles it produces) to the components that need them.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::error::{ConfigError, Result, StoreError};
use crate::persist::{FileStorage, MemoryStorage, PersistedStore, SharedStorage, StoreDefinition};
use crate::router::{AuthGuard, RouteTable, Router, StorageToken};
use crate::store::DemoStore;

type StoreSlot = Box<dyn Any + Send + Sync>;

/// Owns the storage provider, the named stores and the router.
pub struct AppContext {
    storage: SharedStorage,
    stores: Mutex<HashMap<&'static str, StoreSlot>>,
    router: Router,
    auth_guard: Arc<AuthGuard>,
}

impl AppContext {
    /// A context over `storage` with an empty route table and a disabled
    /// auth guard reading the `token` key.
    ///
    /// See [`AppContext::with_router`] when the token is not a storage key.
    pub fn new(storage: SharedStorage) -> Self {
        Self::with_router(storage, Router::new(RouteTable::new()))
    }

    /// A context over `storage` and an existing router.
    ///
    /// A disabled auth guard reading the `token` key is registered on the
    /// router. That guard only sees a raw storage key. When the token lives
    /// inside a store, leave it disabled and register your own guard with a
    /// closure [`TokenSource`](crate::router::TokenSource):
    ///
    /// ```ignore
    /// let session = ctx.store::<SessionStore>()?;
    /// ctx.router().before_each(AuthGuard::new(move || session.get().token).enabled(true));
    /// ```
    pub fn with_router(storage: SharedStorage, router: Router) -> Self {
        let guard = AuthGuard::new(StorageToken::new(storage.clone(), "token"));
        Self::assemble(storage, router, guard)
    }

    /// Build storage, router and auth guard from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let storage: SharedStorage = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::File => {
                let dir = config.storage.dir.clone().ok_or_else(|| {
                    ConfigError::Invalid(vec!["storage.dir is required for the file backend".into()])
                })?;
                Arc::new(FileStorage::open(dir)?)
            }
        };

        let table = RouteTable::from_entries(config.router.routes.iter().cloned())?;
        let router = Router::with_base(table, &config.router.base)?;

        let guard_config = &config.router.auth_guard;
        let guard = AuthGuard::new(StorageToken::new(storage.clone(), &guard_config.token_key))
            .with_login_path(&guard_config.login_path)
            .enabled(guard_config.enabled);

        Ok(Self::assemble(storage, router, guard))
    }

    fn assemble(storage: SharedStorage, router: Router, guard: AuthGuard) -> Self {
        let auth_guard = Arc::new(guard);
        router.before_each_shared(auth_guard.clone());
        tracing::debug!(?router, auth_guard = ?auth_guard, "app context ready");
        Self {
            storage,
            stores: Mutex::new(HashMap::new()),
            router,
            auth_guard,
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The auth guard registered on the router.
    pub fn auth_guard(&self) -> &AuthGuard {
        &self.auth_guard
    }

    /// The store for definition `S`.
    ///
    /// Instantiated (and rehydrated) on first access; later calls return
    /// handles to the same store.
    pub fn store<S: StoreDefinition>(&self) -> std::result::Result<PersistedStore<S>, StoreError> {
        let mut stores = self.stores.lock();
        if let Some(slot) = stores.get(S::ID) {
            return slot
                .downcast_ref::<PersistedStore<S>>()
                .cloned()
                .ok_or(StoreError::IdConflict { store: S::ID });
        }

        let store = PersistedStore::<S>::open(self.storage.clone())?;
        stores.insert(S::ID, Box::new(store.clone()));
        Ok(store)
    }

    /// The `demo` store.
    pub fn demo_store(&self) -> std::result::Result<PersistedStore<DemoStore>, StoreError> {
        self.store::<DemoStore>()
    }

    /// Ids of the stores instantiated so far.
    pub fn store_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.stores.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("storage", &self.storage)
            .field("stores", &self.store_ids())
            .field("router", &self.router)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{PersistOptions, Storage};
    use crate::router::{NavigationOutcome, RouteEntry};
    use crate::store::DemoState;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Other {
        flag: bool,
    }

    struct ClashingStore;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Session {
        token: Option<String>,
    }

    struct SessionStore;

    impl StoreDefinition for SessionStore {
        const ID: &'static str = "session";
        type State = Session;
    }

    impl StoreDefinition for ClashingStore {
        const ID: &'static str = "demo";
        type State = Other;

        fn persist() -> Option<PersistOptions> {
            None
        }
    }

    #[test]
    fn store_is_created_once() {
        let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
        assert!(ctx.store_ids().is_empty());

        let first = ctx.demo_store().unwrap();
        let second = ctx.demo_store().unwrap();
        first.set("name", "李四").unwrap();

        assert_eq!(second.get().name, "李四");
        assert_eq!(ctx.store_ids(), vec!["demo"]);
    }

    #[test]
    fn clashing_store_ids_are_rejected() {
        let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
        ctx.demo_store().unwrap();
        assert!(matches!(
            ctx.store::<ClashingStore>(),
            Err(StoreError::IdConflict { store: "demo" })
        ));
    }

    #[test]
    fn auth_guard_is_registered_but_disabled() {
        let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
        assert!(!ctx.auth_guard().is_enabled());
        assert!(matches!(
            ctx.router().push("/anywhere").unwrap(),
            NavigationOutcome::Committed(_)
        ));

        ctx.auth_guard().set_enabled(true);
        let outcome = ctx.router().push("/elsewhere").unwrap();
        assert_eq!(outcome.committed().unwrap().path(), "/login");

        ctx.storage().set_item("token", "abc").unwrap();
        let outcome = ctx.router().push("/elsewhere").unwrap();
        assert!(matches!(outcome, NavigationOutcome::Committed(_)));
    }

    #[test]
    fn guard_reads_token_from_a_store() {
        let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
        let session = ctx.store::<SessionStore>().unwrap();
        let reader = session.clone();
        ctx.router()
            .before_each(AuthGuard::new(move || reader.get().token).enabled(true));

        let outcome = ctx.router().push("/profile").unwrap();
        assert_eq!(outcome.committed().unwrap().path(), "/login");

        session.set("token", Some("abc")).unwrap();
        assert!(ctx.storage().get_item("token").unwrap().is_none());
        let outcome = ctx.router().push("/profile").unwrap();
        assert!(matches!(outcome, NavigationOutcome::Committed(_)));
    }

    #[test]
    fn from_config_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        config.storage.dir = Some(dir.path().to_path_buf());
        config.router.auth_guard.enabled = true;
        config.router.auth_guard.token_key = "auth".into();
        config.router.routes = vec![RouteEntry::new("/login", "LoginView")];

        let ctx = AppContext::from_config(&config).unwrap();
        ctx.demo_store().unwrap().set("age", "30").unwrap();
        assert!(dir.path().join("demo.item").exists());

        let outcome = ctx.router().push("/").unwrap();
        let current = outcome.committed().unwrap();
        assert_eq!(current.path(), "/login");
        assert!(current.is_match());

        let reloaded = AppContext::from_config(&config).unwrap();
        assert_eq!(
            reloaded.demo_store().unwrap().get(),
            DemoState {
                name: "张三".into(),
                age: "30".into()
            }
        );
    }

    #[test]
    fn from_config_rejects_invalid() {
        let mut config = Config::default();
        config.router.base = "nope".into();
        assert!(AppContext::from_config(&config).is_err());

        let mut config = Config::default();
        config.router.routes = vec![
            RouteEntry::new("/a", "A"),
            RouteEntry::new("/a", "B"),
        ];
        assert!(AppContext::from_config(&config).is_err());
    }
}
