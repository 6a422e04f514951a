use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

use crate::error::StoreError;
use crate::persist::storage::SharedStorage;
use crate::store::{Store, Subscription};

/// Declares a named store: its id, its state type and how it persists.
///
/// The state's [`Default`] impl provides the initial values.
pub trait StoreDefinition: 'static {
    /// Store id. Also the default storage key.
    const ID: &'static str;

    type State: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Persistence options, or `None` for a memory-only store.
    fn persist() -> Option<PersistOptions> {
        Some(PersistOptions::default())
    }
}

/// How a store is written to its storage provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOptions {
    /// Storage key override. Defaults to the store id.
    pub key: Option<String>,
    /// Top-level fields to persist. `None` persists the whole state.
    pub pick: Option<Vec<String>>,
}

impl PersistOptions {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn pick<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.pick = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    fn picks(&self, field: &str) -> bool {
        self.pick
            .as_ref()
            .map_or(true, |fields| fields.iter().any(|f| f == field))
    }
}

#[derive(Debug, Clone)]
struct Persistence {
    storage: SharedStorage,
    key: String,
    options: PersistOptions,
}

/// A named reactive store with write-through persistence.
///
/// Every mutation updates the in-memory state, notifies subscribers and then
/// writes the full state to the storage provider. A failed write leaves the
/// in-memory state applied and is returned as [`StoreError::Persist`].
pub struct PersistedStore<S: StoreDefinition> {
    store: Store<S::State>,
    persistence: Option<Persistence>,
    _definition: PhantomData<fn() -> S>,
}

impl<S: StoreDefinition> PersistedStore<S> {
    /// Create the store and rehydrate it from `storage`.
    ///
    /// A missing entry yields the defaults. An entry that cannot be parsed
    /// is logged and ignored. Only a failing storage read is an error.
    pub fn open(storage: SharedStorage) -> Result<Self, StoreError> {
        let persistence = S::persist().map(|options| Persistence {
            key: options.key.clone().unwrap_or_else(|| S::ID.to_string()),
            storage,
            options,
        });

        let initial = match &persistence {
            Some(p) => load_state::<S>(p)?,
            None => S::State::default(),
        };

        tracing::info!(
            store = S::ID,
            persisted = persistence.is_some(),
            "store instantiated"
        );

        Ok(Self {
            store: Store::new(initial),
            persistence,
            _definition: PhantomData,
        })
    }

    /// Create a memory-only store regardless of the definition's options.
    pub fn in_memory() -> Self {
        Self {
            store: Store::new(S::State::default()),
            persistence: None,
            _definition: PhantomData,
        }
    }

    pub fn id(&self) -> &'static str {
        S::ID
    }

    /// Storage key, when the store is persisted.
    pub fn storage_key(&self) -> Option<&str> {
        self.persistence.as_ref().map(|p| p.key.as_str())
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> S::State {
        self.store.get()
    }

    /// Read the state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S::State) -> R,
    {
        self.store.read(f)
    }

    /// Set one top-level field by name, then write through.
    ///
    /// Unknown fields and values of the wrong type are rejected and leave the
    /// state unchanged.
    pub fn set<V: Serialize>(&self, field: &str, value: V) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
            store: S::ID,
            source,
        })?;

        self.store.try_update(|state| {
            let mut current =
                serde_json::to_value(&*state).map_err(|source| StoreError::Serialize {
                    store: S::ID,
                    source,
                })?;
            let slot = current
                .as_object_mut()
                .and_then(|fields| fields.get_mut(field))
                .ok_or_else(|| StoreError::UnknownField {
                    store: S::ID,
                    field: field.to_string(),
                })?;
            *slot = value;
            *state = serde_json::from_value(current).map_err(|e| StoreError::InvalidValue {
                store: S::ID,
                field: field.to_string(),
                reason: e.to_string(),
            })?;
            Ok(())
        })?;

        tracing::debug!(store = S::ID, field, "field set");
        self.write_through()
    }

    /// Mutate the state with a closure, then write through.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut S::State),
    {
        self.store.update(f);
        self.write_through()
    }

    /// Replace the whole state, then write through.
    pub fn replace(&self, state: S::State) -> Result<(), StoreError> {
        self.store.set(state);
        self.write_through()
    }

    /// Restore the defaults, then write through.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.replace(S::State::default())
    }

    /// Reload the state from storage, discarding in-memory changes.
    pub fn hydrate(&self) -> Result<(), StoreError> {
        if let Some(p) = &self.persistence {
            let state = load_state::<S>(p)?;
            self.store.set(state);
        }
        Ok(())
    }

    /// Write the current state to storage.
    pub fn write_through(&self) -> Result<(), StoreError> {
        let Some(p) = &self.persistence else {
            return Ok(());
        };
        let state = self.store.get();
        let text = encode_state::<S>(&state, &p.options)?;

        p.storage.set_item(&p.key, &text).map_err(|source| {
            tracing::error!(store = S::ID, key = %p.key, error = %source, "persist failed");
            StoreError::Persist {
                store: S::ID,
                source,
            }
        })?;

        tracing::debug!(store = S::ID, key = %p.key, bytes = text.len(), "state persisted");
        Ok(())
    }

    /// Subscribe to state changes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S::State) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }
}

impl<S: StoreDefinition> Clone for PersistedStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            persistence: self.persistence.clone(),
            _definition: PhantomData,
        }
    }
}

impl<S: StoreDefinition> std::fmt::Debug for PersistedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("id", &S::ID)
            .field("key", &self.storage_key())
            .finish()
    }
}

fn encode_state<S: StoreDefinition>(
    state: &S::State,
    options: &PersistOptions,
) -> Result<String, StoreError> {
    let serialize_err = |source| StoreError::Serialize {
        store: S::ID,
        source,
    };
    let mut value = serde_json::to_value(state).map_err(serialize_err)?;
    if let (Some(_), Value::Object(fields)) = (&options.pick, &mut value) {
        fields.retain(|name, _| options.picks(name));
    }
    serde_json::to_string(&value).map_err(serialize_err)
}

fn load_state<S: StoreDefinition>(p: &Persistence) -> Result<S::State, StoreError> {
    let text = p
        .storage
        .get_item(&p.key)
        .map_err(|source| StoreError::Storage {
            store: S::ID,
            source,
        })?;

    let Some(text) = text else {
        tracing::debug!(store = S::ID, key = %p.key, "no persisted state, using defaults");
        return Ok(S::State::default());
    };

    match merge_over_defaults::<S>(&text, &p.options) {
        Ok(state) => {
            tracing::debug!(store = S::ID, key = %p.key, "state rehydrated");
            Ok(state)
        }
        Err(reason) => {
            tracing::warn!(store = S::ID, key = %p.key, %reason, "ignoring unreadable persisted state");
            Ok(S::State::default())
        }
    }
}

/// Lay the persisted fields over the defaults so fields missing from older
/// snapshots keep their default values.
fn merge_over_defaults<S: StoreDefinition>(
    text: &str,
    options: &PersistOptions,
) -> Result<S::State, String> {
    let persisted: Map<String, Value> = match serde_json::from_str(text) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err("persisted state is not an object".to_string()),
        Err(e) => return Err(e.to_string()),
    };

    let mut merged = serde_json::to_value(S::State::default()).map_err(|e| e.to_string())?;
    if let Value::Object(fields) = &mut merged {
        for (name, value) in persisted {
            if options.picks(&name) && fields.contains_key(&name) {
                fields.insert(name, value);
            }
        }
    }
    serde_json::from_value(merged).map_err(|e| e.to_string())
}
