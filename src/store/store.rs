use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: AtomicUsize,
    entries: RwLock<Vec<(usize, Subscriber<T>)>>,
}

/// A thread-safe reactive state container.
///
/// Every mutation notifies the registered subscribers with the new state.
/// Clones share the same state.
pub struct Store<T> {
    state: Arc<RwLock<T>>,
    subscribers: Arc<Subscribers<T>>,
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(Subscribers {
                next_id: AtomicUsize::new(0),
                entries: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> T {
        self.state.read().clone()
    }

    /// Update the state using a function.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        {
            let mut state = self.state.write();
            f(&mut *state);
        }
        self.notify();
    }

    /// Update the state with a fallible function.
    ///
    /// Subscribers are only notified when `f` succeeds. `f` must leave the
    /// state untouched when it fails.
    pub fn try_update<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
    {
        {
            let mut state = self.state.write();
            f(&mut *state)?;
        }
        self.notify();
        Ok(())
    }

    /// Set a new state value.
    pub fn set(&self, new_state: T) {
        *self.state.write() = new_state;
        self.notify();
    }

    /// Subscribe to state changes.
    ///
    /// The callback is called after every mutation until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.subscribers.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.entries.write().push((id, Arc::new(callback)));

        let weak: Weak<Subscribers<T>> = Arc::downgrade(&self.subscribers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    subscribers.entries.write().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.read().len()
    }

    /// Notify all subscribers of a state change.
    ///
    /// Runs outside both locks so callbacks may read the store or
    /// unsubscribe.
    fn notify(&self) {
        let state = self.get();
        let subscribers: Vec<Subscriber<T>> = self
            .subscribers
            .entries
            .read()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(&state);
        }
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.state.read();
        f(&*state)
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

/// RAII guard for a store subscription.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the subscription alive for the lifetime of the store.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Profile {
        name: String,
        age: String,
    }

    fn profile() -> Profile {
        Profile {
            name: "test".to_string(),
            age: "1".to_string(),
        }
    }

    #[test]
    fn store_get_set() {
        let store = Store::new(profile());
        assert_eq!(store.get().name, "test");

        store.set(Profile {
            name: "updated".to_string(),
            age: "42".to_string(),
        });

        assert_eq!(store.get().name, "updated");
        assert_eq!(store.get().age, "42");
    }

    #[test]
    fn store_update() {
        let store = Store::new(profile());
        store.update(|state| state.age.push('0'));
        assert_eq!(store.get().age, "10");
    }

    #[test]
    fn store_try_update_failure_skips_notify() {
        let store = Store::new(profile());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _sub = store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let result: Result<(), &str> = store.try_update(|_| Err("nope"));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let result: Result<(), &str> = store.try_update(|s| {
            s.name = "ok".into();
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_subscribe() {
        let store = Store::new(profile());

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let sub = store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        store.update(|state| state.name.clear());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        drop(sub);
        store.update(|state| state.name.clear());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn detached_subscription_survives() {
        let store = Store::new(0u32);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        store
            .subscribe(move |v| {
                seen_clone.store(*v as usize, Ordering::SeqCst);
            })
            .detach();

        store.set(7);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn subscriber_can_read_store() {
        let store = Store::new(1u32);
        let inner = store.clone();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |_| {
            seen_clone.store(inner.get() as usize, Ordering::SeqCst);
        });
        store.set(5);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }
}
