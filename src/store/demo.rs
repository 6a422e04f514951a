use serde::{Deserialize, Serialize};

use crate::persist::StoreDefinition;

/// State of the `demo` store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoState {
    pub name: String,
    pub age: String,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            name: "张三".to_string(),
            age: "18".to_string(),
        }
    }
}

/// The `demo` store: a persisted name and age.
pub struct DemoStore;

impl StoreDefinition for DemoStore {
    const ID: &'static str = "demo";
    type State = DemoState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = DemoState::default();
        assert_eq!(state.name, "张三");
        assert_eq!(state.age, "18");
    }

    #[test]
    fn persisted_under_store_id() {
        assert_eq!(DemoStore::ID, "demo");
        assert!(DemoStore::persist().is_some());
    }
}
