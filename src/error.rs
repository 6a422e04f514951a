use thiserror::Error;

/// Route table and navigation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("duplicate route path: {0}")]
    DuplicatePath(String),

    #[error("duplicate route name: {0}")]
    DuplicateName(String),

    #[error("no route matches '{0}'")]
    NoMatch(String),

    #[error("navigation to '{to}' redirected more than {limit} times")]
    RedirectLoop { to: String, limit: usize },

    #[error("no history entry to move to")]
    HistoryExhausted,
}

/// Storage provider errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Store mutation and persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store '{store}' has no field '{field}'")]
    UnknownField { store: &'static str, field: String },

    #[error("invalid value for {store}.{field}: {reason}")]
    InvalidValue {
        store: &'static str,
        field: String,
        reason: String,
    },

    #[error("failed to serialize store '{store}': {source}")]
    Serialize {
        store: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist store '{store}': {source}")]
    Persist {
        store: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("store id '{store}' is already registered with a different state type")]
    IdConflict { store: &'static str },

    #[error("failed to load store '{store}': {source}")]
    Storage {
        store: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid config: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_lists_every_problem() {
        let err = ConfigError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid config: a, b");
    }

    #[test]
    fn router_error_converts_into_crate_error() {
        let err: Error = RouterError::NoMatch("/nowhere".into()).into();
        assert_eq!(err.to_string(), "no route matches '/nowhere'");
    }
}
