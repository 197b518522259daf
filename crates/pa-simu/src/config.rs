//! Key/value configuration tree
//!
//! Simulators read their canned values from a shared tree of leaves
//! addressed by `/`-separated paths. The tree can be seeded from a JSON
//! document whose nested objects become path segments:
//!
//! ```json
//! { "simulation": { "modem": { "info": { "imei": "359377060000000" } } } }
//! ```
//!
//! yields the leaf `/simulation/modem/info/imei`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Root of the simulated modem subtree
pub const MODEM_ROOT: &str = "/simulation/modem";

/// Build a path below [`MODEM_ROOT`]
pub fn modem_path(suffix: &str) -> String {
    format!("{}/{}", MODEM_ROOT, suffix.trim_start_matches('/'))
}

/// Errors raised by the configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not a JSON object
    #[error("configuration root must be an object")]
    InvalidRoot,

    /// A JSON value that cannot be stored as a leaf
    #[error("unsupported value at {path}")]
    UnsupportedValue { path: String },

    /// A leaf exists but holds a different type
    #[error("{path} is not a {expected}")]
    TypeMismatch { path: String, expected: &'static str },
}

/// A leaf of the configuration tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

/// Shared handle to the configuration tree
///
/// Cloning the store clones the handle, not the tree.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    leaves: Arc<RwLock<BTreeMap<String, ConfigValue>>>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidRoot);
        };

        let mut leaves = BTreeMap::new();
        for (key, value) in map {
            flatten(&format!("/{}", key), value, &mut leaves)?;
        }
        debug!("Loaded {} configuration leaves", leaves.len());

        Ok(Self {
            leaves: Arc::new(RwLock::new(leaves)),
        })
    }

    /// Load a store from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Read a string leaf, or `default` if absent
    pub fn get_string(&self, path: &str, default: &str) -> Result<String, ConfigError> {
        match self.read().get(&normalize(path)) {
            None => Ok(default.to_string()),
            Some(ConfigValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(mismatch(path, "string")),
        }
    }

    /// Read a bool leaf, or `default` if absent
    pub fn get_bool(&self, path: &str, default: bool) -> Result<bool, ConfigError> {
        match self.read().get(&normalize(path)) {
            None => Ok(default),
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(_) => Err(mismatch(path, "bool")),
        }
    }

    /// Read an integer leaf, or `default` if absent
    pub fn get_int(&self, path: &str, default: i64) -> Result<i64, ConfigError> {
        match self.read().get(&normalize(path)) {
            None => Ok(default),
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(_) => Err(mismatch(path, "int")),
        }
    }

    /// Get the raw leaf at `path`
    pub fn get(&self, path: &str) -> Option<ConfigValue> {
        self.read().get(&normalize(path)).cloned()
    }

    /// Store a string leaf
    pub fn set_string(&self, path: &str, value: impl Into<String>) {
        self.set(path, ConfigValue::String(value.into()));
    }

    /// Store a bool leaf
    pub fn set_bool(&self, path: &str, value: bool) {
        self.set(path, ConfigValue::Bool(value));
    }

    /// Store an integer leaf
    pub fn set_int(&self, path: &str, value: i64) {
        self.set(path, ConfigValue::Int(value));
    }

    /// Store a leaf, replacing any previous value
    pub fn set(&self, path: &str, value: ConfigValue) {
        let path = normalize(path);
        debug!("Config set {} = {:?}", path, value);
        self.write().insert(path, value);
    }

    /// Remove a leaf, returning whether it existed
    pub fn remove(&self, path: &str) -> bool {
        self.write().remove(&normalize(path)).is_some()
    }

    /// Check if a leaf exists
    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(&normalize(path))
    }

    /// All leaf paths in sorted order
    pub fn paths(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ConfigValue>> {
        self.leaves.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ConfigValue>> {
        self.leaves.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn flatten(
    path: &str,
    value: Value,
    leaves: &mut BTreeMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let leaf = match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&format!("{}/{}", path, key), child, leaves)?;
            }
            return Ok(());
        }
        Value::Null => return Ok(()),
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::Int(i),
            None => ConfigValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => ConfigValue::String(s),
        Value::Array(_) => {
            return Err(ConfigError::UnsupportedValue {
                path: path.to_string(),
            })
        }
    };
    leaves.insert(normalize(path), leaf);
    Ok(())
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn mismatch(path: &str, expected: &'static str) -> ConfigError {
    ConfigError::TypeMismatch {
        path: normalize(path),
        expected,
    }
}

impl ConfigError {
    /// Check whether this is a type mismatch
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{:?}", s),
        }?;
        write!(f, " ({})", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let store = ConfigStore::new();
        assert_eq!(store.get_string("/a/b", "dflt").unwrap(), "dflt");
        assert!(store.get_bool("/a/c", true).unwrap());
        assert_eq!(store.get_int("/a/d", 42).unwrap(), 42);
    }

    #[test]
    fn test_set_and_get() {
        let store = ConfigStore::new();
        store.set_string("/info/imei", "123");
        store.set_bool("/active", true);
        store.set_int("/gnss/rate", 1000);

        assert_eq!(store.get_string("/info/imei", "").unwrap(), "123");
        assert!(store.get_bool("/active", false).unwrap());
        assert_eq!(store.get_int("/gnss/rate", 0).unwrap(), 1000);
    }

    #[test]
    fn test_paths_are_normalized() {
        let store = ConfigStore::new();
        store.set_string("info/imei/", "1");
        assert!(store.contains("/info/imei"));
        assert_eq!(store.paths(), vec!["/info/imei".to_string()]);
    }

    #[test]
    fn test_type_mismatch() {
        let store = ConfigStore::new();
        store.set_bool("/flag", true);

        let err = store.get_string("/flag", "").unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(err.to_string(), "/flag is not a string");
    }

    #[test]
    fn test_from_json_flattens_objects() {
        let store = ConfigStore::from_json_str(
            r#"{"simulation":{"modem":{"info":{"imei":"999","count":3},"active":false,"ratio":0.5,"gone":null}}}"#,
        )
        .unwrap();

        assert_eq!(store.get_string(&modem_path("info/imei"), "").unwrap(), "999");
        assert_eq!(store.get_int(&modem_path("info/count"), 0).unwrap(), 3);
        assert!(!store.get_bool(&modem_path("active"), true).unwrap());
        assert_eq!(store.get(&modem_path("ratio")), Some(ConfigValue::Float(0.5)));
        assert!(!store.contains(&modem_path("gone")));
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert!(matches!(
            ConfigStore::from_json_str("[1,2]"),
            Err(ConfigError::InvalidRoot)
        ));
        assert!(matches!(
            ConfigStore::from_json_str(r#"{"a":[1]}"#),
            Err(ConfigError::UnsupportedValue { .. })
        ));
        assert!(matches!(
            ConfigStore::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_clones_share_tree() {
        let store = ConfigStore::new();
        let other = store.clone();
        other.set_string("/x", "y");
        assert_eq!(store.get_string("/x", "").unwrap(), "y");
        assert!(store.remove("/x"));
        assert!(!other.contains("/x"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigStore::load("/nonexistent/pa-simu/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_modem_path() {
        assert_eq!(modem_path("info/imei"), "/simulation/modem/info/imei");
        assert_eq!(modem_path("/active"), "/simulation/modem/active");
    }
}
