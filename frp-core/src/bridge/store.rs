//! String-keyed persistence and persistent settings.
//!
//! A [`PersistentSetting`] is an [`Input`] that is seeded from a [`Store`]
//! when created and writes every new value back. Storage problems are
//! logged and otherwise ignored: the setting keeps working in memory, and
//! no error ever enters the signal graph.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::reactive::{Input, Output, Signal};

/// Persistence by string key.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// A store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

fn load<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

fn save<T: Serialize>(store: &dyn Store, key: &str, value: &T) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?)
}

/// An input mirrored to a [`Store`].
pub struct PersistentSetting<T> {
    key: String,
    input: Input<T>,
    _mirror: Output,
}

impl<T> PersistentSetting<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    /// Create a setting stored under `key`, starting from the stored value
    /// or `default` when there is none (or it cannot be read).
    ///
    /// The effective starting value is written back, so storage always
    /// holds what the setting currently reports.
    pub fn new(store: Rc<dyn Store>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let seeded = match load(store.as_ref(), &key) {
            Ok(Some(value)) => {
                debug!(%key, "setting restored from storage");
                value
            }
            Ok(None) => default,
            Err(err) => {
                warn!(%key, error = %err, "failed to restore setting, using default");
                default
            }
        };

        let input = Input::new(seeded);
        let mirror = {
            let key = key.clone();
            input.signal().output(move |value| {
                if let Err(err) = save(store.as_ref(), &key, value) {
                    warn!(%key, error = %err, "failed to persist setting");
                }
            })
        };

        Self {
            key,
            input,
            _mirror: mirror,
        }
    }

    /// Create a setting named `name` inside the configured namespace.
    pub fn with_config(store: Rc<dyn Store>, config: &Config, name: &str, default: T) -> Self {
        Self::new(store, config.setting_key(name), default)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> T {
        self.input.value()
    }

    /// Set and persist a new value.
    pub fn set(&self, value: T) {
        self.input.set(value);
    }

    pub fn signal(&self) -> &Signal<T> {
        self.input.signal()
    }
}

impl<T> Debug for PersistentSetting<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentSetting")
            .field("key", &self.key)
            .field("value", &self.input.value())
            .finish()
    }
}
