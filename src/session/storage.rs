//! Per-session namespaced key-value storage.
//!
//! Each session carries one [`SessionStorage`] so plugins can keep
//! session-scoped state without sharing a namespace. Slots are addressed
//! by a normalized [`StorageKey`]: string names collapse to one canonical
//! form, and plugin types declare a stable slot name through
//! [`PluginKey`], so every instance of a plugin addresses the same slot.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Canonical slot name inside a session's storage.
///
/// Normalization is pure and deterministic: the same name (or the same
/// plugin type) always maps to the same slot, regardless of which
/// instance or string representation produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(Cow<'static, str>);

impl StorageKey {
    /// Slot for an explicit name.
    pub fn name(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Slot for a plugin type, independent of any instance.
    pub fn plugin<T: PluginKey + ?Sized>() -> Self {
        Self(Cow::Borrowed(T::KEY))
    }

    /// View the canonical name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageKey {
    fn from(name: &str) -> Self {
        StorageKey::name(name)
    }
}

impl From<String> for StorageKey {
    fn from(name: String) -> Self {
        StorageKey::name(name)
    }
}

/// Declares the storage slot a plugin type owns.
///
/// Plugins supply the identifier explicitly at declaration time; no
/// runtime type introspection is involved. Because the key is a
/// type-level constant, two distinct instances of the same plugin
/// address the same slot — keying is by plugin kind, not identity.
///
/// ```
/// use mask_auth::{PluginKey, StorageKey};
///
/// struct GreeterPlugin;
///
/// impl PluginKey for GreeterPlugin {
///     const KEY: &'static str = "greeter";
/// }
///
/// assert_eq!(StorageKey::from(&GreeterPlugin), StorageKey::name("greeter"));
/// ```
pub trait PluginKey {
    /// Slot name shared by every instance of this plugin type.
    const KEY: &'static str;
}

impl<T: PluginKey> From<&T> for StorageKey {
    fn from(_: &T) -> Self {
        StorageKey::plugin::<T>()
    }
}

/// Session-scoped key-value area, one per session.
///
/// Values are heterogeneous; readers state the type they expect and a
/// mismatch reads as absence, not an error. There is no capacity bound
/// and no TTL — entries live exactly as long as the owning session.
#[derive(Default)]
pub struct SessionStorage {
    slots: HashMap<StorageKey, Box<dyn Any + Send + Sync>>,
}

/// Values are opaque `dyn Any`, so debug output lists slot names only.
impl fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStorage")
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SessionStorage {
    /// Create a new empty storage area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under the key's normalized form.
    ///
    /// Returns `None` if the slot was never set, or if it holds a value
    /// of a different type than `V`.
    pub fn get<V, K>(&self, key: K) -> Option<&V>
    where
        V: 'static,
        K: Into<StorageKey>,
    {
        self.slots.get(&key.into()).and_then(|v| v.downcast_ref())
    }

    /// Store a value under the key's normalized form, silently
    /// overwriting any previous value in the slot.
    pub fn set<V, K>(&mut self, key: K, value: V)
    where
        V: Any + Send + Sync,
        K: Into<StorageKey>,
    {
        self.slots.insert(key.into(), Box::new(value));
    }

    /// Remove a slot, returning the raw value if one was present.
    pub fn remove(&mut self, key: impl Into<StorageKey>) -> Option<Box<dyn Any + Send + Sync>> {
        self.slots.remove(&key.into())
    }

    /// Check whether a slot is occupied, regardless of value type.
    pub fn contains(&self, key: impl Into<StorageKey>) -> bool {
        self.slots.contains_key(&key.into())
    }

    /// Read-only view of the entire mapping, for host introspection.
    pub fn all(&self) -> &HashMap<StorageKey, Box<dyn Any + Send + Sync>> {
        &self.slots
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
