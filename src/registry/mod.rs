//! Concurrent call-site redirection table.
//!
//! This module provides the [`StubRegistry`], the map from a call-site [`StubKey`] to the
//! [`StubPointer`] of its replacement implementation. Rewritten call sites consult it on every
//! invocation, and the instrumentation layer mutates it while tests install and remove stubs, so
//! every operation has to be safe under arbitrary concurrent use.
//!
//! # Key Components
//!
//! - [`StubRegistry`] - The table itself
//! - [`StubKey`] - UTF-16 call-site key, compared code unit by code unit
//! - [`StubPointer`] - Opaque, pointer-sized replacement address
//! - [`RegistryConfig`] - Sizing for a registry instance
//!
//! # Thread Safety
//!
//! The table is a sharded [`DashMap`]. Every operation touches a single shard under its lock,
//! so for any one key:
//! - concurrent [`StubRegistry::try_add`] calls have exactly one winner
//! - concurrent [`StubRegistry::try_remove`] calls have exactly one winner
//! - readers observe either the old or the new pointer, never a partial value
//!
//! [`StubRegistry::clear`] empties shard by shard. Each key individually goes from its pre-clear
//! state to empty atomically; a writer racing with `clear` is ordered either before it (and
//! cleared) or after it (and kept).
//!
//! None of the operations log, allocate on lookup, or report errors. Absence and presence come
//! back through the return value.
//!
//! # Examples
//!
//! ```rust
//! use stubgate::{StubKey, StubPointer, StubRegistry};
//!
//! let registry = StubRegistry::new();
//! let key = StubKey::new("Foo.Bar.get_Baz");
//!
//! assert!(registry.try_add(&key, StubPointer::new(0xDEAD_0000)));
//! assert!(!registry.try_add(&key, StubPointer::new(0xBEEF_0000)));
//! assert_eq!(registry.try_get(&key), Some(StubPointer::new(0xDEAD_0000)));
//! ```

mod key;
mod pointer;

pub use key::StubKey;
pub use pointer::StubPointer;

use dashmap::{mapref::entry::Entry, DashMap};
use widestring::U16Str;

use crate::Result;

/// Sizing parameters for a [`StubRegistry`].
///
/// The defaults suit the process-wide registry; a test suite that installs thousands of stubs
/// can pre-size its table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Number of entries to allocate room for up front
    pub initial_capacity: usize,
    /// Number of shards, `None` lets `dashmap` pick based on the CPU count.
    /// Must be a power of two greater than one.
    pub shard_amount: Option<usize>,
}

impl RegistryConfig {
    /// Checks the configuration without building a registry.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidConfig`] if `shard_amount` is not a power of two greater
    /// than one.
    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards < 2 {
                return Err(invalid_config!(
                    "shard amount must be greater than one, got {}",
                    shards
                ));
            }
            if !shards.is_power_of_two() {
                return Err(invalid_config!(
                    "shard amount must be a power of two, got {}",
                    shards
                ));
            }
        }

        Ok(())
    }
}

/// Concurrent map from call-site key to replacement pointer.
///
/// See the [module documentation](self) for the concurrency contract.
pub struct StubRegistry {
    entries: DashMap<StubKey, StubPointer>,
}

impl StubRegistry {
    /// Creates an empty registry with default sizing
    #[must_use]
    pub fn new() -> Self {
        StubRegistry {
            entries: DashMap::new(),
        }
    }

    /// Creates an empty registry sized by `config`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidConfig`] if the configuration is rejected by
    /// [`RegistryConfig::validate`].
    pub fn with_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;

        let entries = match config.shard_amount {
            Some(shards) => DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards),
            None => DashMap::with_capacity(config.initial_capacity),
        };

        Ok(StubRegistry { entries })
    }

    /// Registers `pointer` for `key` unless the key is already taken.
    ///
    /// Returns `true` if the entry was inserted. Returns `false` if `key` is present; the existing
    /// entry is left untouched. Among concurrent calls for the same key exactly one returns
    /// `true`.
    pub fn try_add(&self, key: &U16Str, pointer: StubPointer) -> bool {
        match self.entries.entry(StubKey::from_wide(key)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(pointer);
                true
            }
        }
    }

    /// Looks up the pointer registered for `key`.
    pub fn try_get(&self, key: &U16Str) -> Option<StubPointer> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    /// Removes the entry for `key`, returning the pointer it held.
    ///
    /// Among concurrent calls for the same key exactly one gets `Some`.
    pub fn try_remove(&self, key: &U16Str) -> Option<StubPointer> {
        self.entries.remove(key).map(|(_, pointer)| pointer)
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns true if `key` has an entry
    pub fn contains_key(&self, key: &U16Str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    ///
    /// Under concurrent mutation this is a point-in-time estimate.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies out the currently registered keys, in no particular order
    pub fn keys(&self) -> Vec<StubKey> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for StubRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use widestring::u16str;

    use super::*;
    use crate::Error;

    #[test]
    fn add_then_add_again_keeps_first() {
        let registry = StubRegistry::new();
        let key = u16str!("Foo.Bar.get_Baz");

        assert!(registry.try_add(key, StubPointer::new(0xDEAD_0000)));
        assert!(!registry.try_add(key, StubPointer::new(0xBEEF_0000)));
        assert_eq!(registry.try_get(key), Some(StubPointer::new(0xDEAD_0000)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn add_get_remove_get() {
        let registry = StubRegistry::new();
        let key = StubKey::new("System.IO.File.ReadAllText");
        let pointer = StubPointer::new(0x7FF0_1234);

        assert!(registry.try_add(&key, pointer));
        assert_eq!(registry.try_get(&key), Some(pointer));
        assert_eq!(registry.try_remove(&key), Some(pointer));
        assert_eq!(registry.try_get(&key), None);
        assert_eq!(registry.try_remove(&key), None);
    }

    #[test]
    fn remove_frees_key_for_new_add() {
        let registry = StubRegistry::new();
        let key = u16str!("K");

        assert!(registry.try_add(key, StubPointer::new(1)));
        assert_eq!(registry.try_remove(key), Some(StubPointer::new(1)));
        assert!(registry.try_add(key, StubPointer::new(2)));
        assert_eq!(registry.try_get(key), Some(StubPointer::new(2)));
    }

    #[test]
    fn null_pointer_is_stored_like_any_other() {
        let registry = StubRegistry::new();
        let key = u16str!("Null.Target");

        assert!(registry.try_add(key, StubPointer::NULL));
        assert_eq!(registry.try_get(key), Some(StubPointer::NULL));
        assert!(!registry.try_add(key, StubPointer::new(5)));
    }

    #[test]
    fn clear_twice() {
        let registry = StubRegistry::new();
        for i in 0..32 {
            let key = StubKey::new(&format!("Type{i}.Method"));
            assert!(registry.try_add(&key, StubPointer::new(0x1000 + i)));
        }
        assert_eq!(registry.len(), 32);

        registry.clear();
        assert!(registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());

        for i in 0..32 {
            let key = StubKey::new(&format!("Type{i}.Method"));
            assert_eq!(registry.try_get(&key), None);
        }
    }

    #[test]
    fn keys_snapshot() {
        let registry = StubRegistry::new();
        registry.try_add(u16str!("B"), StubPointer::new(2));
        registry.try_add(u16str!("A"), StubPointer::new(1));

        let mut keys = registry.keys();
        keys.sort();
        assert_eq!(keys, vec![StubKey::new("A"), StubKey::new("B")]);
        assert!(registry.contains_key(u16str!("A")));
        assert!(!registry.contains_key(u16str!("C")));
    }

    #[test]
    fn config_shards() {
        let registry = StubRegistry::with_config(&RegistryConfig {
            initial_capacity: 128,
            shard_amount: Some(8),
        })
        .unwrap();
        assert!(registry.try_add(u16str!("K"), StubPointer::new(1)));

        assert!(StubRegistry::with_config(&RegistryConfig::default()).is_ok());
    }

    #[test]
    fn config_rejects_bad_shards() {
        for shards in [0, 1, 3, 12] {
            let config = RegistryConfig {
                initial_capacity: 0,
                shard_amount: Some(shards),
            };
            match StubRegistry::with_config(&config) {
                Err(Error::InvalidConfig { message, .. }) => {
                    assert!(message.contains(&shards.to_string()))
                }
                Err(other) => panic!("unexpected error: {other:?}"),
                Ok(_) => panic!("shard amount {shards} should have been rejected"),
            }
        }
    }
}
