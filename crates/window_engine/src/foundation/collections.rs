//! Specialized collection types

use slotmap::{new_key_type, Key, SlotMap};

new_key_type! {
    /// Stable handle to a window owned by the platform
    pub struct WindowId;

    /// Stable handle to a connected monitor
    pub struct MonitorId;

    /// Stable handle to a cursor created through the platform
    pub struct CursorId;
}

/// Handle-based map that also remembers insertion order
///
/// Slot keys stay valid across removals of other entries, and iteration
/// follows the order entries were added in, so the first entry is the
/// "primary" one (primary window, primary monitor).
pub struct Registry<K: Key, V> {
    items: SlotMap<K, V>,
    order: Vec<K>,
}

impl<K: Key, V> Registry<K, V> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Append an entry
    pub fn insert(&mut self, value: V) -> K {
        let key = self.items.insert(value);
        self.order.push(key);
        key
    }

    /// Append an entry whose value needs to know its own key
    pub fn insert_with_key(&mut self, f: impl FnOnce(K) -> V) -> K {
        let key = self.items.insert_with_key(f);
        self.order.push(key);
        key
    }

    /// Insert an entry at the front, making it the primary one
    pub fn insert_front(&mut self, value: V) -> K {
        let key = self.items.insert(value);
        self.order.insert(0, key);
        key
    }

    /// Remove an entry
    pub fn remove(&mut self, key: K) -> Option<V> {
        let value = self.items.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(value)
    }

    /// Get an entry by key
    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key)
    }

    /// Get a mutable entry by key
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    /// Mutable entry plus shared access to a second, distinct one
    ///
    /// `other` equal to `key` is treated as absent.
    pub fn get_mut_with(&mut self, key: K, other: Option<K>) -> Option<(&mut V, Option<&V>)> {
        match other {
            Some(other) if other != key => {
                let [value, other] = self.items.get_disjoint_mut([key, other])?;
                Some((value, Some(&*other)))
            }
            _ => Some((self.items.get_mut(key)?, None)),
        }
    }

    /// Whether the key refers to a live entry
    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    /// Key of the first entry in insertion order
    pub fn first(&self) -> Option<K> {
        self.order.first().copied()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order.iter().filter_map(|k| self.items.get(*k).map(|v| (*k, v)))
    }

    /// Mutable entries, in no particular order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.items.values_mut()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Key, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
