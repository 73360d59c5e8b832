//! Insertion-ordered map.
//!
//! The aggregated indices need two things a `HashMap` can't give together:
//! constant-time lookup and a stable "first inserted" entry. Entries live in a
//! `Vec` and a side `HashMap` maps each key to its slot.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Map that iterates in first-insertion order.
///
/// Re-inserting an existing key replaces its value in place: the entry keeps
/// its original position. There is no removal; indices are only ever cleared
/// wholesale.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
    slots: HashMap<K, usize>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            slots: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value when the key existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.slots.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.slots.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Get the value for `key`, inserting `make()` first if it is absent.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.slots.insert(key.clone(), slot);
                self.entries.push((key, make()));
                slot
            }
        };
        &mut self.entries[slot].1
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.contains_key(key)
    }

    /// The entry inserted first, if any.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entries.first().map(entry_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(entry_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = std::iter::Map<std::slice::Iter<'a, (K, V)>, fn(&'a (K, V)) -> (&'a K, &'a V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(entry_ref as fn(&'a (K, V)) -> (&'a K, &'a V))
    }
}

fn entry_ref<K, V>(entry: &(K, V)) -> (&K, &V) {
    (&entry.0, &entry.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("ring2", 2);
        map.insert("general", 0);
        map.insert("ring0", 1);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["ring2", "general", "ring0"]);
    }

    #[test]
    fn reinsert_keeps_position_and_replaces_value() {
        let mut map = OrderedMap::new();
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);
        let previous = map.insert("a".to_string(), 10);
        assert_eq!(previous, Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.first(), Some((&"a".to_string(), &10)));
        assert_eq!(map.get("a"), Some(&10));
    }

    #[test]
    fn get_or_insert_with_only_builds_once() {
        let mut map: OrderedMap<String, Vec<u8>> = OrderedMap::new();
        map.get_or_insert_with("x".into(), Vec::new).push(1);
        map.get_or_insert_with("x".into(), || panic!("already present"))
            .push(2);
        assert_eq!(map.get("x"), Some(&vec![1, 2]));
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut map = OrderedMap::new();
        map.insert(1, "one");
        map.clear();
        assert!(map.is_empty());
        assert!(!map.contains_key(&1));
        map.insert(2, "two");
        assert_eq!(map.first(), Some((&2, &"two")));
    }
}
