//! An open-addressing map from byte-string keys to values.
//!
//! [`Map`] backs JSON objects. All entries live directly in one slot table;
//! a key's home slot is its hash modulo the table capacity and collisions are
//! resolved by probing forward, one slot at a time, up to the end of the
//! table. Probing never wraps around to slot 0: when no free slot remains
//! between the home slot and the end, the table grows instead.
//!
//! Iteration order is unspecified. It follows slot order, so it is stable for
//! a given insertion history but unrelated to insertion order.

use alloc::vec::{self, Vec};
use core::{fmt, iter, mem, ops::Index, slice};

use bstr::{BStr, BString, ByteSlice};

use crate::error::AllocError;

/// Slot count of the first table.
const INITIAL_CAPACITY: usize = 8;

/// Growth is refused once the table would exceed this many slots per entry.
const MAX_SLOTS_PER_ENTRY: usize = 64;

const HASH_SEED: u64 = 5381;

/// `djb3`: `h = h * 33 ^ byte`, seeded with 5381.
fn djb3(key: &[u8]) -> u64 {
    key.iter()
        .fold(HASH_SEED, |hash, &byte| hash.wrapping_mul(33) ^ u64::from(byte))
}

#[allow(clippy::cast_possible_truncation)]
fn home_slot(hash: u64, capacity: usize) -> usize {
    // The remainder is below `capacity`, so it fits in a usize.
    (hash % capacity as u64) as usize
}

#[derive(Clone)]
struct Slot<V> {
    hash: u64,
    key: BString,
    value: V,
}

/// A map from byte-string keys to `V` using open addressing with forward-only
/// linear probing.
///
/// Keys are copied into the map on insertion. Lookups accept anything that
/// views as bytes: `&str`, `&[u8]`, `BString`, and so on.
///
/// # Examples
///
/// ```
/// use jsonpress::Map;
///
/// let mut map = Map::new();
/// assert_eq!(map.set("a", 1).unwrap(), None);
/// assert_eq!(map.set("a", 2).unwrap(), Some(1));
/// assert!(map.contains_key("a"));
/// assert_eq!(map["a"], 2);
/// assert_eq!(map.remove("a"), Some(2));
/// assert!(map.is_empty());
/// ```
#[derive(Clone)]
pub struct Map<V> {
    slots: Vec<Option<Slot<V>>>,
    len: usize,
    /// Longest distance between an entry's home slot and its actual slot.
    /// Lookups never scan further than this, and removals never shrink it.
    max_probe: usize,
}

impl<V> Default for Map<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Map<V> {
    /// Creates an empty map. Nothing is allocated until the first insertion.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            max_probe: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find(&self, hash: u64, key: &[u8]) -> Option<usize> {
        let last = self.slots.len().checked_sub(1)?;
        let start = home_slot(hash, self.slots.len());
        let end = start.saturating_add(self.max_probe).min(last);
        (start..=end).find(|&i| {
            matches!(&self.slots[i], Some(slot) if slot.hash == hash && slot.key.as_slice() == key)
        })
    }

    fn free_slot(&self, hash: u64) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let start = home_slot(hash, self.slots.len());
        (start..self.slots.len()).find(|&i| self.slots[i].is_none())
    }

    /// Inserts `value` under `key`, replacing and returning any previous
    /// value for an equal key.
    ///
    /// When the probe sequence for a new key runs off the end of the table,
    /// the table grows and every entry is rehashed. If that allocation fails
    /// the map is left exactly as it was and `key` and `value` are dropped.
    pub fn set(&mut self, key: impl Into<BString>, value: V) -> Result<Option<V>, AllocError> {
        let key = key.into();
        let hash = djb3(&key);
        if let Some(slot) = self.find(hash, &key).and_then(|i| self.slots[i].as_mut()) {
            return Ok(Some(mem::replace(&mut slot.value, value)));
        }

        let index = match self.free_slot(hash) {
            Some(index) => index,
            None => {
                self.grow(hash)?;
                self.free_slot(hash).ok_or(AllocError::CapacityLimit)?
            }
        };
        let displacement = index - home_slot(hash, self.slots.len());
        self.max_probe = self.max_probe.max(displacement);
        self.slots[index] = Some(Slot { hash, key, value });
        self.len += 1;
        Ok(None)
    }

    /// Computes where every current entry lands in a table of `capacity`
    /// slots, making sure a key hashing to `pending` still has room.
    ///
    /// Returns `Ok(None)` when some probe sequence would run off the end.
    fn plan(&self, capacity: usize, pending: u64) -> Result<Option<Vec<usize>>, AllocError> {
        let mut taken = Vec::new();
        taken.try_reserve_exact(capacity)?;
        taken.resize(capacity, false);
        let mut targets = Vec::new();
        targets.try_reserve_exact(self.len)?;

        let hashes = self.slots.iter().flatten().map(|slot| slot.hash);
        for (n, hash) in hashes.chain(iter::once(pending)).enumerate() {
            let start = home_slot(hash, capacity);
            let Some(target) = (start..capacity).find(|&i| !taken[i]) else {
                return Ok(None);
            };
            taken[target] = true;
            if n < self.len {
                targets.push(target);
            }
        }
        Ok(Some(targets))
    }

    /// Doubles the table until every entry, plus a new key hashing to
    /// `pending`, can be placed, then moves the entries over.
    fn grow(&mut self, pending: u64) -> Result<(), AllocError> {
        let current = self.slots.len();
        let ceiling = (self.len + 1)
            .max(INITIAL_CAPACITY)
            .saturating_mul(MAX_SLOTS_PER_ENTRY)
            .max(current.saturating_mul(2));
        let mut capacity = current.saturating_mul(2).max(INITIAL_CAPACITY);
        let targets = loop {
            if let Some(targets) = self.plan(capacity, pending)? {
                break targets;
            }
            capacity = capacity.saturating_mul(2);
            if capacity > ceiling {
                return Err(AllocError::CapacityLimit);
            }
        };

        let mut table = Vec::new();
        table.try_reserve_exact(capacity)?;
        table.resize_with(capacity, || None);

        // Nothing below can fail, so the map never ends up half-moved.
        let old = mem::replace(&mut self.slots, table);
        self.max_probe = 0;
        for (slot, target) in old.into_iter().flatten().zip(targets) {
            let displacement = target - home_slot(slot.hash, capacity);
            self.max_probe = self.max_probe.max(displacement);
            self.slots[target] = Some(slot);
        }
        Ok(())
    }

    /// Removes the entry for `key` and returns its value. Absent keys are a
    /// no-op.
    pub fn remove<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Option<V> {
        let key = key.as_ref();
        let index = self.find(djb3(key), key)?;
        let slot = self.slots[index].take()?;
        self.len -= 1;
        Some(slot.value)
    }

    /// Whether an entry exists for `key`.
    pub fn contains_key<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        let key = key.as_ref();
        self.find(djb3(key), key).is_some()
    }

    /// The value stored under `key`, if any.
    pub fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<&V> {
        let key = key.as_ref();
        let index = self.find(djb3(key), key)?;
        self.slots[index].as_ref().map(|slot| &slot.value)
    }

    /// Mutable reference to the value stored under `key`, if any.
    pub fn get_mut<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Option<&mut V> {
        let key = key.as_ref();
        let index = self.find(djb3(key), key)?;
        self.slots[index].as_mut().map(|slot| &mut slot.value)
    }

    /// Drops every entry. The table keeps its capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
        self.max_probe = 0;
    }

    /// Iterates over `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Iterates over `(key, value)` pairs with mutable values, in unspecified
    /// order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.len,
        }
    }

    /// Iterates over the keys in unspecified order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &BStr> {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over the values in unspecified order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<V, K: AsRef<[u8]> + ?Sized> Index<&K> for Map<V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the map holds no entry for `key`.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry for key {:?}", BStr::new(key.as_ref())),
        }
    }
}

impl<V: PartialEq> PartialEq for Map<V> {
    /// Maps are equal when they hold the same set of entries, regardless of
    /// table layout.
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl<V: fmt::Debug> fmt::Debug for Map<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`Map`], created by [`Map::iter`].
#[derive(Debug)]
pub struct Iter<'a, V> {
    slots: slice::Iter<'a, Option<Slot<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a BStr, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key.as_bstr(), &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Iterator over a [`Map`] with mutable values, created by [`Map::iter_mut`].
#[derive(Debug)]
pub struct IterMut<'a, V> {
    slots: slice::IterMut<'a, Option<Slot<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a BStr, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let Slot { key, value, .. } = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        let key: &'a BString = key;
        Some((key.as_bstr(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

/// Owning iterator over a [`Map`].
#[derive(Debug)]
pub struct IntoIter<V> {
    slots: vec::IntoIter<Option<Slot<V>>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (BString, V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key, slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> IntoIterator for Map<V> {
    type Item = (BString, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_iter(),
            remaining: self.len,
        }
    }
}

impl<'a, V> IntoIterator for &'a Map<V> {
    type Item = (&'a BStr, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V> IntoIterator for &'a mut Map<V> {
    type Item = (&'a BStr, &'a mut V);
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<V: fmt::Debug> fmt::Debug for Slot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("hash", &self.hash)
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{collections::BTreeMap, format, string::String, vec::Vec};

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::{INITIAL_CAPACITY, Map, djb3, home_slot};

    /// Generates `count` distinct keys whose home slot in a table of
    /// `capacity` slots is `slot`.
    fn keys_homed_at(slot: usize, capacity: usize, count: usize) -> Vec<String> {
        (0..)
            .map(|i| format!("key-{i}"))
            .filter(|key| home_slot(djb3(key.as_bytes()), capacity) == slot)
            .take(count)
            .collect()
    }

    #[test]
    fn hash_matches_reference_values() {
        assert_eq!(djb3(b""), 5381);
        assert_eq!(djb3(b"a"), (5381 * 33) ^ 97);
        assert_eq!(djb3(b"ab"), (((5381 * 33) ^ 97) * 33) ^ 98);
    }

    #[test]
    fn set_get_replace_remove() {
        let mut map = Map::new();
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.set("one", 1).unwrap(), None);
        assert_eq!(map.set("two", 2).unwrap(), None);
        assert_eq!(map.capacity(), INITIAL_CAPACITY);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("one"), Some(&1));
        assert_eq!(map.set("one", 11).unwrap(), Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.remove("one"), Some(11));
        assert_eq!(map.remove("one"), None);
        assert!(!map.contains_key("one"));
        assert_eq!(map.get("two"), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn lookups_on_empty_map() {
        let mut map: Map<u8> = Map::new();
        assert!(!map.contains_key("missing"));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.remove("missing"), None);
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn colliding_home_slots_are_probed_forward() {
        let keys = keys_homed_at(2, INITIAL_CAPACITY, 3);
        let mut map = Map::new();
        for (i, key) in keys.iter().enumerate() {
            map.set(key.as_str(), i).unwrap();
        }
        assert_eq!(map.capacity(), INITIAL_CAPACITY);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(map.get(key.as_str()), Some(&i));
        }
    }

    #[test]
    fn removal_does_not_hide_displaced_entries() {
        let keys = keys_homed_at(4, INITIAL_CAPACITY, 3);
        let mut map = Map::new();
        for key in &keys {
            map.set(key.as_str(), key.clone()).unwrap();
        }
        assert_eq!(map.remove(keys[0].as_str()), Some(keys[0].clone()));
        assert_eq!(map.get(keys[1].as_str()), Some(&keys[1]));
        assert_eq!(map.get(keys[2].as_str()), Some(&keys[2]));

        // The freed slot is reused rather than growing the table.
        map.set(keys[0].as_str(), String::new()).unwrap();
        assert_eq!(map.capacity(), INITIAL_CAPACITY);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn probing_off_the_end_grows_instead_of_wrapping() {
        let keys = keys_homed_at(INITIAL_CAPACITY - 1, INITIAL_CAPACITY, 2);
        let mut map = Map::new();
        map.set(keys[0].as_str(), 0).unwrap();
        assert_eq!(map.capacity(), INITIAL_CAPACITY);
        map.set(keys[1].as_str(), 1).unwrap();
        assert!(map.capacity() > INITIAL_CAPACITY);
        assert_eq!(map.get(keys[0].as_str()), Some(&0));
        assert_eq!(map.get(keys[1].as_str()), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn many_keys_survive_growth() {
        const COUNT: usize = 0x2000;
        let mut map = Map::new();
        for i in 0..COUNT {
            assert_eq!(map.len(), i);
            map.set(format!("{i:07}"), i).unwrap();
        }
        for i in 0..COUNT {
            assert_eq!(map.remove(format!("{i:07}").as_str()), Some(i));
        }
        assert!(map.is_empty());
    }

    #[test]
    fn clear_keeps_table() {
        let mut map = Map::new();
        for i in 0..20 {
            map.set(format!("{i}"), i).unwrap();
        }
        let capacity = map.capacity();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert!(!map.contains_key("3"));
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut map = Map::new();
        for i in 0..10 {
            map.set(format!("{i}"), i).unwrap();
        }
        for (_, value) in map.iter_mut() {
            *value *= 10;
        }
        let mut values: Vec<_> = map.values().copied().collect();
        values.sort_unstable();
        assert_eq!(values, (0..10).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(map.iter().len(), 10);
    }

    #[test]
    fn equality_ignores_layout() {
        let mut a = Map::new();
        let mut b = Map::new();
        for i in 0..50 {
            a.set(format!("{i}"), i).unwrap();
        }
        for i in (0..50).rev() {
            b.set(format!("{i}"), i).unwrap();
        }
        for i in 50..200 {
            b.set(format!("{i}"), i).unwrap();
        }
        for i in 50..200 {
            b.remove(format!("{i}").as_str());
        }
        assert_ne!(a.capacity(), b.capacity());
        assert_eq!(a, b);
        b.set("0", 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "no entry for key \"absent\"")]
    fn index_missing_key_panics() {
        let map: Map<u8> = Map::new();
        let _ = map["absent"];
    }

    #[derive(Clone, Debug)]
    enum Op {
        Set(u8, u32),
        Remove(u8),
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            // A small key space keeps overwrites and removals of live keys common.
            let key = u8::arbitrary(g) % 32;
            if bool::arbitrary(g) {
                Op::Set(key, u32::arbitrary(g))
            } else {
                Op::Remove(key)
            }
        }
    }

    #[quickcheck]
    fn behaves_like_btree_map(ops: Vec<Op>) -> bool {
        let mut map = Map::new();
        let mut model = BTreeMap::new();
        for op in ops {
            match op {
                Op::Set(k, v) => {
                    let key = format!("k{k}");
                    if map.set(key.as_str(), v).unwrap() != model.insert(key.clone(), v) {
                        return false;
                    }
                    if !map.contains_key(key.as_str()) || map.get(key.as_str()) != Some(&v) {
                        return false;
                    }
                }
                Op::Remove(k) => {
                    let key = format!("k{k}");
                    if map.remove(key.as_str()) != model.remove(&key) {
                        return false;
                    }
                    if map.contains_key(key.as_str()) {
                        return false;
                    }
                }
            }
            if map.len() != model.len() {
                return false;
            }
        }
        model
            .iter()
            .all(|(key, value)| map.get(key.as_str()) == Some(value))
    }
}
