//! A growable, index-addressable list.
//!
//! [`Sequence`] backs JSON arrays and the parser's working stack. Unlike
//! `Vec`, every operation that may allocate reports failure through
//! [`AllocError`] instead of aborting, and leaves the sequence unchanged when
//! it does.

use alloc::vec::{self, Vec};
use core::{
    fmt,
    ops::{Index, IndexMut},
    slice,
};

use crate::error::AllocError;

/// Capacity reserved by the first allocation.
const INITIAL_CAPACITY: usize = 4;

/// An ordered, 0-indexed list with amortized O(1) append.
///
/// Capacity doubles whenever the sequence is full. Positional insertion and
/// removal shift the trailing elements and cost O(n).
///
/// # Examples
///
/// ```
/// use jsonpress::Sequence;
///
/// let mut seq = Sequence::new();
/// seq.push(1).unwrap();
/// seq.push(3).unwrap();
/// seq.insert(1, 2).unwrap();
/// assert_eq!(seq.as_slice(), &[1, 2, 3]);
/// assert_eq!(seq.remove(0), 1);
/// assert_eq!(seq.pop(), Some(3));
/// assert_eq!(seq[0], 2);
/// ```
#[derive(Clone, PartialEq)]
pub struct Sequence<T> {
    items: Vec<T>,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> {
    /// Creates an empty sequence. Nothing is allocated until the first push.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the sequence can hold before it must grow.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Makes room for one more element, doubling the capacity when full.
    fn reserve_one(&mut self) -> Result<(), AllocError> {
        if self.items.len() < self.items.capacity() {
            return Ok(());
        }
        let additional = self.items.capacity().max(INITIAL_CAPACITY);
        self.items.try_reserve_exact(additional)?;
        Ok(())
    }

    /// Appends `item` to the end.
    ///
    /// On allocation failure `item` is dropped and the sequence is unchanged.
    pub fn push(&mut self, item: T) -> Result<(), AllocError> {
        self.reserve_one()?;
        self.items.push(item);
        Ok(())
    }

    /// Removes and returns the last element, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Inserts `item` at `index`, shifting every element at or after it one
    /// place to the right.
    ///
    /// Capacity is secured before anything moves, so on allocation failure
    /// the sequence is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), AllocError> {
        let len = self.items.len();
        assert!(
            index <= len,
            "insertion index {index} out of range for sequence of length {len}"
        );
        self.reserve_one()?;
        self.items.insert(index, item);
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting everything after
    /// it one place to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.items.len();
        assert!(
            index < len,
            "removal index {index} out of range for sequence of length {len}"
        );
        self.items.remove(index)
    }

    /// Returns the element at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Mutable reference to the last element, if any.
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    /// Drops every element. The capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterates over mutable references to the elements in order.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T> Index<usize> for Sequence<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= len`.
    fn index(&self, index: usize) -> &T {
        let len = self.items.len();
        match self.items.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for sequence of length {len}"),
        }
    }
}

impl<T> IndexMut<usize> for Sequence<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for sequence of length {len}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Sequence<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}
