//! Fixed-capacity ordered list with cheap insert/remove at either end.
//!
//! [`RecencyList`] is the eviction-order structure behind
//! [`crate::cache::ChunkCache`] (front = most recently used), but it is a
//! general container and usable on its own.
//!
//! ## Layout
//! Entries live in a boxed slot array addressed through a rotating base
//! offset. Logical index `i` maps to slot `(first + i) % capacity`, so the
//! live range may wrap around the end of the array.
//!
//! ## Costs
//! Inserting or removing at logical index `i` shifts the elements on
//! whichever side of `i` holds fewer of them: the front side moves by
//! rotating `first`, the back side by shifting toward the tail. A shift never
//! touches more than half of the live elements, so operations at either end
//! are O(1) and the average cost is O(min(i, len - i)).
//!
//! # Invariants
//! - `len <= capacity`; inserting into a full list fails.
//! - Slots in the logical range `[0, len)` are `Some`; all other slots are
//!   `None`.
//! - `first < capacity` whenever `capacity > 0`.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Fixed-capacity ordered list with cost-balanced shifting.
pub struct RecencyList<T> {
    slots: Box<[Option<T>]>,
    first: usize,
    len: usize,
}

impl<T> RecencyList<T> {
    /// Create an empty list holding at most `capacity` entries.
    ///
    /// A capacity of 0 is allowed; every insertion into it fails.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            first: 0,
            len: 0,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Physical slot for logical index `i`. Only valid with capacity > 0.
    #[inline]
    fn slot(&self, i: usize) -> usize {
        debug_assert!(self.capacity() > 0);
        (self.first + i) % self.capacity()
    }

    /// Entry at logical index `i`, or [`None`] when out of range.
    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            return None;
        }
        self.slots[self.slot(i)].as_ref()
    }

    /// Mutable entry at logical index `i`, or [`None`] when out of range.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        if i >= self.len {
            return None;
        }
        let s = self.slot(i);
        self.slots[s].as_mut()
    }

    /// Insert `value` at logical index `index`, shifting the cheaper side.
    ///
    /// Returns `Err(value)` when the list is already full, handing ownership
    /// back to the caller.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        assert!(
            index <= self.len,
            "insert index {index} out of range for list of length {}",
            self.len
        );
        self.len += 1;
        if index < self.len / 2 {
            // Claim the free slot before the front, then bubble it up to
            // `index`.
            self.first = (self.first + self.capacity() - 1) % self.capacity();
            for j in 0..index {
                let (a, b) = (self.slot(j), self.slot(j + 1));
                self.slots.swap(a, b);
            }
        } else {
            // The free slot sits at the tail; bubble it down to `index`.
            for j in (index + 1..self.len).rev() {
                let (a, b) = (self.slot(j), self.slot(j - 1));
                self.slots.swap(a, b);
            }
        }
        let s = self.slot(index);
        debug_assert!(self.slots[s].is_none());
        self.slots[s] = Some(value);
        Ok(())
    }

    /// Remove and return the entry at logical index `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "remove index {index} out of range for list of length {}",
            self.len
        );
        let s = self.slot(index);
        let Some(value) = self.slots[s].take() else {
            unreachable!("live slot {s} is empty");
        };
        if index < self.len / 2 {
            // Move the hole to the front, then advance the base.
            for j in (1..=index).rev() {
                let (a, b) = (self.slot(j), self.slot(j - 1));
                self.slots.swap(a, b);
            }
            self.first = (self.first + 1) % self.capacity();
        } else {
            for j in index..self.len - 1 {
                let (a, b) = (self.slot(j), self.slot(j + 1));
                self.slots.swap(a, b);
            }
        }
        self.len -= 1;
        value
    }

    /// Insert at the front (most-recent position).
    pub fn push_front(&mut self, value: T) -> Result<(), T> {
        self.insert(0, value)
    }

    /// Append at the back.
    pub fn push_back(&mut self, value: T) -> Result<(), T> {
        let len = self.len;
        self.insert(len, value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        (!self.is_empty()).then(|| self.remove_at(0))
    }

    /// Remove the back entry (least-recent position).
    pub fn pop_back(&mut self) -> Option<T> {
        (!self.is_empty()).then(|| self.remove_at(self.len - 1))
    }

    /// Append every item, or nothing if they would not all fit.
    ///
    /// On overflow the iterator is returned untouched.
    pub fn try_extend<I>(&mut self, items: I) -> Result<(), I::IntoIter>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        if self.len + items.len() > self.capacity() {
            return Err(items);
        }
        for item in items {
            // Capacity was checked up front.
            let _ = self.push_back(item);
        }
        Ok(())
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        for i in 0..self.len {
            let s = self.slot(i);
            self.slots[s] = None;
        }
        self.first = 0;
        self.len = 0;
    }

    /// Front-to-back iterator.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: 0,
            back: self.len,
        }
    }
}

impl<T: PartialEq> RecencyList<T> {
    /// Logical index of the first entry equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Remove the first entry equal to `value`, returning it.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let i = self.index_of(value)?;
        Some(self.remove_at(i))
    }
}

impl<T> Index<usize> for RecencyList<T> {
    type Output = T;

    /// # Panics
    /// Panics if `i >= len`.
    fn index(&self, i: usize) -> &T {
        let len = self.len;
        self.get(i)
            .unwrap_or_else(|| panic!("invalid index {i} for list of length {len}"))
    }
}

impl<T> IndexMut<usize> for RecencyList<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        let len = self.len;
        self.get_mut(i)
            .unwrap_or_else(|| panic!("invalid index {i} for list of length {len}"))
    }
}

impl<T: fmt::Debug> fmt::Debug for RecencyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Front-to-back iterator over a [`RecencyList`].
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front >= self.back {
            return None;
        }
        let item = self.list.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.list.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a RecencyList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
