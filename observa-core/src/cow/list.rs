//! CowList Implementation
//!
//! # Thread Safety
//!
//! The list is a single `Arc<Vec<T>>` slot guarded by a mutex. Readers hold
//! the lock only long enough to clone the `Arc`. Writers hold it for the whole
//! mutation, including the clone-before-mutate step, so two writers can never
//! race on the same buffer.
//!
//! # Lock Scope
//!
//! The closure given to [`CowList::mutate`] runs with the lock held. It must
//! not call back into the same list, or it will deadlock.

use std::fmt::Debug;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// An immutable view of a [`CowList`] at a point in time.
///
/// Later mutations of the list are never visible through a snapshot.
pub struct Snapshot<T> {
    items: Arc<Vec<T>>,
}

impl<T> Snapshot<T> {
    /// Check whether two snapshots share the same underlying buffer.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.items, &other.items)
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Debug> Debug for Snapshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// A lock-guarded, reference-counted sequence with copy-on-write mutation.
///
/// # Example
///
/// ```rust
/// use observa_core::cow::CowList;
///
/// let list = CowList::new();
/// list.mutate(|items| items.push(1));
///
/// let before = list.snapshot();
/// list.mutate(|items| items.push(2));
///
/// assert_eq!(&*before, &[1]);
/// assert_eq!(&*list.snapshot(), &[1, 2]);
/// ```
pub struct CowList<T: Clone> {
    /// The current value. Only the `Arc` is guarded, never the contents.
    current: Mutex<Arc<Vec<T>>>,

    /// Number of times a mutation had to clone a shared buffer.
    copies: AtomicU64,
}

impl<T: Clone> CowList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    /// Create an empty list with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(Vec::with_capacity(capacity))
    }

    /// Take a snapshot of the current contents.
    pub fn snapshot(&self) -> Snapshot<T> {
        let items = Arc::clone(&*self.current.lock());
        Snapshot { items }
    }

    /// Apply `edit` to an exclusively owned version of the list.
    ///
    /// If any snapshot still shares the current buffer, the buffer is cloned
    /// first and the clone replaces it. The edit is visible to snapshots
    /// taken after this call returns.
    pub fn mutate<F, R>(&self, edit: F) -> R
    where
        F: FnOnce(&mut Vec<T>) -> R,
    {
        let mut current = self.current.lock();

        if Arc::strong_count(&*current) > 1 {
            let copies = self.copies.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(len = current.len(), copies, "cloning shared list before mutation");
        }

        edit(Arc::make_mut(&mut *current))
    }

    /// Swap in a whole new sequence, returning the previous contents.
    pub fn replace(&self, items: Vec<T>) -> Snapshot<T> {
        let previous = std::mem::replace(&mut *self.current.lock(), Arc::new(items));
        Snapshot { items: previous }
    }

    /// Number of elements currently in the list.
    pub fn len(&self) -> usize {
        self.current.lock().len()
    }

    /// Check whether the list is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of clone-before-mutate events so far.
    pub fn copies(&self) -> u64 {
        self.copies.load(Ordering::Relaxed)
    }
}

impl<T: Clone> From<Vec<T>> for CowList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            current: Mutex::new(Arc::new(items)),
            copies: AtomicU64::new(0),
        }
    }
}

impl<T: Clone> Default for CowList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Debug> Debug for CowList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CowList")
            .field("items", &self.snapshot())
            .field("copies", &self.copies())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
