//! Observed Values
//!
//! An [`Observed`] value pairs a payload with a [`Subject`]. Every write goes
//! through `set` or `update`, which release the value lock before notifying,
//! so observers can read the new value from inside their `update` callback.
//!
//! # Thread Safety
//!
//! The value is protected by a `RwLock`. Observers that read it during
//! notification take a read lock; they never see a partially applied write.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Delivery, Observer, Subject};
use crate::config::SubjectConfig;
use crate::error::NotifyError;

/// A value whose writes notify a subject's observers.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use observa_core::observer::{FnObserver, Observed};
///
/// let price = Arc::new(Observed::new(10));
/// let seen = Arc::new(AtomicI32::new(0));
///
/// let observer = {
///     let price = Arc::clone(&price);
///     let seen = Arc::clone(&seen);
///     Arc::new(FnObserver::infallible(move || seen.store(price.get(), Ordering::SeqCst)))
/// };
/// price.subscribe(&observer);
///
/// price.set(42).unwrap();
/// assert_eq!(seen.load(Ordering::SeqCst), 42);
/// ```
pub struct Observed<T> {
    value: RwLock<T>,
    subject: Arc<Subject>,
}

impl<T> Observed<T> {
    /// Create an observed value with a default subject.
    pub fn new(value: T) -> Self {
        Self::with_config(value, SubjectConfig::default())
    }

    pub fn with_config(value: T, config: SubjectConfig) -> Self {
        Self {
            value: RwLock::new(value),
            subject: Subject::with_config(config),
        }
    }

    /// Read the value through a closure, without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value, then notify observers.
    pub fn set(&self, value: T) -> Result<Delivery, NotifyError> {
        *self.value.write() = value;
        self.subject.notify()
    }

    /// Edit the value in place, then notify observers.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<Delivery, NotifyError> {
        f(&mut self.value.write());
        self.subject.notify()
    }

    /// The subject that observers of this value register with.
    pub fn subject(&self) -> &Arc<Subject> {
        &self.subject
    }

    pub fn subscribe<O>(&self, observer: &Arc<O>)
    where
        O: Observer + 'static,
    {
        self.subject.subscribe(observer);
    }
}

impl<T: Clone> Observed<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Debug> Debug for Observed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observed")
            .field("value", &*self.value.read())
            .field("subject", &self.subject)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
