//! Observer types.
//!
//! An observer is anything that wants to hear about a subject's state
//! changes. Concrete observers implement the single-method [`Observer`]
//! capability; [`FnObserver`] covers the common case of a closure.

use std::sync::atomic::{AtomicU64, Ordering};

use super::SubjectLink;
use crate::error::UpdateError;

/// Unique identifier for an observer.
///
/// Each [`SubjectLink`] gets a unique ID when created. The ID shows up in log
/// fields and in notification errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Generate a new unique observer ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver of a subject's change notifications.
///
/// `update` runs synchronously on the thread that called
/// [`Subject::notify`](super::Subject::notify), outside the subject's lock.
/// It may register or drop other observers, but it must not block waiting on
/// another thread that is itself inside a list edit of the same subject.
pub trait Observer: Send + Sync {
    /// Called once per notification while the observer is alive.
    fn update(&self) -> Result<(), UpdateError>;

    /// The back-reference slot embedded in this observer.
    fn link(&self) -> &SubjectLink;

    /// The ID of this observer, taken from its link.
    fn id(&self) -> ObserverId {
        self.link().observer_id()
    }
}

/// An observer backed by a closure.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use observa_core::observer::{FnObserver, Subject};
///
/// let subject = Subject::new();
/// let observer = Arc::new(FnObserver::infallible(|| println!("changed")));
/// subject.subscribe(&observer);
///
/// assert_eq!(subject.notify().unwrap().delivered, 1);
/// ```
pub struct FnObserver {
    link: SubjectLink,

    /// Stored as a boxed trait object so any closure type fits.
    update: Box<dyn Fn() -> Result<(), UpdateError> + Send + Sync>,
}

impl FnObserver {
    /// Create an observer from a fallible callback.
    pub fn new<F>(update: F) -> Self
    where
        F: Fn() -> Result<(), UpdateError> + Send + Sync + 'static,
    {
        Self {
            link: SubjectLink::new(),
            update: Box::new(update),
        }
    }

    /// Create an observer from a callback that cannot fail.
    pub fn infallible<F>(update: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(move || {
            update();
            Ok(())
        })
    }
}

impl Observer for FnObserver {
    fn update(&self) -> Result<(), UpdateError> {
        (self.update)()
    }

    fn link(&self) -> &SubjectLink {
        &self.link
    }
}

impl std::fmt::Debug for FnObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver")
            .field("id", &self.id())
            .field("attached", &self.link.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_ids_are_unique() {
        let id1 = ObserverId::new();
        let id2 = ObserverId::new();
        let id3 = ObserverId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
        assert!(id1.raw() < id2.raw());
    }

    #[test]
    fn fn_observer_update_calls_callback() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let observer = FnObserver::infallible(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        observer.update().unwrap();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn fn_observer_returns_callback_error() {
        let observer = FnObserver::new(|| Err(UpdateError::new("nope")));
        let err = observer.update().unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn id_comes_from_link() {
        let observer = FnObserver::infallible(|| {});
        assert_eq!(observer.id(), observer.link().observer_id());
    }
}
