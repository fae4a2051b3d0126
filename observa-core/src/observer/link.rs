//! Observer back-references.
//!
//! A [`SubjectLink`] is the observer's half of the subject/observer relation.
//! It holds a weak reference to the subject the observer last registered
//! with, and prunes that subject when the observer is dropped.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{ObserverId, Subject};

/// Weak back-reference from an observer to its subject.
///
/// Concrete observers embed one of these and return it from
/// [`Observer::link`](super::Observer::link).
///
/// Dropping the link (which happens when its observer is dropped) resolves
/// the back-reference. If the subject is still alive, it calls
/// [`Subject::unregister`] so the expired entry does not linger. If the
/// subject is already gone, nothing happens.
pub struct SubjectLink {
    observer: ObserverId,

    /// The subject this observer last registered with.
    /// Re-registration overwrites it.
    subject: Mutex<Weak<Subject>>,
}

impl SubjectLink {
    /// Create a detached link with a fresh observer ID.
    pub fn new() -> Self {
        Self {
            observer: ObserverId::new(),
            subject: Mutex::new(Weak::new()),
        }
    }

    /// The ID of the observer that owns this link.
    pub fn observer_id(&self) -> ObserverId {
        self.observer
    }

    /// Resolve the back-reference.
    pub fn subject(&self) -> Option<Arc<Subject>> {
        self.subject.lock().upgrade()
    }

    /// Check whether the back-reference currently resolves.
    pub fn is_attached(&self) -> bool {
        self.subject.lock().strong_count() > 0
    }

    pub(crate) fn attach(&self, subject: Weak<Subject>) {
        *self.subject.lock() = subject;
    }

    /// Clear the back-reference, but only if it still points at `subject`.
    pub(crate) fn detach_from(&self, subject: &Weak<Subject>) -> bool {
        let mut current = self.subject.lock();
        if Weak::ptr_eq(&current, subject) {
            *current = Weak::new();
            true
        } else {
            false
        }
    }
}

impl Default for SubjectLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubjectLink {
    fn drop(&mut self) {
        let subject = std::mem::take(self.subject.get_mut());

        // The owning observer's strong count is already zero here, so the
        // prune removes its entry.
        if let Some(subject) = subject.upgrade() {
            tracing::trace!(
                subject = subject.name(),
                observer = ?self.observer,
                "observer dropped, pruning subject"
            );
            subject.unregister();
        }
    }
}

impl std::fmt::Debug for SubjectLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectLink")
            .field("observer", &self.observer)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_link_is_detached() {
        let link = SubjectLink::new();
        assert!(!link.is_attached());
        assert!(link.subject().is_none());
    }

    #[test]
    fn attach_overwrites_previous_subject() {
        let first = Subject::new();
        let second = Subject::new();
        let link = SubjectLink::new();

        link.attach(Arc::downgrade(&first));
        link.attach(Arc::downgrade(&second));

        let resolved = link.subject().unwrap();
        assert!(Arc::ptr_eq(&resolved, &second));
    }

    #[test]
    fn detach_from_ignores_other_subjects() {
        let first = Subject::new();
        let second = Subject::new();
        let link = SubjectLink::new();
        link.attach(Arc::downgrade(&first));

        assert!(!link.detach_from(&Arc::downgrade(&second)));
        assert!(link.is_attached());

        assert!(link.detach_from(&Arc::downgrade(&first)));
        assert!(!link.is_attached());
    }

    #[test]
    fn link_outliving_subject_drops_quietly() {
        let subject = Subject::new();
        let link = SubjectLink::new();
        link.attach(Arc::downgrade(&subject));

        drop(subject);
        assert!(!link.is_attached());
        drop(link);
    }
}
