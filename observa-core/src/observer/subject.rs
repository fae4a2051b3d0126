//! Subject Implementation
//!
//! A subject holds the observer list and drives notification.
//!
//! # How Subjects Work
//!
//! 1. `register` appends a weak reference to the list, then (outside the
//!    lock) points the observer's back-reference at this subject.
//!
//! 2. `notify` snapshots the list and calls `update` on each observer that
//!    still resolves. Expired entries are skipped, not removed.
//!
//! 3. `unregister` prunes every expired entry. Observers call it from their
//!    drop path, so stale entries are reaped as observers go away.
//!
//! # Memory Layout
//!
//! The subject never holds a strong reference to an observer, and observers
//! only hold weak references back. There are no reference cycles, and either
//! side may be dropped first.

use std::sync::{Arc, Weak};

use serde::Serialize;
use smallvec::SmallVec;

use super::{Observer, ObserverId};
use crate::config::{DeliveryPolicy, SubjectConfig};
use crate::cow::{CowList, Snapshot};
use crate::error::{DeliveryFailure, NotifyError};

type ObserverList = Vec<Weak<dyn Observer>>;

/// Outcome of a successful [`Subject::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Observers whose `update` ran and returned `Ok`.
    pub delivered: usize,

    /// Snapshot entries that no longer resolved and were skipped.
    pub expired: usize,
}

/// Point-in-time counters for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectStats {
    pub name: Option<String>,

    /// Entries in the list, expired ones included.
    pub entries: usize,

    /// Entries that still resolve to a live observer.
    pub live: usize,

    /// Clone-before-mutate events on the list so far.
    pub copies: u64,
}

/// The observable side of the relation.
///
/// Subjects are always handed out as `Arc<Subject>` so observers can hold a
/// weak back-reference to them.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use observa_core::observer::{FnObserver, Subject};
///
/// let subject = Subject::new();
/// let a = Arc::new(FnObserver::infallible(|| {}));
/// let b = Arc::new(FnObserver::infallible(|| {}));
/// subject.subscribe(&a);
/// subject.subscribe(&b);
///
/// drop(b);
/// let delivery = subject.notify().unwrap();
/// assert_eq!(delivery.delivered, 1);
/// assert_eq!(subject.len(), 1);
/// ```
pub struct Subject {
    /// Weak handle to ourselves, handed to observers on `register`.
    this: Weak<Subject>,

    /// Weak references to registered observers, in registration order.
    observers: CowList<Weak<dyn Observer>>,

    config: SubjectConfig,
}

impl Subject {
    /// Create an empty subject with default configuration.
    pub fn new() -> Arc<Self> {
        Self::with_config(SubjectConfig::default())
    }

    /// Create an empty subject with the given configuration.
    pub fn with_config(config: SubjectConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            observers: CowList::with_capacity(config.initial_capacity),
            config,
        })
    }

    /// The configured name, or `"subject"` if none was set.
    pub fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or("subject")
    }

    pub fn config(&self) -> &SubjectConfig {
        &self.config
    }

    /// Register an observer.
    ///
    /// The entry is appended under the list lock. Afterwards, if the observer
    /// is still alive, its back-reference is pointed at this subject. If it
    /// expired in between, the entry stays until the next prune.
    pub fn register(&self, observer: Weak<dyn Observer>) {
        let prune = self.config.prune_on_register;
        let (entries, pruned) = self.observers.mutate(|list| {
            let pruned = if prune { prune_expired(list) } else { 0 };
            list.push(observer.clone());
            (list.len(), pruned)
        });

        match observer.upgrade() {
            Some(observer) => {
                tracing::trace!(
                    subject = self.name(),
                    observer = ?observer.id(),
                    entries,
                    pruned,
                    "observer registered"
                );
                observer.link().attach(self.this.clone());
            }
            None => {
                tracing::trace!(subject = self.name(), entries, "registered observer already expired");
            }
        }
    }

    /// Register an observer held in an `Arc`.
    pub fn subscribe<O>(&self, observer: &Arc<O>)
    where
        O: Observer + 'static,
    {
        let observer = Arc::downgrade(observer) as Weak<dyn Observer>;
        self.register(observer);
    }

    /// Remove every expired entry from the list.
    ///
    /// Live entries are never removed. Returns the number of entries pruned,
    /// so a repeated call with no intervening drops returns 0.
    pub fn unregister(&self) -> usize {
        let pruned = self.observers.mutate(prune_expired);
        if pruned > 0 {
            tracing::debug!(subject = self.name(), pruned, "pruned expired observers");
        }
        pruned
    }

    /// Remove one specific observer by identity.
    ///
    /// If the observer is alive and its back-reference points here, the
    /// back-reference is cleared too. Returns whether an entry was removed.
    pub fn detach(&self, observer: &Weak<dyn Observer>) -> bool {
        if !self.snapshot().iter().any(|entry| Weak::ptr_eq(entry, observer)) {
            return false;
        }

        let removed = self.observers.mutate(|list| {
            let before = list.len();
            list.retain(|entry| !Weak::ptr_eq(entry, observer));
            before - list.len()
        });

        if let Some(observer) = observer.upgrade() {
            observer.link().detach_from(&self.this);
            tracing::trace!(subject = self.name(), observer = ?observer.id(), removed, "observer detached");
        }

        removed > 0
    }

    /// Notify every live observer, in list order, on the calling thread.
    ///
    /// The list is snapshotted first, so registrations and prunes running
    /// concurrently do not affect this call. Failures are handled according
    /// to the configured [`DeliveryPolicy`]. A panic inside `update` is not
    /// caught and unwinds to the caller.
    pub fn notify(&self) -> Result<Delivery, NotifyError> {
        let snapshot = self.snapshot();
        let mut delivery = Delivery::default();
        let mut failures: SmallVec<[DeliveryFailure; 2]> = SmallVec::new();

        for entry in &snapshot {
            let Some(observer) = entry.upgrade() else {
                delivery.expired += 1;
                continue;
            };

            if let Err(source) = observer.update() {
                let id = observer.id();
                tracing::warn!(
                    subject = self.name(),
                    observer = ?id,
                    error = %source,
                    "observer update failed"
                );

                match self.config.delivery {
                    DeliveryPolicy::AbortOnFailure => {
                        return Err(NotifyError::Aborted {
                            observer: id,
                            delivered: delivery.delivered,
                            source,
                        });
                    }
                    DeliveryPolicy::Isolate => {
                        failures.push(DeliveryFailure { observer: id, source });
                    }
                }
            } else {
                delivery.delivered += 1;
            }
        }

        tracing::trace!(
            subject = self.name(),
            delivered = delivery.delivered,
            expired = delivery.expired,
            failed = failures.len(),
            "notification finished"
        );

        if failures.is_empty() {
            Ok(delivery)
        } else {
            Err(NotifyError::Failed {
                delivered: delivery.delivered,
                failures,
            })
        }
    }

    /// Snapshot of the current observer list.
    pub fn snapshot(&self) -> Snapshot<Weak<dyn Observer>> {
        self.observers.snapshot()
    }

    /// Number of entries in the list, expired ones included.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Number of entries that still resolve to a live observer.
    pub fn live_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// IDs of the live observers, in list order.
    pub fn observer_ids(&self) -> Vec<ObserverId> {
        self.snapshot()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|observer| observer.id())
            .collect()
    }

    pub fn stats(&self) -> SubjectStats {
        let snapshot = self.snapshot();
        SubjectStats {
            name: self.config.name.clone(),
            entries: snapshot.len(),
            live: snapshot.iter().filter(|entry| entry.strong_count() > 0).count(),
            copies: self.observers.copies(),
        }
    }
}

/// Drop every entry whose observer is gone. Returns how many were removed.
fn prune_expired(list: &mut ObserverList) -> usize {
    let before = list.len();
    list.retain(|entry| entry.strong_count() > 0);
    before - list.len()
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("name", &self.name())
            .field("entries", &self.len())
            .field("live", &self.live_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpdateError;
    use crate::observer::FnObserver;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Arc<FnObserver> {
        let log = Arc::clone(log);
        Arc::new(FnObserver::infallible(move || log.lock().push(name)))
    }

    #[test]
    fn notify_delivers_in_registration_order() {
        let subject = Subject::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let b = recorder(&log, "b");
        let c = recorder(&log, "c");

        subject.subscribe(&a);
        subject.subscribe(&b);
        subject.subscribe(&c);

        let delivery = subject.notify().unwrap();
        assert_eq!(delivery, Delivery { delivered: 3, expired: 0 });
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn register_sets_back_reference() {
        let subject = Subject::new();
        let observer = Arc::new(FnObserver::infallible(|| {}));
        assert!(!observer.link().is_attached());

        subject.subscribe(&observer);

        let linked = observer.link().subject().unwrap();
        assert!(Arc::ptr_eq(&linked, &subject));
    }

    #[test]
    fn registering_expired_observer_leaves_prunable_entry() {
        let subject = Subject::new();
        let observer = Arc::new(FnObserver::infallible(|| {}));
        let weak: Weak<dyn Observer> = Arc::downgrade(&observer) as Weak<dyn Observer>;
        drop(observer);

        subject.register(weak);
        assert_eq!(subject.len(), 1);
        assert_eq!(subject.live_count(), 0);

        assert_eq!(subject.unregister(), 1);
        assert!(subject.is_empty());
    }

    #[test]
    fn dropping_observer_prunes_subject() {
        let subject = Subject::new();
        let a = Arc::new(FnObserver::infallible(|| {}));
        let b = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&a);
        subject.subscribe(&b);
        assert_eq!(subject.len(), 2);

        drop(a);
        assert_eq!(subject.len(), 1);
        assert_eq!(subject.observer_ids(), vec![b.id()]);
    }

    #[test]
    fn unregister_is_idempotent_and_keeps_live_entries() {
        let subject = Subject::new();
        let other = Subject::new();
        let keep = Arc::new(FnObserver::infallible(|| {}));
        let gone = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&keep);
        subject.subscribe(&gone);
        // Moving the back-reference means dropping `gone` prunes `other`.
        other.subscribe(&gone);

        drop(gone);
        assert_eq!(subject.len(), 2);

        assert_eq!(subject.unregister(), 1);
        assert_eq!(subject.unregister(), 0);
        assert_eq!(subject.len(), 1);
        assert_eq!(subject.observer_ids(), vec![keep.id()]);
    }

    #[test]
    fn notify_skips_expired_entries() {
        let subject = Subject::new();
        let other = Subject::new();
        let live = Arc::new(FnObserver::infallible(|| {}));
        let dead = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&live);
        subject.subscribe(&dead);
        other.subscribe(&dead);
        drop(dead);

        let delivery = subject.notify().unwrap();
        assert_eq!(delivery, Delivery { delivered: 1, expired: 1 });
        // notify never prunes
        assert_eq!(subject.len(), 2);
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let subject = Subject::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&log, "a");
        let failing = Arc::new(FnObserver::new(|| Err(UpdateError::new("bad"))));
        let c = recorder(&log, "c");
        subject.subscribe(&a);
        subject.subscribe(&failing);
        subject.subscribe(&c);

        let err = subject.notify().unwrap_err();
        match err {
            NotifyError::Aborted { observer, delivered, .. } => {
                assert_eq!(observer, failing.id());
                assert_eq!(delivered, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[test]
    fn isolate_policy_visits_everyone() {
        let subject = Subject::with_config(
            SubjectConfig::new().with_delivery(DeliveryPolicy::Isolate),
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::new(FnObserver::new(|| Err(UpdateError::new("one"))));
        let b = recorder(&log, "b");
        let second = Arc::new(FnObserver::new(|| Err(UpdateError::new("two"))));
        subject.subscribe(&first);
        subject.subscribe(&b);
        subject.subscribe(&second);

        let err = subject.notify().unwrap_err();
        assert_eq!(err.delivered(), 1);
        assert_eq!(err.failed_observers(), vec![first.id(), second.id()]);
        assert_eq!(*log.lock(), vec!["b"]);
    }

    #[test]
    fn detach_removes_only_target() {
        let subject = Subject::new();
        let a = Arc::new(FnObserver::infallible(|| {}));
        let b = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&a);
        subject.subscribe(&b);

        let weak_a: Weak<dyn Observer> = Arc::downgrade(&a) as Weak<dyn Observer>;
        assert!(subject.detach(&weak_a));
        assert!(!subject.detach(&weak_a));
        assert!(!a.link().is_attached());
        assert!(b.link().is_attached());
        assert_eq!(subject.observer_ids(), vec![b.id()]);
    }

    #[test]
    fn prune_on_register_reaps_stale_entries() {
        let subject = Subject::with_config(SubjectConfig::new().with_prune_on_register(true));
        let other = Subject::new();
        let stale = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&stale);
        other.subscribe(&stale);
        drop(stale);
        assert_eq!(subject.len(), 1);

        let fresh = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&fresh);
        assert_eq!(subject.len(), 1);
        assert_eq!(subject.observer_ids(), vec![fresh.id()]);
    }

    #[test]
    fn observer_outlives_subject() {
        let subject = Subject::new();
        let observer = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&observer);

        drop(subject);
        assert!(!observer.link().is_attached());
        drop(observer);
    }

    #[test]
    fn stats_report_entries_and_copies() {
        let subject = Subject::with_config(SubjectConfig::new().with_name("stats"));
        let a = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&a);

        let held = subject.snapshot();
        let b = Arc::new(FnObserver::infallible(|| {}));
        subject.subscribe(&b);
        drop(held);

        let stats = subject.stats();
        assert_eq!(stats.name.as_deref(), Some("stats"));
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.live, 2);
        assert_eq!(stats.copies, 1);
    }
}
