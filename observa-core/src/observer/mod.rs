//! Subjects and Observers
//!
//! This module implements the registry that connects one subject to many
//! observers.
//!
//! # Concepts
//!
//! ## Subjects
//!
//! A [`Subject`] keeps an ordered list of weak references to observers. It
//! never owns an observer: an observer lives exactly as long as its own owners
//! keep it alive. When the subject's state changes, [`Subject::notify`] takes a
//! snapshot of the list and calls [`Observer::update`] on every observer that
//! is still alive, in registration order.
//!
//! ## Observers
//!
//! An [`Observer`] embeds a [`SubjectLink`], a weak back-reference to the
//! subject it last registered with. When the observer is dropped, the link
//! asks that subject to prune expired entries. No explicit unsubscribe call
//! is needed, and the subject and its observers may be dropped in any order.
//!
//! ## Payloads
//!
//! [`Observed`] pairs a value with a subject and notifies after every write.
//!
//! # Thread Safety
//!
//! `register`, `unregister` and `detach` hold the subject's list lock for the
//! duration of a short list edit. `notify` holds it only while cloning the
//! list handle, so observer callbacks never run under the lock. An observer
//! dropped in the middle of a delivery loop is therefore safe: its prune takes
//! the lock independently of the loop.

mod subscriber;
mod link;
mod subject;
mod observed;

pub use subscriber::{Observer, ObserverId, FnObserver};
pub use link::SubjectLink;
pub use subject::{Subject, Delivery, SubjectStats};
pub use observed::Observed;
