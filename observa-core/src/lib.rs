//! Observa Core
//!
//! This crate provides a thread-safe subject/observer registry. It
//! implements:
//!
//! - A copy-on-write list with snapshot reads
//! - Subjects that hold weak references to their observers
//! - Observers that prune their subject when dropped
//! - Observed values that notify on every write
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `cow`: The lock-guarded copy-on-write sequence
//! - `observer`: Subjects, observers and the links between them
//! - `config`: Per-subject settings
//! - `error`: Notification errors
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use observa_core::observer::{FnObserver, Subject};
//!
//! // Create a subject and an observer
//! let subject = Subject::new();
//! let observer = Arc::new(FnObserver::infallible(|| println!("changed")));
//!
//! // The subject only holds a weak reference
//! subject.subscribe(&observer);
//! assert_eq!(subject.notify().unwrap().delivered, 1);
//!
//! // Dropping the observer removes it from the subject
//! drop(observer);
//! assert!(subject.is_empty());
//! ```

pub mod config;
pub mod cow;
pub mod error;
pub mod observer;

pub use config::{DeliveryPolicy, SubjectConfig};
pub use error::{DeliveryFailure, NotifyError, UpdateError};
