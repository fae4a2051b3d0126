//! Error types for subject notification.
//!
//! An expired weak reference is never an error. The only failures the crate
//! reports are the ones observers return from [`Observer::update`].
//!
//! [`Observer::update`]: crate::observer::Observer::update

use smallvec::SmallVec;
use thiserror::Error;

use crate::observer::ObserverId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure returned by an observer's `update` callback.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpdateError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl UpdateError {
    /// Create an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One observer that failed during an isolated delivery.
#[derive(Debug, Error)]
#[error("observer {observer:?} failed: {source}")]
pub struct DeliveryFailure {
    pub observer: ObserverId,
    #[source]
    pub source: UpdateError,
}

/// Error returned by `Subject::notify`.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery stopped at the first failing observer.
    #[error("notification aborted by observer {observer:?} after {delivered} deliveries: {source}")]
    Aborted {
        observer: ObserverId,
        delivered: usize,
        #[source]
        source: UpdateError,
    },

    /// Every live observer was visited, but some of them failed.
    #[error("{} of {} observers failed", .failures.len(), .delivered + .failures.len())]
    Failed {
        delivered: usize,
        failures: SmallVec<[DeliveryFailure; 2]>,
    },
}

impl NotifyError {
    /// Number of observers whose `update` returned `Ok`.
    pub fn delivered(&self) -> usize {
        match self {
            NotifyError::Aborted { delivered, .. } | NotifyError::Failed { delivered, .. } => {
                *delivered
            }
        }
    }

    /// IDs of the observers that failed, in delivery order.
    pub fn failed_observers(&self) -> Vec<ObserverId> {
        match self {
            NotifyError::Aborted { observer, .. } => vec![*observer],
            NotifyError::Failed { failures, .. } => {
                failures.iter().map(|failure| failure.observer).collect()
            }
        }
    }
}
