//! Subject configuration.
//!
//! Configuration is plain data. It derives serde traits so it can be
//! embedded in whatever config format the host application already reads.

use serde::{Deserialize, Serialize};

/// What `notify` does when an observer's `update` returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Stop at the first failure and return it. Later observers in the
    /// snapshot are not notified.
    #[default]
    AbortOnFailure,

    /// Notify every live observer and report all failures together.
    Isolate,
}

/// Settings for a [`Subject`](crate::observer::Subject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectConfig {
    /// Label used in log fields and stats.
    pub name: Option<String>,

    /// Failure handling during delivery.
    pub delivery: DeliveryPolicy,

    /// Capacity preallocated for the observer list.
    pub initial_capacity: usize,

    /// Prune expired entries on every `register`, in the same mutation.
    pub prune_on_register: bool,
}

impl SubjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_prune_on_register(mut self, prune: bool) -> Self {
        self.prune_on_register = prune;
        self
    }
}
