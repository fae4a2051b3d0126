//! Copy-on-Write Containers
//!
//! This module implements the shared sequence that backs every subject's
//! observer list.
//!
//! # Concepts
//!
//! ## Snapshots
//!
//! A snapshot is a handle to the sequence as it existed when the snapshot was
//! taken. Taking one costs a lock acquisition and a reference-count bump; the
//! contents are never copied. A snapshot can be iterated for as long as the
//! caller likes, from any thread, while other threads keep mutating the list.
//!
//! ## Copy-on-Write
//!
//! A mutation first checks whether the current buffer is shared with any
//! outstanding snapshot. If it is, the buffer is cloned and the clone becomes
//! the new current value. If it is not, the buffer is edited in place. Either
//! way, memory reachable from an existing snapshot is never written.

mod list;

pub use list::{CowList, Snapshot};
