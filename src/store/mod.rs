//! Transactional store backing handler invocations.
//!
//! Each matched handler invocation gets its own [`Session`], a unit-of-work opened
//! from the process [`Store`]. Writes staged in a session become visible to other
//! sessions only after [`Session::commit`]; [`Session::release`] ends the unit of
//! work and drops anything left uncommitted.
//!
//! The dispatcher never releases sessions by hand: it wraps them in an
//! [`InvocationScope`](crate::dispatch::InvocationScope) which guarantees a single
//! release on every exit path.
//!
//! # Module Organization
//!
//! - [`memory`] - In-process [`MemoryStore`] used by the `strea` binary

mod memory;

use std::sync::Arc;

use mockall::automock;
use thiserror::Error;

pub use crate::store::memory::MemoryStore;

/// Errors raised by store sessions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The session was used after its scope was released
    #[error("session is already released")]
    Released,
}

/// A unit-of-work over the store.
#[automock]
pub trait Session: Send + Sync {
    /// Reads a value, staged writes of this session included.
    fn get(&self, key: &str) -> Option<String>;
    /// Stages a write.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Stages a deletion.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Applies every staged change.
    fn commit(&self) -> Result<(), StoreError>;
    /// Ends the unit of work, discarding uncommitted changes.
    fn release(&self);
}

/// Factory of sessions, shared by every dispatch.
#[automock]
pub trait Store: Send + Sync {
    /// Opens a fresh session.
    fn open_session(&self) -> Arc<dyn Session>;
}
