//! Unit-of-work scope bound to one handler invocation.

use std::sync::Arc;

use log::trace;

use crate::store::{Session, Store};

/// Owns the session opened for one matched invocation and releases it exactly once.
///
/// Release happens through [`InvocationScope::release`] or, on any other exit path
/// (an early return, a failing body, a cancelled dispatch future), when the scope is
/// dropped.
pub struct InvocationScope {
    session: Arc<dyn Session>,
    released: bool,
}

impl InvocationScope {
    /// Opens a fresh session from `store`.
    pub fn open(store: &dyn Store) -> Self {
        trace!("opening invocation scope");
        InvocationScope {
            session: store.open_session(),
            released: false,
        }
    }

    /// Handle given to handler bodies that declare
    /// [`ContextParam::Scope`](crate::dispatch::ContextParam::Scope).
    pub fn session(&self) -> Arc<dyn Session> {
        Arc::clone(&self.session)
    }

    /// Releases the session now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.session.release();
            trace!("invocation scope released");
        }
    }
}

impl Drop for InvocationScope {
    fn drop(&mut self) {
        self.release_once();
    }
}
