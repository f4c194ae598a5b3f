//! Boundary reachability observation
//!
//! The runner needs to answer "has this boundary actually become
//! unreachable?" after teardown, without the act of asking keeping the
//! boundary alive. [`BoundaryObserver`] holds a non-owning reference to the
//! boundary's shared state and collapses its status to an explicit two-state
//! answer.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use crate::boundary::context::BoundaryInner;

/// Whether an observed boundary is still reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// At least one owning handle to the boundary still exists
    Reachable,

    /// Every owning handle is gone; the boundary and everything loaded
    /// inside it has been released
    Unreachable,
}

impl Reachability {
    /// Check if the boundary has been fully reclaimed
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Reachability::Unreachable)
    }
}

/// A non-owning, lifetime-tracking handle to a boundary
///
/// Taken by the runner immediately after the boundary is constructed, before
/// caller logic ever sees a handle. Observing never extends the boundary's
/// lifetime.
#[derive(Debug)]
pub struct BoundaryObserver {
    target: Weak<BoundaryInner>,
}

impl BoundaryObserver {
    pub(crate) fn new(target: &Arc<BoundaryInner>) -> Self {
        Self {
            target: Arc::downgrade(target),
        }
    }

    /// Observe the boundary's current reachability
    pub fn observe(&self) -> Reachability {
        if self.target.strong_count() == 0 {
            Reachability::Unreachable
        } else {
            Reachability::Reachable
        }
    }

    /// Check whether unloading has been requested on the boundary
    ///
    /// A boundary can have had teardown requested while still being kept
    /// reachable by a leaked handle; this distinguishes that state for
    /// diagnostics. Returns `true` once the boundary is gone entirely.
    pub fn teardown_requested(&self) -> bool {
        match self.target.upgrade() {
            Some(inner) => inner.closed.load(Ordering::Acquire),
            None => true,
        }
    }
}
