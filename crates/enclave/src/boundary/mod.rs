//! Execution boundary
//!
//! This module provides the isolation boundary itself: a disposable context
//! that code units can be loaded into by name, a relay surface for invoking
//! host-context callbacks, and a non-owning observer used to confirm that a
//! torn-down boundary has actually been reclaimed.
//!
//! Boundaries are backed by a per-boundary WebAssembly store. Dropping the
//! store releases everything loaded inside the boundary, which is what makes
//! reclamation confirmable rather than merely requested.

use thiserror::Error;

pub use crate::boundary::context::Boundary;
pub use crate::boundary::hostcall::{HostSink, HostState, TracingSink};
pub use crate::boundary::observe::{BoundaryObserver, Reachability};
pub use crate::boundary::resolver::{DirectoryResolver, StaticResolver, UnitResolver, UnitSource};

mod context;
pub(crate) mod hostcall;
mod observe;
mod resolver;

/// Errors that occur during boundary operations
///
/// All diagnostics from the underlying WebAssembly substrate are flattened to
/// message strings before they cross the boundary; no variant ever carries a
/// live handle into boundary-owned state.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("unit '{name}' not found under {searched}")]
    UnitNotFound { name: String, searched: String },

    #[error("unit '{name}' is already loaded in this boundary")]
    AlreadyLoaded { name: String },

    #[error("unit '{name}' is not a valid module: {message}")]
    InvalidUnit { name: String, message: String },

    #[error("unit '{name}' has an import the host does not provide: {message}")]
    UnresolvedImport { name: String, message: String },

    #[error("invalid unit name: {0}")]
    InvalidName(String),

    #[error("boundary is closed; no further access is possible")]
    Closed,

    #[error("unit '{unit}' has no export named '{name}'")]
    UnknownExport { unit: String, name: String },

    #[error("export '{unit}.{name}' has an unsupported signature (only i32/i64 are supported)")]
    UnsupportedSignature { unit: String, name: String },

    #[error("export '{unit}.{name}' takes {expected} arguments, got {actual}")]
    ArityMismatch {
        unit: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("unit '{unit}' trapped in '{name}': {message}")]
    UnitTrap {
        unit: String,
        name: String,
        message: String,
    },

    #[error("failed to set up boundary substrate: {0}")]
    Setup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate a unit name
///
/// Unit names are identifiers, not paths: empty names, absolute paths, and
/// anything containing a path separator or `..` are rejected before the name
/// reaches the resolver.
pub(crate) fn validate_unit_name(name: &str) -> Result<(), BoundaryError> {
    if name.is_empty() {
        return Err(BoundaryError::InvalidName("empty name".to_string()));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(BoundaryError::InvalidName(format!(
            "path traversal not allowed: {name}"
        )));
    }
    Ok(())
}
