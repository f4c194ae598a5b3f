//! A library for isolated execution of dynamically loaded code units.
//!
//! Enclave runs caller-supplied logic against a fresh, disposable execution
//! boundary. Code units (WebAssembly modules) can be loaded into the boundary
//! by name, guest code can reach back into the host through a narrow relay
//! surface, and when the logic returns the boundary is torn down with
//! *confirmed* reclamation: the runner holds a non-owning observation of the
//! boundary and polls until everything loaded inside it has actually become
//! unreachable, not merely been asked to go away.
//!
//! # Features
//!
//! - **One boundary per run** — [`IsolationRunner::run_isolated`] constructs
//!   a boundary, hands your logic an owned [`Boundary`] handle, and tears the
//!   boundary down on every exit path, success or fault.
//! - **Named unit loading** — units resolve through a [`UnitResolver`]
//!   against a base directory; imports resolve only against the host-level
//!   linker, never against other units in the boundary.
//! - **Host relay** — [`Boundary::relay`] runs a callback synchronously in
//!   host context; guest code gets the same capability through the
//!   `host.log` import.
//! - **Confirmed teardown** — a [`BoundaryObserver`] answers "is the boundary
//!   still reachable?", and the runner polls it under a bounded retry budget,
//!   reporting [`ReclamationOutcome::BudgetExhausted`] instead of hanging.
//! - **No leaked handles** — every boundary operation returns plain owned
//!   data (strings, integers); diagnostics are flattened to messages before
//!   they cross the boundary.

pub use boundary::{
    Boundary, BoundaryError, BoundaryObserver, DirectoryResolver, HostSink, Reachability,
    StaticResolver, TracingSink, UnitResolver, UnitSource,
};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, ReclaimPolicy};
pub use runner::{IsolationRunner, ReclamationOutcome, ReclamationReport};

pub mod boundary;
pub mod config;
pub mod runner;
