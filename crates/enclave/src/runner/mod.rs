//! Isolation runner
//!
//! Drives the full lifecycle of one isolated run: construct a fresh
//! boundary, hand caller logic an owned handle, request unload on every exit
//! path, then actively confirm reclamation instead of assuming it.
//!
//! Confirmation matters because a boundary handle is cheap to clone and
//! nothing stops logic from stashing a clone somewhere that outlives the
//! run. The runner polls a non-owning observer under a bounded retry budget;
//! a boundary still reachable when the budget runs out is reported (and
//! logged) as [`ReclamationOutcome::BudgetExhausted`], never raised as an
//! error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument, trace, warn};
use wasmtime::{Engine, Linker};

use crate::boundary::{
    Boundary, BoundaryError, BoundaryObserver, DirectoryResolver, HostSink, HostState,
    TracingSink, UnitResolver,
};
use crate::boundary::hostcall::register_host_functions;
use crate::config::Config;

/// Outcome of the reclamation-confirmation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclamationOutcome {
    /// The boundary was confirmed unreachable
    Reclaimed,

    /// The retry budget ran out while the boundary was still reachable.
    /// Best-effort condition: something kept a handle alive past the run.
    BudgetExhausted,
}

/// Report from one run's teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclamationReport {
    /// How teardown confirmation ended
    pub outcome: ReclamationOutcome,

    /// Number of reachability checks performed
    pub attempts: u32,
}

impl ReclamationReport {
    /// Check if the boundary was confirmed reclaimed
    #[must_use]
    pub fn is_reclaimed(&self) -> bool {
        matches!(self.outcome, ReclamationOutcome::Reclaimed)
    }
}

/// High-level runner for isolated execution
///
/// One engine and one host linker are built up front and shared (immutably)
/// across runs; each run gets its own boundary and store. Runs do not share
/// any mutable state with each other.
pub struct IsolationRunner {
    config: Config,
    engine: Engine,
    linker: Linker<HostState>,
    resolver: Arc<dyn UnitResolver>,
    sink: Arc<dyn HostSink>,
}

impl IsolationRunner {
    /// Create a new runner with the given configuration
    ///
    /// Units resolve against `config.unit_root` and boundary output goes to
    /// the tracing sink; both can be replaced with [`with_resolver`](Self::with_resolver)
    /// and [`with_sink`](Self::with_sink).
    pub fn new(config: Config) -> Result<Self, BoundaryError> {
        let engine = Engine::default();
        let mut linker = Linker::new(&engine);
        register_host_functions(&mut linker)
            .map_err(|e| BoundaryError::Setup(format!("{e:#}")))?;

        let resolver = Arc::new(DirectoryResolver::from_config(&config));

        Ok(Self {
            config,
            engine,
            linker,
            resolver,
            sink: Arc::new(TracingSink),
        })
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Result<Self, BoundaryError> {
        Self::new(Config::default())
    }

    /// Replace the unit resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn UnitResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the host sink
    pub fn with_sink(mut self, sink: Arc<dyn HostSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run caller logic against a fresh, disposable boundary
    ///
    /// The boundary is unloaded on every exit path, success or fault, and
    /// the logic's result (or fault, unchanged) is returned after teardown
    /// has been confirmed or its retry budget exhausted. Budget exhaustion
    /// is logged, not raised; use
    /// [`run_isolated_with_report`](Self::run_isolated_with_report) to
    /// observe it.
    pub async fn run_isolated<T, F, Fut>(&self, logic: F) -> Result<T>
    where
        F: FnOnce(Boundary) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (result, _report) = self.run_isolated_with_report(logic).await;
        result
    }

    /// Run caller logic and additionally report the reclamation outcome
    pub async fn run_isolated_with_report<T, F, Fut>(
        &self,
        logic: F,
    ) -> (Result<T>, ReclamationReport)
    where
        F: FnOnce(Boundary) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (result, observer) = self.execute(logic).await;
        let report = self.await_reclamation(&observer).await;
        (result, report)
    }

    /// Construct the boundary, run the logic, request unload
    ///
    /// No boundary handle survives this frame: the logic gets its own owned
    /// clone, and the runner's handle is dropped before the reclamation
    /// polling starts. The observer is taken before logic sees the boundary.
    #[instrument(skip_all)]
    async fn execute<T, F, Fut>(&self, logic: F) -> (Result<T>, BoundaryObserver)
    where
        F: FnOnce(Boundary) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (boundary, observer) = Boundary::create(
            &self.engine,
            &self.linker,
            self.resolver.clone(),
            self.sink.clone(),
        );

        let result = logic(boundary.clone()).await;
        if result.is_err() {
            debug!(boundary = boundary.id(), "logic faulted; unloading anyway");
        }

        boundary.close().await;
        (result, observer)
    }

    /// Poll until the boundary is confirmed unreachable or the budget runs out
    async fn await_reclamation(&self, observer: &BoundaryObserver) -> ReclamationReport {
        let policy = &self.config.reclaim;

        for attempt in 1..=policy.attempts {
            if observer.observe().is_unreachable() {
                trace!(attempt, "boundary reclaimed");
                return ReclamationReport {
                    outcome: ReclamationOutcome::Reclaimed,
                    attempts: attempt,
                };
            }
            if attempt < policy.attempts {
                tokio::time::sleep(Duration::from_millis(policy.pause_ms)).await;
            }
        }

        warn!(
            attempts = policy.attempts,
            teardown_requested = observer.teardown_requested(),
            "boundary still reachable after reclamation budget; a handle leaked out of the run"
        );
        ReclamationReport {
            outcome: ReclamationOutcome::BudgetExhausted,
            attempts: policy.attempts,
        }
    }
}
