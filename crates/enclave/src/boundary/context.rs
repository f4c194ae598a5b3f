//! The isolation boundary
//!
//! A [`Boundary`] owns a private WebAssembly store that code units are
//! compiled and instantiated into. The store, and with it every unit and
//! every allocation the units made, is released when the boundary is
//! unloaded; confirming that release is the runner's job.
//!
//! # Lifecycle
//!
//! Boundaries are created by the runner and handed to caller logic as owned
//! handles. Once the logic returns, the runner requests unload; from that
//! point every operation on a leaked handle fails with
//! [`BoundaryError::Closed`]. Unit loading is monotonic: a name, once
//! loaded, stays loaded until the whole boundary is torn down.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, instrument, trace, warn};
use wasmtime::{Engine, Instance, Linker, Module, Store, Val, ValType};

use crate::boundary::hostcall::{HostSink, HostState};
use crate::boundary::observe::BoundaryObserver;
use crate::boundary::resolver::{UnitResolver, UnitSource};
use crate::boundary::{BoundaryError, validate_unit_name};

static NEXT_BOUNDARY_ID: AtomicU64 = AtomicU64::new(0);

/// An isolated execution boundary
///
/// Cheap to clone; all clones refer to the same boundary. Handles should not
/// outlive the `run_isolated` call that produced them — a handle that leaks
/// out keeps the boundary reachable and will be reported by the runner's
/// reclamation polling.
#[derive(Clone)]
pub struct Boundary {
    inner: Arc<BoundaryInner>,
}

pub(crate) struct BoundaryInner {
    id: u64,

    /// Set once unload has been requested; checked by every operation.
    pub(crate) closed: AtomicBool,

    resolver: Arc<dyn UnitResolver>,
    engine: Engine,
    linker: Linker<HostState>,

    /// The store and unit set, taken and dropped together at unload.
    state: Mutex<Option<BoundaryState>>,
}

struct BoundaryState {
    store: Store<HostState>,
    units: HashMap<String, LoadedUnit>,
}

struct LoadedUnit {
    module: Module,
    instance: Instance,
}

impl Boundary {
    /// Create a boundary and its observer
    ///
    /// The observer is taken here, before any handle escapes, so reachability
    /// tracking covers the boundary's whole lifetime.
    pub(crate) fn create(
        engine: &Engine,
        linker: &Linker<HostState>,
        resolver: Arc<dyn UnitResolver>,
        sink: Arc<dyn HostSink>,
    ) -> (Self, BoundaryObserver) {
        let id = NEXT_BOUNDARY_ID.fetch_add(1, Ordering::Relaxed);
        let store = Store::new(engine, HostState::new(id, sink));

        let inner = Arc::new(BoundaryInner {
            id,
            closed: AtomicBool::new(false),
            resolver,
            engine: engine.clone(),
            linker: linker.clone(),
            state: Mutex::new(Some(BoundaryState {
                store,
                units: HashMap::new(),
            })),
        });
        let observer = BoundaryObserver::new(&inner);

        debug!(boundary = id, "boundary created");

        (Self { inner }, observer)
    }

    /// Get the boundary ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Load a named code unit into the boundary
    ///
    /// The name is resolved to an artifact by the boundary's resolver, read,
    /// compiled, and instantiated. Imports resolve only against the host
    /// linker shared by all boundaries; units never resolve imports against
    /// each other.
    #[instrument(skip(self))]
    pub async fn load_unit(&self, name: &str) -> Result<(), BoundaryError> {
        validate_unit_name(name)?;
        self.ensure_open()?;

        let artifact = match self.inner.resolver.resolve(name)? {
            UnitSource::File(path) => {
                trace!(?path, "reading unit artifact");
                tokio::fs::read(&path).await?
            }
            UnitSource::Inline(bytes) => bytes,
        };

        let mut guard = self.inner.state.lock().await;
        let state = guard.as_mut().ok_or(BoundaryError::Closed)?;

        if state.units.contains_key(name) {
            return Err(BoundaryError::AlreadyLoaded {
                name: name.to_string(),
            });
        }

        let module =
            Module::new(&self.inner.engine, &artifact).map_err(|e| BoundaryError::InvalidUnit {
                name: name.to_string(),
                message: format!("{e:#}"),
            })?;

        let instance = self
            .inner
            .linker
            .instantiate(&mut state.store, &module)
            .map_err(|e| {
                let message = format!("{e:#}");
                if message.contains("unknown import") {
                    BoundaryError::UnresolvedImport {
                        name: name.to_string(),
                        message,
                    }
                } else {
                    BoundaryError::InvalidUnit {
                        name: name.to_string(),
                        message,
                    }
                }
            })?;

        state
            .units
            .insert(name.to_string(), LoadedUnit { module, instance });

        debug!(boundary = self.inner.id, unit = name, "unit loaded");
        Ok(())
    }

    /// Names of the units currently loaded, sorted
    pub async fn unit_names(&self) -> Vec<String> {
        match &*self.inner.state.lock().await {
            Some(state) => {
                let mut names: Vec<String> = state.units.keys().cloned().collect();
                names.sort();
                names
            }
            None => Vec::new(),
        }
    }

    /// Export names of a loaded unit, in module definition order
    ///
    /// Returns owned strings only; no handle into the unit escapes the
    /// boundary.
    pub async fn exports(&self, unit: &str) -> Result<Vec<String>, BoundaryError> {
        let guard = self.inner.state.lock().await;
        let state = guard.as_ref().ok_or(BoundaryError::Closed)?;
        let loaded = state.units.get(unit).ok_or_else(|| BoundaryError::UnitNotFound {
            name: unit.to_string(),
            searched: "<boundary>".to_string(),
        })?;

        Ok(loaded
            .module
            .exports()
            .map(|e| e.name().to_string())
            .collect())
    }

    /// Invoke an exported function of a loaded unit, inside the boundary
    ///
    /// Only integer signatures are supported; arguments are narrowed to the
    /// export's parameter types and results are widened back to `i64`. A
    /// guest trap is flattened to a message in [`BoundaryError::UnitTrap`].
    #[instrument(skip(self))]
    pub async fn invoke(
        &self,
        unit: &str,
        func: &str,
        args: &[i64],
    ) -> Result<Vec<i64>, BoundaryError> {
        let mut guard = self.inner.state.lock().await;
        let state = guard.as_mut().ok_or(BoundaryError::Closed)?;
        let BoundaryState { store, units } = state;

        let loaded = units.get(unit).ok_or_else(|| BoundaryError::UnitNotFound {
            name: unit.to_string(),
            searched: "<boundary>".to_string(),
        })?;

        let f = loaded
            .instance
            .get_func(&mut *store, func)
            .ok_or_else(|| BoundaryError::UnknownExport {
                unit: unit.to_string(),
                name: func.to_string(),
            })?;
        let ty = f.ty(&*store);

        if ty.params().len() != args.len() {
            return Err(BoundaryError::ArityMismatch {
                unit: unit.to_string(),
                name: func.to_string(),
                expected: ty.params().len(),
                actual: args.len(),
            });
        }

        let unsupported = || BoundaryError::UnsupportedSignature {
            unit: unit.to_string(),
            name: func.to_string(),
        };

        let mut params = Vec::with_capacity(args.len());
        for (param_ty, arg) in ty.params().zip(args) {
            match param_ty {
                ValType::I32 => params.push(Val::I32(*arg as i32)),
                ValType::I64 => params.push(Val::I64(*arg)),
                _ => return Err(unsupported()),
            }
        }

        let mut results = Vec::with_capacity(ty.results().len());
        for result_ty in ty.results() {
            match result_ty {
                ValType::I32 => results.push(Val::I32(0)),
                ValType::I64 => results.push(Val::I64(0)),
                _ => return Err(unsupported()),
            }
        }

        trace!(boundary = self.inner.id, unit, func, "invoking unit export");
        f.call(&mut *store, &params, &mut results)
            .map_err(|e| BoundaryError::UnitTrap {
                unit: unit.to_string(),
                name: func.to_string(),
                message: format!("{e:#}"),
            })?;

        results
            .into_iter()
            .map(|val| match val {
                Val::I32(v) => Ok(v as i64),
                Val::I64(v) => Ok(v),
                _ => Err(unsupported()),
            })
            .collect()
    }

    /// Relay a callback into host context and run it to completion
    ///
    /// Rust gives every boundary the same address space as the host, so
    /// there is no marshaling step: the relay is a direct, synchronous call
    /// on the caller's thread, and any fault the callback returns propagates
    /// unchanged. The callback and its argument must not capture
    /// boundary-owned state.
    pub fn relay<A, R>(
        &self,
        callback: impl FnOnce(A) -> anyhow::Result<R>,
        arg: A,
    ) -> anyhow::Result<R> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(BoundaryError::Closed.into());
        }

        let span = tracing::debug_span!("host_relay", boundary = self.inner.id);
        let _enter = span.enter();
        trace!("relaying callback into host context");
        callback(arg)
    }

    /// Request unload of the boundary
    ///
    /// Drops the store and every unit instantiated in it, and marks the
    /// boundary closed. Reclamation is complete only once the last handle is
    /// gone; the runner confirms that separately through the observer.
    pub(crate) async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);

        let mut guard = self.inner.state.lock().await;
        if let Some(state) = guard.take() {
            let unit_count = state.units.len();
            drop(state);
            debug!(
                boundary = self.inner.id,
                units = unit_count,
                "boundary unloaded"
            );
        }
    }

    fn ensure_open(&self) -> Result<(), BoundaryError> {
        if self.inner.closed.load(Ordering::Acquire) {
            Err(BoundaryError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Drop for BoundaryInner {
    fn drop(&mut self) {
        // Backstop for panicking logic: the store drops with us either way,
        // but unload should normally have been requested first.
        if !self.closed.load(Ordering::Acquire) {
            warn!(
                boundary = self.id,
                "boundary dropped without explicit unload; releasing its units now"
            );
        }
    }
}
