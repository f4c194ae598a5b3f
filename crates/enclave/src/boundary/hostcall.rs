//! Host-side capability surface
//!
//! Code running inside a boundary has no ambient access to host facilities;
//! anything host-only (console output, log sinks) is reached through the
//! narrow surface defined here. Host-context callbacks passed to
//! [`Boundary::relay`](crate::Boundary::relay) run against the same contract,
//! and guest units get the `host.log` import wired into every boundary's
//! linker.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{info, trace};
use wasmtime::{Caller, Linker};

/// A sink for text emitted from inside a boundary
///
/// The boundary never depends on where the text goes; the default sink
/// forwards to `tracing`, and tests substitute a buffer.
pub trait HostSink: Send + Sync {
    /// Write one line of text at the given indent level
    fn write_line(&self, text: &str, indent: usize);
}

/// Default sink that forwards boundary output to `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl HostSink for TracingSink {
    fn write_line(&self, text: &str, indent: usize) {
        info!(indent, "{text}");
    }
}

/// Per-boundary data carried by the store
///
/// This is the only state host functions can see. It deliberately holds
/// nothing that belongs to the boundary itself, so a host call can never
/// smuggle boundary-owned state out.
pub struct HostState {
    /// Identifier of the owning boundary, for diagnostics
    pub boundary_id: u64,

    /// Where guest-emitted text goes
    pub sink: Arc<dyn HostSink>,
}

impl HostState {
    pub(crate) fn new(boundary_id: u64, sink: Arc<dyn HostSink>) -> Self {
        Self { boundary_id, sink }
    }
}

/// Register the host functions available to every loaded unit
///
/// Unit imports resolve only against what is defined here; units never
/// resolve imports against each other.
pub(crate) fn register_host_functions(linker: &mut Linker<HostState>) -> Result<()> {
    linker.func_wrap(
        "host",
        "log",
        |mut caller: Caller<'_, HostState>, ptr: u32, len: u32| -> Result<()> {
            let memory = caller
                .get_export("memory")
                .and_then(|e| e.into_memory())
                .ok_or_else(|| anyhow!("host.log requires an exported memory"))?;

            let start = ptr as usize;
            let end = start
                .checked_add(len as usize)
                .ok_or_else(|| anyhow!("host.log range overflows"))?;
            let text = memory
                .data(&caller)
                .get(start..end)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .ok_or_else(|| anyhow!("host.log range out of bounds"))?;

            let state = caller.data();
            trace!(boundary = state.boundary_id, len, "guest host.log");
            state.sink.write_line(&text, 0);
            Ok(())
        },
    )?;

    Ok(())
}
