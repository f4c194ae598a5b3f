//! Integration tests for enclave
//!
//! These tests exercise the full runner/boundary lifecycle against the
//! fixture units under `tests/fixtures/units`. No external binaries or
//! privileges are required.

use std::sync::Mutex;

use enclave::{Config, HostSink, IsolationRunner};

mod config_loading;
mod relay;
mod unit_loading;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Config resolving units against the fixture directory, with a short
/// reclamation pause so leak tests stay fast.
pub(crate) fn fixture_config() -> Config {
    let mut config = Config::with_unit_root(format!("{FIXTURES_PATH}/units"));
    config.reclaim.pause_ms = 1;
    config
}

/// Runner over the fixture units
pub(crate) fn fixture_runner() -> IsolationRunner {
    IsolationRunner::new(fixture_config()).expect("runner should construct")
}

/// Sink that captures boundary output for assertions
#[derive(Debug, Default)]
pub(crate) struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock").clone()
    }
}

impl HostSink for BufferSink {
    fn write_line(&self, text: &str, _indent: usize) {
        self.lines.lock().expect("sink lock").push(text.to_string());
    }
}
