//! Unit resolution
//!
//! Turning a unit name into a loadable artifact is a collaborator concern:
//! the boundary asks a [`UnitResolver`] where the artifact lives and does the
//! reading and compiling itself. Resolvers only discover; they never parse.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::boundary::{BoundaryError, validate_unit_name};
use crate::config::Config;

/// Where a resolved unit artifact can be read from
#[derive(Debug, Clone)]
pub enum UnitSource {
    /// An artifact on disk, read by the boundary at load time
    File(PathBuf),

    /// Artifact bytes held in memory (text or binary module format)
    Inline(Vec<u8>),
}

/// Resolves unit names to loadable artifacts
///
/// Implementations must be cheap and side-effect free; the boundary calls
/// `resolve` once per `load_unit` and performs all I/O itself for
/// [`UnitSource::File`] results.
pub trait UnitResolver: Send + Sync {
    /// Resolve a unit name to an artifact location
    fn resolve(&self, name: &str) -> Result<UnitSource, BoundaryError>;
}

/// Resolves unit names against a base directory
///
/// A unit named `Sample` resolves to the first of `{root}/Sample.{ext}` that
/// exists, with extensions tried in configured order.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryResolver {
    /// Create a resolver rooted at the given directory with the given
    /// candidate extensions
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// Create a resolver from a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.unit_root, config.unit_extensions.clone())
    }

    /// The base directory unit names are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl UnitResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<UnitSource, BoundaryError> {
        validate_unit_name(name)?;

        for ext in &self.extensions {
            // Not with_extension: that would eat everything after the last
            // dot in a name like "unit-2.v1".
            let candidate = self.root.join(format!("{name}.{ext}"));
            if candidate.exists() {
                return Ok(UnitSource::File(candidate));
            }
        }

        Err(BoundaryError::UnitNotFound {
            name: name.to_string(),
            searched: self.root.display().to_string(),
        })
    }
}

/// Resolves unit names from an in-memory map
///
/// Useful for embedding units directly in a binary and for tests that should
/// not touch the filesystem.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    units: HashMap<String, Vec<u8>>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit under the given name, replacing any previous artifact
    pub fn with_unit(mut self, name: impl Into<String>, artifact: impl Into<Vec<u8>>) -> Self {
        self.units.insert(name.into(), artifact.into());
        self
    }
}

impl UnitResolver for StaticResolver {
    fn resolve(&self, name: &str) -> Result<UnitSource, BoundaryError> {
        validate_unit_name(name)?;

        self.units
            .get(name)
            .map(|artifact| UnitSource::Inline(artifact.clone()))
            .ok_or_else(|| BoundaryError::UnitNotFound {
                name: name.to_string(),
                searched: "<static>".to_string(),
            })
    }
}
