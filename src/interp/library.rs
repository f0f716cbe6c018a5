use std::collections::HashMap;

use thiserror::Error;

/// Deterministic failure for a module lookup that misses the sandbox.
///
/// The message format is part of the contract surfaced to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("File not found: '{0}'")]
pub struct ResolveError(pub String);

/// In-memory filesystem visible to the sandboxed interpreter.
///
/// Seeded once at startup; the interpreter can only ever see what was put
/// here, nothing from the host.
#[derive(Debug, Clone, Default)]
pub struct ModuleLibrary {
    files: HashMap<String, String>,
}

impl ModuleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }

    pub fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError(name.to_string()))
    }

    /// Sorted file names, used to project the library into a scratch dir.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
