pub mod library;
pub mod process;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::interp::library::ResolveError;

/// Ways a sandboxed run can settle unsuccessfully.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The interpreter ran and reported an error (raised exception, syntax
    /// error, nonzero exit).
    #[error("{0}")]
    Execution(String),
    /// The interpreter requested a module absent from the sandbox.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("interpreter timed out after {0}s")]
    Timeout(u64),
    #[error("failed to launch interpreter: {0}")]
    Launch(String),
}

type OutputFn = dyn Fn(&str) + Send + Sync;
type ResolveFn = dyn Fn(&str) -> Result<String, ResolveError> + Send + Sync;

/// Per-run channels handed to a runtime: where emitted output goes and how
/// module names resolve inside the sandbox.
#[derive(Clone)]
pub struct RuntimeHooks {
    output: Arc<OutputFn>,
    resolver: Arc<ResolveFn>,
    manifest: Arc<Vec<String>>,
}

impl RuntimeHooks {
    pub fn new(output: Arc<OutputFn>, resolver: Arc<ResolveFn>, manifest: Vec<String>) -> Self {
        Self {
            output,
            resolver,
            manifest: Arc::new(manifest),
        }
    }

    pub fn emit(&self, chunk: &str) {
        (self.output)(chunk);
    }

    pub fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        (self.resolver)(name)
    }

    /// Names of every file present in the sandboxed filesystem.
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }
}

/// External sandboxed interpreter capability.
///
/// `execute` settles exactly once: `Ok(())` for a clean run, `Err` otherwise.
/// Output emitted mid-run goes through the hooks, never through the return
/// value. Implementations do not serialize concurrent calls; callers do.
#[async_trait]
pub trait Runtime: Send + Sync {
    async fn execute(&self, source: &str, hooks: &RuntimeHooks) -> Result<(), RuntimeError>;
}
