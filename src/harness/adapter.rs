use std::sync::{Arc, Mutex};

use crate::harness::sink::OutputSink;
use crate::interp::library::ModuleLibrary;
use crate::interp::{Runtime, RuntimeError, RuntimeHooks};

/// Uniform `execute(source)` facade over the sandboxed interpreter.
///
/// Configures the runtime's output channel so every emitted chunk lands in
/// the output sink, and serves module lookups from the in-memory library.
/// Re-entrant calls are not serialized here; that is the run controller's
/// job.
pub struct ExecutionAdapter {
    runtime: Arc<dyn Runtime>,
    library: Arc<ModuleLibrary>,
    sink: Arc<Mutex<OutputSink>>,
}

impl ExecutionAdapter {
    pub fn new(runtime: Arc<dyn Runtime>, library: ModuleLibrary) -> Self {
        Self {
            runtime,
            library: Arc::new(library),
            sink: Arc::new(Mutex::new(OutputSink::new())),
        }
    }

    pub async fn execute(&self, source: &str) -> Result<(), RuntimeError> {
        let sink = Arc::clone(&self.sink);
        let library = Arc::clone(&self.library);
        let hooks = RuntimeHooks::new(
            Arc::new(move |chunk: &str| {
                if let Ok(mut sink) = sink.lock() {
                    sink.append(chunk);
                }
            }),
            Arc::new(move |name: &str| library.resolve(name)),
            self.library.names(),
        );
        self.runtime.execute(source, &hooks).await
    }

    pub fn reset_output(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            sink.reset();
        }
    }

    pub fn read_output(&self) -> String {
        self.sink.lock().map(|sink| sink.read()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// Runtime that emits canned chunks, then settles with the given result.
    struct ScriptedRuntime {
        chunks: Vec<String>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl Runtime for ScriptedRuntime {
        async fn execute(&self, _source: &str, hooks: &RuntimeHooks) -> Result<(), RuntimeError> {
            for chunk in &self.chunks {
                hooks.emit(chunk);
            }
            match &self.fail_with {
                Some(message) => Err(RuntimeError::Execution(message.clone())),
                None => Ok(()),
            }
        }
    }

    /// Runtime that imports one module through the resolver.
    struct ImportingRuntime {
        module: String,
    }

    #[async_trait]
    impl Runtime for ImportingRuntime {
        async fn execute(&self, _source: &str, hooks: &RuntimeHooks) -> Result<(), RuntimeError> {
            let source = hooks.resolve(&self.module)?;
            hooks.emit(&source);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_emitted_chunks_reach_the_sink() {
        let runtime = ScriptedRuntime {
            chunks: vec!["hello".to_string(), "world".to_string()],
            fail_with: None,
        };
        let adapter = ExecutionAdapter::new(Arc::new(runtime), ModuleLibrary::new());

        adapter.execute("print('hi')").await.unwrap();
        assert_eq!(adapter.read_output(), "hello\nworld\n");
    }

    #[tokio::test]
    async fn test_reset_clears_between_runs() {
        let runtime = ScriptedRuntime {
            chunks: vec!["first run".to_string()],
            fail_with: None,
        };
        let adapter = ExecutionAdapter::new(Arc::new(runtime), ModuleLibrary::new());

        adapter.execute("x").await.unwrap();
        adapter.reset_output();
        assert_eq!(adapter.read_output(), "");
    }

    #[tokio::test]
    async fn test_missing_module_fails_with_exact_message() {
        let runtime = ImportingRuntime {
            module: "foo".to_string(),
        };
        let adapter = ExecutionAdapter::new(Arc::new(runtime), ModuleLibrary::new());

        let err = adapter.execute("import foo").await.unwrap_err();
        assert!(err.to_string().contains("File not found: 'foo'"));
    }

    #[tokio::test]
    async fn test_present_module_resolves_from_library() {
        let mut library = ModuleLibrary::new();
        library.insert("greeting", "hello from the library");
        let runtime = ImportingRuntime {
            module: "greeting".to_string(),
        };
        let adapter = ExecutionAdapter::new(Arc::new(runtime), library);

        adapter.execute("import greeting").await.unwrap();
        assert_eq!(adapter.read_output(), "hello from the library\n");
    }

    #[tokio::test]
    async fn test_partial_output_kept_on_failure() {
        let runtime = ScriptedRuntime {
            chunks: vec!["partial".to_string()],
            fail_with: Some("kaboom".to_string()),
        };
        let adapter = ExecutionAdapter::new(Arc::new(runtime), ModuleLibrary::new());

        let err = adapter.execute("x").await.unwrap_err();
        assert_eq!(err.to_string(), "kaboom");
        assert_eq!(adapter.read_output(), "partial\n");
    }
}
