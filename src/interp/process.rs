use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use super::{Runtime, RuntimeError, RuntimeHooks};

/// Interpreter capability backed by a subprocess.
///
/// Source text is piped to stdin, stdout lines are routed to the output hook
/// as they arrive, stderr is collected into the failure message. Each run
/// gets a scratch directory with the module library projected into it, so
/// sandboxed imports see exactly the files the resolver serves.
pub struct ProcessRuntime {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    scratch_root: PathBuf,
}

impl ProcessRuntime {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        timeout_secs: u64,
        scratch_root: PathBuf,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: Duration::from_secs(timeout_secs),
            scratch_root,
        }
    }
}

/// Project the sandboxed filesystem into `dir`.
fn materialize_library(dir: &Path, hooks: &RuntimeHooks) -> Result<(), RuntimeError> {
    for name in hooks.manifest() {
        if name.starts_with('/') || name.split('/').any(|part| part == "..") {
            return Err(RuntimeError::Launch(format!(
                "module name escapes sandbox: {name}"
            )));
        }
        let source = hooks.resolve(name)?;
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RuntimeError::Launch(e.to_string()))?;
        }
        std::fs::write(&path, source).map_err(|e| RuntimeError::Launch(e.to_string()))?;
    }
    Ok(())
}

#[async_trait]
impl Runtime for ProcessRuntime {
    async fn execute(&self, source: &str, hooks: &RuntimeHooks) -> Result<(), RuntimeError> {
        let run_dir = self.scratch_root.join(format!("run-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&run_dir).map_err(|e| RuntimeError::Launch(e.to_string()))?;
        if let Err(e) = materialize_library(&run_dir, hooks) {
            let _ = std::fs::remove_dir_all(&run_dir);
            return Err(e);
        }

        let mut child = match Command::new(&self.command)
            .args(&self.args)
            .current_dir(&run_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = std::fs::remove_dir_all(&run_dir);
                return Err(RuntimeError::Launch(e.to_string()));
            }
        };

        // Write the source and close stdin so the interpreter sees EOF.
        {
            let mut stdin = child.stdin.take().expect("stdin piped");
            if let Err(e) = stdin.write_all(source.as_bytes()).await {
                let _ = child.kill().await;
                let _ = std::fs::remove_dir_all(&run_dir);
                return Err(RuntimeError::Launch(format!(
                    "failed to write source to stdin: {e}"
                )));
            }
        }

        let stdout = child.stdout.take().expect("stdout piped");
        let out_hooks = hooks.clone();
        let stdout_handle = tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                out_hooks.emit(&line);
            }
        });

        let stderr = child.stderr.take().expect("stderr piped");
        let stderr_handle = tokio::spawn(async move {
            let mut collected = String::new();
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(source = "interpreter-stderr", "{}", line);
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        });

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(result) => match result {
                Ok(status) => status,
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&run_dir);
                    return Err(RuntimeError::Launch(format!(
                        "failed to wait on interpreter: {e}"
                    )));
                }
            },
            Err(_elapsed) => {
                tracing::warn!(
                    "interpreter timed out after {}s, killing",
                    self.timeout.as_secs()
                );
                let _ = child.kill().await;
                stdout_handle.abort();
                stderr_handle.abort();
                let _ = std::fs::remove_dir_all(&run_dir);
                return Err(RuntimeError::Timeout(self.timeout.as_secs()));
            }
        };

        let _ = stdout_handle.await;
        let stderr_text = stderr_handle.await.unwrap_or_default();
        let _ = std::fs::remove_dir_all(&run_dir);

        if !status.success() {
            let message = stderr_text.trim();
            if message.is_empty() {
                return Err(RuntimeError::Execution(format!(
                    "interpreter exited with {status}"
                )));
            }
            return Err(RuntimeError::Execution(message.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::interp::library::ModuleLibrary;

    fn hooks_for(library: ModuleLibrary, captured: Arc<Mutex<Vec<String>>>) -> RuntimeHooks {
        let manifest = library.names();
        let library = Arc::new(library);
        RuntimeHooks::new(
            Arc::new(move |chunk: &str| captured.lock().unwrap().push(chunk.to_string())),
            Arc::new(move |name: &str| library.resolve(name)),
            manifest,
        )
    }

    #[test]
    fn test_materialize_writes_library_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ModuleLibrary::new();
        library.insert("components/weather.py", "def get_weather(city): return 21");
        let hooks = hooks_for(library, Arc::new(Mutex::new(Vec::new())));

        materialize_library(dir.path(), &hooks).unwrap();
        let written = std::fs::read_to_string(dir.path().join("components/weather.py")).unwrap();
        assert!(written.contains("get_weather"));
    }

    #[test]
    fn test_materialize_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = ModuleLibrary::new();
        library.insert("../evil.py", "");
        let hooks = hooks_for(library, Arc::new(Mutex::new(Vec::new())));

        let err = materialize_library(dir.path(), &hooks).unwrap_err();
        assert!(matches!(err, RuntimeError::Launch(_)));
    }

    #[tokio::test]
    async fn test_stdout_lines_are_emitted() {
        let scratch = tempfile::tempdir().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let hooks = hooks_for(ModuleLibrary::new(), captured.clone());

        // `cat` echoes the piped source back, one emit per line.
        let runtime = ProcessRuntime::new(
            "sh",
            vec!["-c".to_string(), "cat".to_string()],
            10,
            scratch.path().to_path_buf(),
        );
        runtime.execute("hello\nworld", &hooks).await.unwrap();

        let lines = captured.lock().unwrap().clone();
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_surfaces_stderr() {
        let scratch = tempfile::tempdir().unwrap();
        let hooks = hooks_for(ModuleLibrary::new(), Arc::new(Mutex::new(Vec::new())));

        let runtime = ProcessRuntime::new(
            "sh",
            vec![
                "-c".to_string(),
                "cat > /dev/null; echo boom 1>&2; exit 3".to_string(),
            ],
            10,
            scratch.path().to_path_buf(),
        );
        let err = runtime.execute("ignored", &hooks).await.unwrap_err();
        match err {
            RuntimeError::Execution(message) => assert!(message.contains("boom")),
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_command_is_a_launch_error() {
        let scratch = tempfile::tempdir().unwrap();
        let hooks = hooks_for(ModuleLibrary::new(), Arc::new(Mutex::new(Vec::new())));

        let runtime = ProcessRuntime::new(
            "definitely-not-a-real-interpreter",
            vec![],
            10,
            scratch.path().to_path_buf(),
        );
        let err = runtime.execute("print(1)", &hooks).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Launch(_)));
    }
}
