//! Engines backed by interpreter processes on the host.

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{RuntimeSpec, SourceMode};
use crate::engine::{Engine, EngineFault, EngineProvider, Evaluation};
use crate::error::{Result, RunnerError};

/// How long an interpreter gets to answer the availability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs each script in a fresh interpreter process.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    source_mode: SourceMode,
    value_marker: Option<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, source_mode: SourceMode) -> Self {
        Self {
            program: program.into(),
            args,
            source_mode,
            value_marker: None,
        }
    }

    pub fn from_spec(spec: &RuntimeSpec) -> Self {
        let engine = Self::new(spec.program.clone(), spec.args.clone(), spec.source_mode);
        match &spec.value_marker {
            Some(marker) => engine.with_value_marker(marker.clone()),
            None => engine,
        }
    }

    /// Read the result value from the stdout line starting with `marker`.
    pub fn with_value_marker(mut self, marker: impl Into<String>) -> Self {
        self.value_marker = Some(marker.into());
        self
    }

    fn command(&self, source: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        match self.source_mode {
            SourceMode::Stdin => {
                cmd.stdin(Stdio::piped());
            }
            SourceMode::Argument => {
                cmd.arg(source);
                cmd.stdin(Stdio::null());
            }
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Engine for ProcessEngine {
    async fn evaluate(&self, source: &str) -> std::result::Result<Evaluation, EngineFault> {
        let mut child = self
            .command(source)
            .spawn()
            .map_err(|e| EngineFault::new(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(source.as_bytes()).await {
                Ok(()) => {}
                // The child exited without reading all of its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(EngineFault::new(format!(
                        "failed to send source to {}: {}",
                        self.program, e
                    )))
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineFault::new(format!("{} did not finish: {}", self.program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let (stdout, value) = match &self.value_marker {
            Some(marker) => split_value(stdout, marker),
            None => (stdout, None),
        };

        if output.status.success() {
            Ok(Evaluation {
                stdout,
                stderr,
                value,
            })
        } else {
            Err(EngineFault {
                message: fault_message(&stderr, output.status),
                stdout,
                stderr,
            })
        }
    }
}

/// Take the last `marker` line out of `stdout` and decode its JSON string.
/// A line that does not decode is left in place.
fn split_value(stdout: String, marker: &str) -> (String, Option<String>) {
    let Some(start) = stdout.rfind(marker) else {
        return (stdout, None);
    };
    let rest = &stdout[start + marker.len()..];
    let (encoded, after) = rest.split_once('\n').unwrap_or((rest, ""));

    match serde_json::from_str::<String>(encoded) {
        Ok(value) => (format!("{}{}", &stdout[..start], after), Some(value)),
        Err(e) => {
            tracing::debug!(error = %e, "result value line did not decode");
            (stdout, None)
        }
    }
}

/// The last non-blank stderr line (usually the exception), else the status.
fn fault_message(stderr: &str, status: ExitStatus) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("process exited with {}", status))
}

/// Provides a `ProcessEngine` once the interpreter answers a probe.
#[derive(Debug, Clone)]
pub struct ProcessProvider {
    language: Language,
    spec: RuntimeSpec,
    probe_args: Vec<String>,
    probe_timeout: Duration,
}

impl ProcessProvider {
    pub fn new(language: Language, spec: RuntimeSpec) -> Self {
        Self {
            language,
            spec,
            probe_args: vec!["--version".to_string()],
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Replace the arguments used to check that the interpreter works.
    pub fn with_probe_args(mut self, args: Vec<String>) -> Self {
        self.probe_args = args;
        self
    }
}

#[async_trait]
impl EngineProvider for ProcessProvider {
    async fn acquire(&self) -> Result<Arc<dyn Engine>> {
        let program = &self.spec.program;
        tracing::debug!(language = %self.language, program, "probing interpreter");

        let probe = Command::new(program)
            .args(&self.probe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        let Ok(status) = tokio::time::timeout(self.probe_timeout, probe).await else {
            return Err(RunnerError::unavailable(
                self.language,
                format!("{} did not answer a probe within {:?}", program, self.probe_timeout),
            ));
        };

        match status {
            Ok(status) if status.success() => Ok(Arc::new(ProcessEngine::from_spec(&self.spec))),
            Ok(status) => Err(RunnerError::unavailable(
                self.language,
                format!("{} did not respond to a probe ({})", program, status),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RunnerError::unavailable(
                self.language,
                format!("{} not found on PATH", program),
            )),
            Err(e) => Err(RunnerError::unavailable(
                self.language,
                format!("failed to start {}: {}", program, e),
            )),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::VALUE_MARKER;
    use crate::runner::RunnerKind;

    fn sh(mode: SourceMode) -> ProcessEngine {
        let args = match mode {
            SourceMode::Stdin => vec!["-s".to_string()],
            SourceMode::Argument => vec!["-c".to_string()],
        };
        ProcessEngine::new("sh", args, mode)
    }

    fn sh_spec() -> RuntimeSpec {
        RuntimeSpec {
            kind: RunnerKind::SandboxedEval,
            program: "sh".to_string(),
            args: vec!["-c".to_string()],
            source_mode: SourceMode::Argument,
            value_marker: None,
        }
    }

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    #[test]
    fn value_line_is_taken_out_of_stdout() {
        let stdout = format!("a\n{VALUE_MARKER}\"line one\\nline two\"\nlate\n");
        let (rest, value) = split_value(stdout, VALUE_MARKER);
        assert_eq!(rest, "a\nlate\n");
        assert_eq!(value.as_deref(), Some("line one\nline two"));

        let (rest, value) = split_value("plain\n".to_string(), VALUE_MARKER);
        assert_eq!(rest, "plain\n");
        assert_eq!(value, None);

        let broken = format!("{VALUE_MARKER}not json\n");
        let (rest, value) = split_value(broken.clone(), VALUE_MARKER);
        assert_eq!(rest, broken);
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn marker_engine_reports_value() {
        let engine = sh(SourceMode::Argument).with_value_marker("@@value:");
        let eval = engine
            .evaluate("echo before; echo '@@value:\"7\"'")
            .await
            .unwrap();
        assert_eq!(eval.stdout, "before\n");
        assert_eq!(eval.value.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn node_prints_returned_values() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let engine = ProcessEngine::from_spec(&RuntimeSpec::default_for(Language::JavaScript));

        let eval = engine
            .evaluate("console.log('a'); return 1 + 1")
            .await
            .unwrap();
        assert_eq!(eval.stdout, "a\n");
        assert_eq!(eval.value.as_deref(), Some("2"));

        let eval = engine.evaluate("console.log('only')").await.unwrap();
        assert_eq!(eval.stdout, "only\n");
        assert_eq!(eval.value, None);

        let fault = engine
            .evaluate("throw new Error('boom')")
            .await
            .unwrap_err();
        assert_eq!(fault.message, "Error: boom");
    }

    #[tokio::test]
    async fn probe_gives_up_on_hung_interpreter() {
        let provider = ProcessProvider::new(Language::JavaScript, sh_spec())
            .with_probe_args(vec!["-c".to_string(), "sleep 5".to_string()])
            .with_probe_timeout(Duration::from_millis(50));
        match provider.acquire().await {
            Err(RunnerError::EngineUnavailable { reason, .. }) => {
                assert!(reason.contains("did not answer"));
            }
            other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn stdin_mode_captures_stdout() {
        let eval = sh(SourceMode::Stdin).evaluate("echo hello").await.unwrap();
        assert_eq!(eval.stdout, "hello\n");
        assert_eq!(eval.stderr, "");
        assert_eq!(eval.value, None);
    }

    #[tokio::test]
    async fn argument_mode_captures_both_streams() {
        let eval = sh(SourceMode::Argument)
            .evaluate("echo out; echo err >&2")
            .await
            .unwrap();
        assert_eq!(eval.stdout, "out\n");
        assert_eq!(eval.stderr, "err\n");
    }

    #[tokio::test]
    async fn failure_uses_last_stderr_line() {
        let fault = sh(SourceMode::Argument)
            .evaluate("echo partial; echo first >&2; echo 'Boom: last' >&2; exit 3")
            .await
            .unwrap_err();
        assert_eq!(fault.message, "Boom: last");
        assert_eq!(fault.stdout, "partial\n");
        assert!(fault.stderr.contains("first"));
    }

    #[tokio::test]
    async fn silent_failure_reports_status() {
        let fault = sh(SourceMode::Argument)
            .evaluate("exit 2")
            .await
            .unwrap_err();
        assert!(fault.message.starts_with("process exited with"));
    }

    #[tokio::test]
    async fn missing_program_is_a_fault() {
        let engine = ProcessEngine::new("codeplay-no-such-binary", vec![], SourceMode::Stdin);
        let fault = engine.evaluate("x").await.unwrap_err();
        assert!(fault.message.contains("failed to start"));
    }

    #[tokio::test]
    async fn provider_acquires_working_interpreter() {
        let provider = ProcessProvider::new(Language::Clojure, sh_spec())
            .with_probe_args(vec!["-c".to_string(), "exit 0".to_string()]);
        let engine = provider.acquire().await.unwrap();
        let eval = engine.evaluate("echo 3").await.unwrap();
        assert_eq!(eval.stdout, "3\n");
    }

    #[tokio::test]
    async fn provider_rejects_missing_interpreter() {
        let mut spec = sh_spec();
        spec.program = "codeplay-no-such-binary".to_string();
        let err = ProcessProvider::new(Language::Clojure, spec)
            .acquire()
            .await
            .err()
            .unwrap();
        match err {
            RunnerError::EngineUnavailable { language, reason } => {
                assert_eq!(language, Language::Clojure);
                assert!(reason.contains("not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn provider_rejects_failed_probe() {
        let provider = ProcessProvider::new(Language::Python, sh_spec())
            .with_probe_args(vec!["-c".to_string(), "exit 4".to_string()]);
        assert!(matches!(
            provider.acquire().await,
            Err(RunnerError::EngineUnavailable { .. })
        ));
    }
}
