//! The runner contract and the lifecycle every variant shares.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::engine::{Engine, EngineFault, Evaluation};
use crate::error::Result;
use crate::sink::{Channel, OutputSink};

/// Notice emitted when a run printed nothing.
pub const NO_OUTPUT: &str = "(no output)";

/// Stderr line emitted when a run exceeds its timeout.
pub const TIMED_OUT: &str = "execution timed out";

/// The three ways a runner can host its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    /// Evaluated in-process; the final value is printed.
    SandboxedEval,
    /// Owned by a dedicated worker task reached over channels.
    WorkerIsolated,
    /// Loaded interpreter with source preprocessing.
    EmbeddedInterpreter,
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerKind::SandboxedEval => "sandboxed",
            RunnerKind::WorkerIsolated => "worker",
            RunnerKind::EmbeddedInterpreter => "embedded",
        };
        f.write_str(name)
    }
}

/// Where a runner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Unloaded,
    Loading,
    Ready,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Unloaded => "unloaded",
            RunnerState::Loading => "loading",
            RunnerState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Identifies one run in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A language runtime with a lazy, memoized load.
///
/// `load` may be called any number of times, concurrently or not; the
/// engine is acquired once. A failed load leaves the runner unloaded so a
/// later call can retry. Once ready, a runner stays ready.
///
/// `run` never fails: every problem is written to the stderr channel.
#[async_trait]
pub trait Runner: Send + Sync {
    fn language(&self) -> Language;

    fn kind(&self) -> RunnerKind;

    fn state(&self) -> RunnerState;

    fn is_ready(&self) -> bool {
        self.state() == RunnerState::Ready
    }

    /// Acquire the engine. Emits the ready notice on the system channel
    /// the one time it succeeds.
    async fn load(&self, sink: &dyn OutputSink) -> Result<()>;

    /// Evaluate `source`, writing its output to `sink`.
    async fn run(&self, source: &str, sink: &dyn OutputSink);
}

/// "Python runtime ready." and friends.
pub fn ready_message(language: Language) -> String {
    format!("{} runtime ready.", language.display_name())
}

/// Memoized load state shared by all runner variants.
pub(crate) struct Lifecycle<T> {
    language: Language,
    cell: OnceCell<T>,
    loading: AtomicBool,
}

impl<T> Lifecycle<T> {
    pub(crate) fn new(language: Language) -> Self {
        Self {
            language,
            cell: OnceCell::new(),
            loading: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> RunnerState {
        if self.cell.initialized() {
            RunnerState::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            RunnerState::Loading
        } else {
            RunnerState::Unloaded
        }
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Run `init` unless a previous call already succeeded. Callers that
    /// arrive while `init` is in flight wait for it instead of starting
    /// their own.
    pub(crate) async fn load<F, Fut>(&self, init: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.cell
            .get_or_try_init(|| async {
                let _loading = LoadingFlag::raise(&self.loading);
                tracing::info!(language = %self.language, "loading runtime");

                let result = init().await;

                match &result {
                    Ok(_) => tracing::info!(language = %self.language, "runtime ready"),
                    Err(e) => {
                        tracing::warn!(language = %self.language, error = %e, "runtime failed to load")
                    }
                }
                result
            })
            .await
    }
}

/// Marks a load in flight. Lowered on drop, so a cancelled load reads as
/// unloaded again.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Evaluate with an optional deadline. A missed deadline is a fault.
pub(crate) async fn evaluate(
    engine: &dyn Engine,
    source: &str,
    timeout: Option<Duration>,
) -> std::result::Result<Evaluation, EngineFault> {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, engine.evaluate(source)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(?limit, "run timed out");
                Err(EngineFault::new(TIMED_OUT))
            }
        },
        None => engine.evaluate(source).await,
    }
}

/// Write one run's outcome to `sink`.
///
/// Output is trimmed at the end. A failed run still shows the stdout it
/// captured, ahead of its stderr, rather than stderr and the error alone.
/// The fault message follows unless its first line already appears in the
/// captured stderr. A run that printed nothing gets `NO_OUTPUT`.
pub(crate) fn report(sink: &dyn OutputSink, outcome: std::result::Result<Evaluation, EngineFault>) {
    let mut printed = false;

    match outcome {
        Ok(evaluation) => {
            printed |= emit(sink, Channel::Stdout, &evaluation.stdout);
            printed |= emit(sink, Channel::Stderr, &evaluation.stderr);
            if let Some(value) = evaluation.value {
                printed |= emit(sink, Channel::Stdout, &value);
            }
        }
        Err(fault) => {
            printed |= emit(sink, Channel::Stdout, &fault.stdout);
            printed |= emit(sink, Channel::Stderr, &fault.stderr);

            let headline = fault.message.lines().next().unwrap_or("");
            if fault.stderr.trim().is_empty() || !fault.stderr.contains(headline) {
                printed |= emit(sink, Channel::Stderr, &fault.message);
            }
        }
    }

    if !printed {
        sink.system(NO_OUTPUT);
    }
}

fn emit(sink: &dyn OutputSink, channel: Channel, text: &str) -> bool {
    let text = text.trim_end();
    if text.is_empty() {
        return false;
    }
    sink.write(channel, text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use crate::sink::BufferSink;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn report_trims_and_routes() {
        let sink = BufferSink::new();
        report(
            &sink,
            Ok(Evaluation {
                stdout: "hello world\n\n".to_string(),
                stderr: "warning\n".to_string(),
                value: None,
            }),
        );
        assert_eq!(
            sink.lines(),
            vec![
                (Channel::Stdout, "hello world".to_string()),
                (Channel::Stderr, "warning".to_string()),
            ]
        );
    }

    #[test]
    fn report_silence() {
        let sink = BufferSink::new();
        report(&sink, Ok(Evaluation::default()));
        assert_eq!(sink.lines(), vec![(Channel::System, NO_OUTPUT.to_string())]);

        // Whitespace is silence too
        let sink = BufferSink::new();
        report(&sink, Ok(Evaluation::stdout("\n  \n")));
        assert_eq!(sink.channel(Channel::System), vec![NO_OUTPUT]);
    }

    #[test]
    fn report_prints_value() {
        let sink = BufferSink::new();
        report(&sink, Ok(Evaluation::value("3")));
        assert_eq!(sink.channel(Channel::Stdout), vec!["3"]);
        assert!(sink.channel(Channel::System).is_empty());
    }

    #[test]
    fn report_skips_duplicate_fault_message() {
        let sink = BufferSink::new();
        report(
            &sink,
            Err(EngineFault::new("ZeroDivisionError: division by zero")
                .with_stderr("Traceback (most recent call last):\nZeroDivisionError: division by zero\n")),
        );
        assert_eq!(
            sink.channel(Channel::Stderr),
            vec!["Traceback (most recent call last):\nZeroDivisionError: division by zero"]
        );
    }

    #[test]
    fn report_adds_new_fault_message() {
        let sink = BufferSink::new();
        report(
            &sink,
            Err(EngineFault::new("SyntaxError: bad input\n  at line 1")
                .with_stdout("partial\n")
                .with_stderr("some warning")),
        );
        assert_eq!(sink.channel(Channel::Stdout), vec!["partial"]);
        assert_eq!(
            sink.channel(Channel::Stderr),
            vec!["some warning", "SyntaxError: bad input\n  at line 1"]
        );
    }

    #[test]
    fn report_fault_without_stderr() {
        let sink = BufferSink::new();
        report(&sink, Err(EngineFault::new(TIMED_OUT)));
        assert_eq!(sink.lines(), vec![(Channel::Stderr, TIMED_OUT.to_string())]);
    }

    #[tokio::test]
    async fn lifecycle_memoizes_success() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new(Language::Python);
        let calls = AtomicUsize::new(0);
        assert_eq!(lifecycle.state(), RunnerState::Unloaded);

        for _ in 0..3 {
            let value = lifecycle
                .load(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(*value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.state(), RunnerState::Ready);
    }

    #[tokio::test]
    async fn lifecycle_retries_after_failure() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new(Language::Clojure);

        let first = lifecycle
            .load(|| async { Err(RunnerError::unavailable(Language::Clojure, "offline")) })
            .await;
        assert!(first.is_err());
        assert_eq!(lifecycle.state(), RunnerState::Unloaded);

        let second = lifecycle.load(|| async { Ok(1) }).await;
        assert_eq!(second.ok().copied(), Some(1));
        assert_eq!(lifecycle.state(), RunnerState::Ready);
    }

    #[tokio::test]
    async fn lifecycle_recovers_from_cancelled_load() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new(Language::JavaScript);

        let slow = lifecycle.load(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        });
        assert!(tokio::time::timeout(Duration::from_millis(20), slow)
            .await
            .is_err());
        assert_eq!(lifecycle.state(), RunnerState::Unloaded);

        let value = lifecycle.load(|| async { Ok(2) }).await.unwrap();
        assert_eq!(*value, 2);
        assert_eq!(lifecycle.state(), RunnerState::Ready);
    }

    #[tokio::test]
    async fn lifecycle_reports_loading_while_in_flight() {
        let lifecycle = Arc::new(Lifecycle::<u32>::new(Language::Python));
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let task = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move {
                lifecycle
                    .load(|| async {
                        let _ = gate.await;
                        Ok(3)
                    })
                    .await
                    .map(|v| *v)
                    .ok()
            })
        };

        while lifecycle.state() == RunnerState::Unloaded {
            tokio::task::yield_now().await;
        }
        assert_eq!(lifecycle.state(), RunnerState::Loading);

        release.send(()).unwrap();
        assert_eq!(task.await.unwrap(), Some(3));
        assert_eq!(lifecycle.state(), RunnerState::Ready);
    }

    #[tokio::test]
    async fn lifecycle_shares_in_flight_load() {
        let lifecycle = Arc::new(Lifecycle::<u32>::new(Language::JavaScript));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let lifecycle = lifecycle.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                lifecycle
                    .load(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(5)
                    })
                    .await
                    .map(|v| *v)
                    .ok()
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), Some(5));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ready_messages() {
        assert_eq!(ready_message(Language::Python), "Python runtime ready.");
        assert_eq!(ready_message(Language::Clojure), "Clojure runtime ready.");
    }

    #[test]
    fn kind_serde() {
        let json = serde_json::to_string(&RunnerKind::EmbeddedInterpreter).unwrap();
        assert_eq!(json, "\"embedded_interpreter\"");
    }
}
