//! End-to-end flows through the session controller with scripted engines.

use std::sync::Arc;

use async_trait::async_trait;
use codeplay_kv_store::{DiskStore, KvStore, MemoryStore};
use codeplay_runner::testing::{ScriptedEngine, ScriptedProvider};
use codeplay_runner::{
    Channel, EngineFault, Evaluation, OutputSink, RunnerKind, RunnerState, RuntimeRegistry,
    NO_OUTPUT,
};
use codeplay_session::{
    Console, CreateRequest, Highlighter, HighlighterLoader, MemoryConsole, SessionController,
    SessionError, HIGHLIGHTING_READY, HIGHLIGHTING_UNAVAILABLE, LOADING_HIGHLIGHTING,
};
use codeplay_vfs::{Language, WorkspaceStore};
use collection_literals::btree;

fn python_registry(provider: ScriptedProvider) -> RuntimeRegistry {
    RuntimeRegistry::default().with_provider(
        Language::Python,
        RunnerKind::EmbeddedInterpreter,
        Arc::new(provider.for_language(Language::Python)),
    )
}

fn hello_engine() -> ScriptedEngine {
    ScriptedEngine::new(|source| {
        if source.contains("print(") {
            Ok(Evaluation::stdout("hello world\n"))
        } else {
            Ok(Evaluation::default())
        }
    })
}

fn boot<S: KvStore>(
    storage: S,
    registry: RuntimeRegistry,
) -> SessionController<S, MemoryConsole> {
    SessionController::boot(
        WorkspaceStore::new(storage),
        registry,
        MemoryConsole::new(),
        None,
    )
}

#[tokio::test]
async fn first_run_loads_then_prints() {
    let mut session = boot(MemoryStore::new(), python_registry(ScriptedProvider::new(hello_engine())));
    session.console().stdout("stale");

    session.run().await;

    let console = session.console();
    assert_eq!(console.clears(), 1);
    assert_eq!(
        console.lines(),
        vec![
            (Channel::System, "Loading Python runtime...".to_string()),
            (Channel::System, "Python runtime ready.".to_string()),
            (Channel::Stdout, "hello world".to_string()),
        ]
    );
    assert_eq!(session.runner_state(Language::Python), RunnerState::Ready);
}

#[tokio::test]
async fn second_run_skips_load() {
    let provider = ScriptedProvider::new(hello_engine());
    let acquisitions = provider.acquisitions();
    let mut session = boot(MemoryStore::new(), python_registry(provider));

    session.run().await;
    session.handle_edit("x = 1").unwrap();
    session.run().await;

    assert_eq!(acquisitions.get(), 1);
    assert_eq!(
        session.console().lines(),
        vec![(Channel::System, NO_OUTPUT.to_string())]
    );
}

#[tokio::test]
async fn run_uses_and_saves_editor_text() {
    let provider = ScriptedProvider::new(ScriptedEngine::echo());
    let engine = provider.engine();
    let mut session = boot(MemoryStore::new(), python_registry(provider));

    session.editor_mut().set_value("// comment\nprint(2)");
    session.run().await;

    assert_eq!(engine.sources(), vec!["# comment\nprint(2)"]);
    let stored = session.store().storage().get("workspace:python").unwrap();
    assert!(stored.contains("print(2)"));
}

#[tokio::test]
async fn failed_load_is_one_stderr_line_and_retries() {
    let provider = ScriptedProvider::new(hello_engine()).failing(1);
    let mut session = boot(MemoryStore::new(), python_registry(provider));

    session.run().await;
    assert_eq!(
        session.console().channel(Channel::Stderr),
        vec!["python runtime unavailable: scripted failure"]
    );
    assert_eq!(session.runner_state(Language::Python), RunnerState::Unloaded);

    session.run().await;
    assert_eq!(
        session.console().channel(Channel::Stdout),
        vec!["hello world"]
    );
}

#[tokio::test]
async fn program_errors_do_not_break_the_runner() {
    let engine = ScriptedEngine::new(|_| {
        Err(EngineFault::new("ZeroDivisionError: division by zero")
            .with_stderr("Traceback (most recent call last):\nZeroDivisionError: division by zero"))
    });
    let mut session = boot(MemoryStore::new(), python_registry(ScriptedProvider::new(engine)));

    session.run().await;
    assert_eq!(session.console().channel(Channel::Stderr).len(), 1);
    assert_eq!(session.runner_state(Language::Python), RunnerState::Ready);
}

#[tokio::test]
async fn runners_stay_warm_across_switches() {
    let python = ScriptedProvider::new(hello_engine());
    let python_loads = python.acquisitions();
    let javascript = ScriptedProvider::new(ScriptedEngine::new(|_| Ok(Evaluation::value("2"))));
    let registry = python_registry(python).with_provider(
        Language::JavaScript,
        RunnerKind::WorkerIsolated,
        Arc::new(javascript),
    );
    let mut session = boot(MemoryStore::new(), registry);

    session.run().await;
    session.switch_language(Language::JavaScript);
    session.run().await;
    assert_eq!(session.console().channel(Channel::Stdout), vec!["2"]);

    session.switch_language(Language::Python);
    assert_eq!(session.runner_state(Language::Python), RunnerState::Ready);
    assert_eq!(session.runner_state(Language::JavaScript), RunnerState::Ready);
    session.run().await;
    assert_eq!(python_loads.get(), 1);
}

#[test]
fn language_round_trip_keeps_edits() {
    let mut session = boot(MemoryStore::new(), RuntimeRegistry::default());
    assert_eq!(session.open_path(), Some("main.py"));
    session.editor_mut().set_value("print(1)");

    session.switch_language(Language::JavaScript);
    session.switch_language(Language::Python);

    assert_eq!(session.open_path(), Some("main.py"));
    assert_eq!(session.editor().value(), "print(1)");
}

#[test]
fn javascript_files_get_js_extension() {
    let mut session = boot(MemoryStore::new(), RuntimeRegistry::default());
    session.switch_language(Language::JavaScript);

    let path = session.create_item(CreateRequest::file("x")).unwrap();
    assert_eq!(path, "x.js");
    assert_eq!(session.open_path(), Some("x.js"));
}

#[test]
fn path_conflicts_surface_as_vfs_errors() {
    let mut session = boot(MemoryStore::new(), RuntimeRegistry::default());
    let err = session
        .create_item(CreateRequest::file("inner").within("main.py"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Vfs(_)));
    assert_eq!(session.workspace().len(), 1);
}

#[test]
fn session_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let disk = DiskStore::new(dir.path()).unwrap();
        let mut session = boot(disk, RuntimeRegistry::default());
        session.create_item(CreateRequest::folder("src")).unwrap();
        session
            .create_item(CreateRequest::file("app").within("src"))
            .unwrap();
        session.handle_edit("print('app')").unwrap();
        session.switch_language(Language::Clojure);
    }

    let disk = DiskStore::new(dir.path()).unwrap();
    let mut session = boot(disk, RuntimeRegistry::default());
    assert_eq!(session.active_language(), Language::Clojure);

    session.switch_language(Language::Python);
    assert_eq!(session.open_path(), Some("src/app.py"));
    assert_eq!(session.editor().value(), "print('app')");
    assert_eq!(session.breadcrumb(), "src / app.py");
}

#[test]
fn corrupt_state_boots_default() {
    let storage = MemoryStore::with_data(btree! {
        "workspace:python" => "{not json",
        "openpath:python" => "gone.py",
    });
    let session = boot(storage, RuntimeRegistry::default());

    assert_eq!(session.open_path(), Some("main.py"));
    assert_eq!(session.editor().value(), "print(\"hello world\")");
    assert_eq!(session.workspace().len(), 1);
}

#[test]
fn legacy_workspace_is_adopted() {
    let storage = MemoryStore::with_data(btree! {
        "pyplay_fs" => r#"{"old.py":{"type":"file","content":"print('legacy')"}}"#,
        "pyplay_open" => "old.py",
    });
    let session = boot(storage, RuntimeRegistry::default());

    assert_eq!(session.open_path(), Some("old.py"));
    assert_eq!(session.editor().value(), "print('legacy')");
    assert!(session.workspace().contains("main.py"));
    assert_eq!(session.store().storage().get("pyplay_fs"), None);
}

struct Upper;

impl Highlighter for Upper {
    fn highlight(&self, _mode: &str, text: &str) -> String {
        text.to_uppercase()
    }
}

struct Loader {
    works: bool,
}

#[async_trait]
impl HighlighterLoader for Loader {
    async fn load(&self) -> codeplay_session::Result<Arc<dyn Highlighter>> {
        if self.works {
            Ok(Arc::new(Upper))
        } else {
            Err(SessionError::HighlightUnavailable("no colors".to_string()))
        }
    }
}

#[tokio::test]
async fn editor_upgrade_reports_progress() {
    let mut session = boot(MemoryStore::new(), RuntimeRegistry::default());

    assert!(session.upgrade_editor(&Loader { works: true }).await);
    assert_eq!(
        session.console().channel(Channel::System),
        vec![LOADING_HIGHLIGHTING, HIGHLIGHTING_READY]
    );
    assert!(session.editor().is_enhanced());
    assert_eq!(session.editor().render(), "PRINT(\"HELLO WORLD\")");
    assert!(session.editor().is_visible());
}

#[tokio::test]
async fn failed_upgrade_keeps_plain_editor() {
    let mut session = boot(MemoryStore::new(), RuntimeRegistry::default());
    session.console().clear();

    assert!(!session.upgrade_editor(&Loader { works: false }).await);
    assert_eq!(
        session.console().channel(Channel::System),
        vec![LOADING_HIGHLIGHTING, HIGHLIGHTING_UNAVAILABLE]
    );
    assert!(!session.editor().is_enhanced());
}
