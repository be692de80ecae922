//! Orchestrates the workspace, the editor, the runners and the console.

use codeplay_kv_store::KvStore;
use codeplay_runner::{OutputSink, RunnerState, RuntimeRegistry};
use codeplay_vfs::{join_path, project, Entry, EntryKind, Language, TreeNode, Workspace, WorkspaceStore};

use crate::console::Console;
use crate::editor::{Editor, HighlighterLoader};
use crate::error::{Result, SessionError};
use crate::state::SessionState;

pub const LOADING_HIGHLIGHTING: &str = "Loading syntax highlighting...";
pub const HIGHLIGHTING_READY: &str = "Syntax highlighting ready.";
pub const HIGHLIGHTING_UNAVAILABLE: &str = "Syntax highlighting unavailable (using plain text mode).";
pub const NO_FILE_OPEN: &str = "No file open";

/// What the creation dialog hands over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub name: String,
    pub kind: EntryKind,
    /// Folder to create in. `None` is the workspace root.
    pub parent: Option<String>,
}

impl CreateRequest {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            parent: None,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
            parent: None,
        }
    }

    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// The session: one active language, its workspace, and at most one open
/// file shown in the editor.
///
/// Every mutation is persisted before the method returns. Edits to the open
/// file are flushed from the editor into the workspace before anything
/// that could lose them: opening another file, switching language, running.
pub struct SessionController<S, C> {
    state: SessionState,
    store: WorkspaceStore<S>,
    registry: RuntimeRegistry,
    editor: Editor,
    console: C,
}

impl<S: KvStore, C: Console> SessionController<S, C> {
    /// Start a session.
    ///
    /// The language is `requested`, else the last active one, else Python.
    /// The recorded open file is reopened if it still exists.
    pub fn boot(
        store: WorkspaceStore<S>,
        registry: RuntimeRegistry,
        console: C,
        requested: Option<Language>,
    ) -> Self {
        let language = requested
            .or_else(|| store.load_language())
            .unwrap_or_default();

        let mut controller = Self {
            state: SessionState {
                active_language: language,
                ..SessionState::default()
            },
            store,
            registry,
            editor: Editor::new(),
            console,
        };

        tracing::info!(%language, "booting session");
        controller.store.save_language(language);
        controller.enter(language);
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_language(&self) -> Language {
        self.state.active_language
    }

    pub fn open_path(&self) -> Option<&str> {
        self.state.open_path()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.state.workspace
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn store(&self) -> &WorkspaceStore<S> {
        &self.store
    }

    /// The tree of the active workspace.
    pub fn tree(&self) -> TreeNode {
        project(&self.state.workspace)
    }

    /// The open file as `a / b / c.py`.
    pub fn breadcrumb(&self) -> String {
        match &self.state.open_path {
            Some(path) => path.split('/').collect::<Vec<_>>().join(" / "),
            None => NO_FILE_OPEN.to_string(),
        }
    }

    pub fn runner_state(&self, language: Language) -> RunnerState {
        self.registry
            .peek(language)
            .map(|runner| runner.state())
            .unwrap_or(RunnerState::Unloaded)
    }

    /// Make `language` active, saving the current one first.
    pub fn switch_language(&mut self, language: Language) {
        if language == self.state.active_language {
            return;
        }

        tracing::info!(from = %self.state.active_language, to = %language, "switching language");
        self.persist();
        self.state.active_language = language;
        self.store.save_language(language);
        self.enter(language);
    }

    /// Show `path` in the editor.
    ///
    /// Falls back to the default file, then the first file, when `path` is
    /// not a file. Returns the path actually opened, or `None` when the
    /// workspace has no files.
    pub fn open_file(&mut self, path: &str) -> Option<String> {
        let target = self.resolve(path)?;
        if target != path {
            tracing::debug!(requested = path, opened = %target, "open fell back");
        }

        self.flush();
        self.save_workspace();

        let content = self
            .state
            .workspace
            .get(&target)
            .map(|entry| entry.text().to_string())
            .unwrap_or_default();
        let mode = Language::detect_from_path(&target)
            .unwrap_or(self.state.active_language)
            .editor_mode();

        self.state.open_path = Some(target.clone());
        self.store
            .save_open_path(Some(&target), self.state.active_language);

        self.editor.set_mode(mode);
        self.editor.set_value(&content);
        self.editor.set_visible(true);
        Some(target)
    }

    /// Create a file or folder. Files are opened, folders expanded.
    pub fn create_item(&mut self, request: CreateRequest) -> Result<String> {
        let requested = join_path(request.parent.as_deref(), &request.name);
        let path = self.state.workspace.create_entry(
            &requested,
            request.kind,
            self.state.active_language,
        )?;
        self.save_workspace();

        match request.kind {
            EntryKind::File => {
                self.open_file(&path);
            }
            EntryKind::Folder => self.state.set_folder_open(&path, true),
        }
        Ok(path)
    }

    /// Delete `path` and everything below it. Returns the removed paths.
    ///
    /// If the open file goes with it, the editor is cleared and hidden.
    pub fn delete_item(&mut self, path: &str) -> Vec<String> {
        self.flush();
        let removed = self.state.workspace.delete_entry(path);
        if removed.is_empty() {
            return removed;
        }

        if self.state.open_path_within(path) {
            self.state.open_path = None;
            self.store.save_open_path(None, self.state.active_language);
            self.editor.set_value("");
            self.editor.set_visible(false);
        }

        self.save_workspace();
        removed
    }

    /// A user edit of the open file: the editor is updated, its listeners
    /// notified, and the workspace persisted.
    pub fn handle_edit(&mut self, text: &str) -> Result<()> {
        let open = self
            .state
            .open_path
            .clone()
            .filter(|path| self.state.workspace.is_file(path))
            .ok_or(SessionError::NoOpenFile)?;

        self.editor.apply_edit(text);
        self.state.workspace.set_content(&open, text);
        self.save_workspace();
        Ok(())
    }

    /// Collapse or expand a folder. Returns whether it is now open.
    pub fn toggle_folder(&mut self, path: &str) -> bool {
        let open = !self.state.is_folder_open(path);
        self.state.set_folder_open(path, open);
        open
    }

    pub fn is_folder_open(&self, path: &str) -> bool {
        self.state.is_folder_open(path)
    }

    /// Run the editor's text with the active language's runner.
    ///
    /// The console is cleared first. Load failures are reported on stderr
    /// and leave the runner unloaded so the next run retries.
    pub async fn run(&mut self) {
        self.persist();

        let language = self.state.active_language;
        let source = self.editor.value().to_string();
        self.console.clear();

        let runner = self.registry.get(language);
        if !runner.is_ready() {
            if let Err(e) = runner.load(&self.console).await {
                self.console.stderr(&e.to_string());
                return;
            }
        }
        runner.run(&source, &self.console).await;
    }

    /// Try to switch the editor to its highlighted surface. Returns whether
    /// the editor is enhanced afterwards.
    pub async fn upgrade_editor(&mut self, loader: &dyn HighlighterLoader) -> bool {
        if self.editor.is_enhanced() {
            return true;
        }

        self.console.system(LOADING_HIGHLIGHTING);
        match loader.load().await {
            Ok(highlighter) => {
                self.editor.upgrade(highlighter);
                self.console.system(HIGHLIGHTING_READY);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "editor upgrade failed");
                self.console.system(HIGHLIGHTING_UNAVAILABLE);
                false
            }
        }
    }

    /// Flush the editor and write workspace and open path to storage.
    pub fn persist(&mut self) {
        self.flush();
        self.save_workspace();
        self.store
            .save_open_path(self.state.open_path.as_deref(), self.state.active_language);
    }

    /// Load `language`'s namespace and open its file.
    fn enter(&mut self, language: Language) {
        let mut workspace = self.store.load_workspace(language);
        let default_file = language.default_file_name();
        if !workspace.contains(&default_file) {
            workspace.insert(default_file.clone(), Entry::file(language.hello_world()));
            self.store.save_workspace(&workspace, language);
        }

        let recorded = self
            .store
            .load_open_path(language)
            .filter(|path| workspace.is_file(path));

        self.state.workspace = workspace;
        // The editor still holds the previous namespace's text; nothing to flush.
        self.state.open_path = None;

        let target = recorded.unwrap_or(default_file);
        if self.open_file(&target).is_none() {
            self.editor.set_value("");
            self.editor.set_visible(false);
        }
    }

    fn resolve(&self, path: &str) -> Option<String> {
        let workspace = &self.state.workspace;
        if workspace.is_file(path) {
            return Some(path.to_string());
        }

        let default_file = self.state.active_language.default_file_name();
        if workspace.is_file(&default_file) {
            return Some(default_file);
        }

        workspace.first_file().map(str::to_string)
    }

    fn flush(&mut self) {
        if let Some(open) = &self.state.open_path {
            self.state.workspace.set_content(open, self.editor.value());
        }
    }

    fn save_workspace(&mut self) {
        self.store
            .save_workspace(&self.state.workspace, self.state.active_language);
    }
}
