//! Host-independent shell loop.
//!
//! The core owns the session controller and a current-thread tokio runtime.
//! Each command runs to completion before the next line is read, so runs are
//! never interleaved.

pub mod commands;

use std::io;

use codeplay_kv_store::KvStore;
use codeplay_session::{CreateRequest, HighlighterLoader, SessionController, NO_FILE_OPEN};
use codeplay_vfs::{Language, TreeNode};
use nu_ansi_term::Color;
use tokio::runtime::Runtime;

use crate::console::PendingConsole;
use crate::io::{ExitReason, Input, IoError, IoHost, Output, PromptConfig};
use commands::{split_parent, Command};

pub type Session<S> = SessionController<S, PendingConsole>;

/// The shell: reads commands from a host and applies them to a session.
pub struct ShellCore<S: KvStore> {
    session: Session<S>,
    runtime: Runtime,
    /// Lines typed so far during `edit`.
    collecting: Option<Vec<String>>,
    persistent: bool,
}

impl<S: KvStore> ShellCore<S> {
    pub fn new(session: Session<S>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            session,
            runtime,
            collecting: None,
            persistent: false,
        })
    }

    /// Whether the session's storage outlives the process; shown by `status`.
    pub fn with_persistence(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting.is_some()
    }

    /// Try to turn on syntax highlighting for `cat`.
    pub fn upgrade_editor(&mut self, loader: &dyn HighlighterLoader) -> bool {
        self.runtime.block_on(self.session.upgrade_editor(loader))
    }

    /// Run until the user exits.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        self.write_banner(io)?;
        self.deliver(io)?;

        loop {
            io.set_prompt(self.prompt())?;

            let line = match io.read()? {
                Input::Line(line) => line,
                Input::Eof => return self.quit(io, ExitReason::Eof),
                Input::Interrupt => {
                    let message = if self.collecting.take().is_some() {
                        "Edit cancelled."
                    } else {
                        "^C (use 'exit' to quit)"
                    };
                    io.write(Output::info(message))?;
                    continue;
                }
            };

            if let Some(lines) = self.collecting.as_mut() {
                if line.trim_end() == "." {
                    self.finish_edit(io)?;
                } else {
                    lines.push(line);
                }
                continue;
            }

            match commands::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Exit)) => return self.quit(io, ExitReason::UserExit),
                Ok(Some(command)) => self.execute(command, io)?,
                Err(e) => io.write(Output::error(e.to_string()))?,
            }

            self.deliver(io)?;
            io.flush()?;
        }
    }

    fn quit(&mut self, io: &mut impl IoHost, reason: ExitReason) -> Result<ExitReason, IoError> {
        self.session.persist();
        io.write(Output::info("Goodbye!"))?;
        io.flush()?;
        Ok(reason)
    }

    fn execute(&mut self, command: Command, io: &mut impl IoHost) -> Result<(), IoError> {
        tracing::debug!(?command, "executing");
        match command {
            Command::Tree => {
                for line in self.render_tree() {
                    io.write(Output::normal(line))?;
                }
            }
            Command::Open(path) => match self.session.open_file(&path) {
                Some(opened) if opened == path => {
                    io.write(Output::info(format!("Opened {}", opened)))?;
                }
                Some(opened) => {
                    io.write(Output::info(format!(
                        "{} is not a file, opened {}",
                        path, opened
                    )))?;
                }
                None => io.write(Output::error("Workspace has no files"))?,
            },
            Command::Cat(path) => self.cat(path.as_deref(), io)?,
            Command::New(path) => {
                let (parent, name) = split_parent(&path);
                let mut request = CreateRequest::file(name);
                if let Some(parent) = parent {
                    request = request.within(parent);
                }
                match self.session.create_item(request) {
                    Ok(created) => io.write(Output::info(format!("Created {}", created)))?,
                    Err(e) => io.write(Output::error(e.to_string()))?,
                }
            }
            Command::Mkdir(path) => {
                let (parent, name) = split_parent(&path);
                let mut request = CreateRequest::folder(name);
                if let Some(parent) = parent {
                    request = request.within(parent);
                }
                match self.session.create_item(request) {
                    Ok(created) => io.write(Output::info(format!("Created {}/", created)))?,
                    Err(e) => io.write(Output::error(e.to_string()))?,
                }
            }
            Command::Remove(path) => {
                let removed = self.session.delete_item(&path);
                if removed.is_empty() {
                    io.write(Output::error(format!("{}: no such file or folder", path)))?;
                } else {
                    io.write(Output::info(format!("Removed {}", removed.join(", "))))?;
                }
            }
            Command::Edit(path) => self.start_edit(path.as_deref(), io)?,
            Command::Append(text) => {
                let current = self.session.editor().value();
                let updated = if current.is_empty() {
                    text
                } else {
                    format!("{}\n{}", current.trim_end_matches('\n'), text)
                };
                if let Err(e) = self.session.handle_edit(&updated) {
                    io.write(Output::error(e.to_string()))?;
                }
            }
            Command::Fold(path) => {
                let is_folder = self
                    .session
                    .tree()
                    .find(&path)
                    .is_some_and(|node| node.is_folder());
                if !is_folder {
                    io.write(Output::error(format!("{}: not a folder", path)))?;
                } else if self.session.toggle_folder(&path) {
                    io.write(Output::info(format!("Expanded {}", path)))?;
                } else {
                    io.write(Output::info(format!("Collapsed {}", path)))?;
                }
            }
            Command::Run => {
                if self.session.open_path().is_none() {
                    io.write(Output::error(NO_FILE_OPEN))?;
                } else {
                    self.runtime.block_on(self.session.run());
                }
            }
            Command::Lang(None) => {
                let active = self.session.active_language();
                for language in Language::ALL {
                    let marker = if language == active { "*" } else { " " };
                    io.write(Output::normal(format!(
                        "{} {:<12}{}",
                        marker,
                        language.tag(),
                        language.display_name()
                    )))?;
                }
            }
            Command::Lang(Some(name)) => match name.parse::<Language>() {
                Ok(language) => {
                    self.session.switch_language(language);
                    io.write(Output::info(format!(
                        "Switched to {} ({})",
                        language.display_name(),
                        self.session.breadcrumb()
                    )))?;
                }
                Err(e) => io.write(Output::error(e.to_string()))?,
            },
            Command::Status => {
                for line in self.status() {
                    io.write(Output::normal(line))?;
                }
            }
            Command::Help => io.write(Output::normal(commands::format_help()))?,
            Command::Exit => {}
        }
        Ok(())
    }

    fn cat(&self, path: Option<&str>, io: &mut impl IoHost) -> Result<(), IoError> {
        let open = self.session.open_path();
        match path {
            None if open.is_none() => io.write(Output::error(NO_FILE_OPEN)),
            Some(path) if Some(path) != open => match self.session.workspace().get(path) {
                Some(entry) if entry.is_file() => io.write(Output::normal(entry.text())),
                Some(_) => io.write(Output::error(format!("{}: is a folder", path))),
                None => io.write(Output::error(format!("{}: no such file", path))),
            },
            _ => io.write(Output::normal(self.session.editor().render())),
        }
    }

    fn start_edit(&mut self, path: Option<&str>, io: &mut impl IoHost) -> Result<(), IoError> {
        if let Some(path) = path {
            if self.session.open_path() != Some(path) && !self.session.workspace().is_file(path) {
                return io.write(Output::error(format!("{}: no such file", path)));
            }
            self.session.open_file(path);
        }

        let Some(open) = self.session.open_path() else {
            return io.write(Output::error(NO_FILE_OPEN));
        };
        io.write(Output::info(format!(
            "Editing {}. Enter the new text, then '.' on its own line.",
            open
        )))?;
        self.collecting = Some(Vec::new());
        Ok(())
    }

    fn finish_edit(&mut self, io: &mut impl IoHost) -> Result<(), IoError> {
        let lines = self.collecting.take().unwrap_or_default();
        match self.session.handle_edit(&lines.join("\n")) {
            Ok(()) => io.write(Output::info(format!(
                "Saved {} ({} lines)",
                self.session.breadcrumb(),
                lines.len()
            ))),
            Err(e) => io.write(Output::error(e.to_string())),
        }
    }

    /// The tree with collapsed folders' children hidden and the open file marked.
    fn render_tree(&self) -> Vec<String> {
        fn visit<S: KvStore>(
            session: &Session<S>,
            node: &TreeNode,
            depth: usize,
            out: &mut Vec<String>,
        ) {
            for child in &node.children {
                let indent = "  ".repeat(depth);
                if child.is_folder() {
                    let open = session.is_folder_open(&child.path);
                    let arrow = if open { "▾" } else { "▸" };
                    out.push(format!(
                        "{}{} {}",
                        indent,
                        arrow,
                        Color::Blue.bold().paint(format!("{}/", child.name))
                    ));
                    if open {
                        visit(session, child, depth + 1, out);
                    }
                } else if session.open_path() == Some(child.path.as_str()) {
                    out.push(format!(
                        "{}  {} {}",
                        indent,
                        Color::Green.bold().paint(&child.name),
                        Color::Green.paint("*")
                    ));
                } else {
                    out.push(format!("{}  {}", indent, child.name));
                }
            }
        }

        let tree = self.session.tree();
        if tree.children.is_empty() {
            return vec!["(empty workspace)".to_string()];
        }
        let mut out = Vec::new();
        visit(&self.session, &tree, 0, &mut out);
        out
    }

    fn status(&self) -> Vec<String> {
        let active = self.session.active_language();
        let runtimes = Language::ALL
            .into_iter()
            .map(|language| {
                format!("{} {}", language.tag(), self.session.runner_state(language))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let editor = if self.session.editor().is_enhanced() {
            "highlighted"
        } else {
            "plain"
        };
        let storage = if self.persistent { "disk" } else { "memory" };

        vec![
            format!("language: {}", active.display_name()),
            format!("file:     {}", self.session.breadcrumb()),
            format!("files:    {}", self.session.workspace().len()),
            format!("editor:   {} ({})", editor, self.session.editor().mode()),
            format!("runtimes: {}", runtimes),
            format!("storage:  {}", storage),
        ]
    }

    fn prompt(&self) -> PromptConfig {
        PromptConfig {
            language: self.session.active_language().tag().to_string(),
            location: self.session.breadcrumb(),
            collecting: self.collecting.is_some(),
            paths: self
                .session
                .workspace()
                .paths()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Hand pending console lines to the host.
    fn deliver(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        for output in self.session.console().drain() {
            io.write(output)?;
        }
        Ok(())
    }

    fn write_banner(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write(Output::banner(format!(
            "codeplay {} - {} playground",
            env!("CARGO_PKG_VERSION"),
            Language::ALL
                .iter()
                .map(|l| l.display_name())
                .collect::<Vec<_>>()
                .join(" / ")
        )))?;
        io.write(Output::banner("Type 'help' for available commands."))?;
        Ok(())
    }
}
