//! Reedline-backed terminal host.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu, Signal, Vi,
};

use crate::completer::{SharedPaths, ShellCompleter};
use crate::highlighter::CommandHighlighter;
use crate::io::{Input, IoError, IoHost, Output, OutputStyle, PromptConfig};

/// Explicit `vi` / `emacs` choice, set by `--vi` and `--emacs`.
pub const EDIT_MODE_ENV: &str = "CODEPLAY_EDIT_MODE";

const MENU: &str = "completion_menu";
const HISTORY_SIZE: usize = 1000;

pub struct TerminalHost {
    editor: Reedline,
    prompt: PromptConfig,
    paths: SharedPaths,
}

impl TerminalHost {
    /// Build the line editor. History is kept at `history` when given.
    pub fn new(history: Option<PathBuf>) -> io::Result<Self> {
        let paths: SharedPaths = Arc::new(Mutex::new(Vec::new()));

        let mut editor = Reedline::create()
            .with_completer(Box::new(ShellCompleter::new(paths.clone())))
            .with_highlighter(Box::new(CommandHighlighter::new()))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu()))
            .with_edit_mode(edit_mode(should_use_vi_mode()));

        if let Some(path) = history {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_SIZE, path) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => tracing::warn!(error = %e, "history unavailable"),
            }
        }

        Ok(Self {
            editor,
            prompt: PromptConfig::default(),
            paths,
        })
    }
}

fn completion_menu() -> Box<ColumnarMenu> {
    Box::new(
        ColumnarMenu::default()
            .with_name(MENU)
            .with_text_style(Style::new().fg(Color::Cyan))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
    )
}

/// Tab opens the completion menu, then cycles through it.
fn tab_completes() -> ReedlineEvent {
    ReedlineEvent::UntilFound(vec![
        ReedlineEvent::Menu(MENU.to_string()),
        ReedlineEvent::MenuNext,
    ])
}

fn edit_mode(vi: bool) -> Box<dyn EditMode> {
    if vi {
        let mut insert = default_vi_insert_keybindings();
        insert.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab_completes());
        return Box::new(Vi::new(insert, default_vi_normal_keybindings()));
    }

    let mut keys = default_emacs_keybindings();
    keys.add_binding(KeyModifiers::NONE, KeyCode::Tab, tab_completes());
    keys.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('d'),
        ReedlineEvent::Edit(vec![EditCommand::Clear]),
    );
    Box::new(Emacs::new(keys))
}

impl IoHost for TerminalHost {
    fn read(&mut self) -> Result<Input, IoError> {
        let prompt = TerminalPrompt(&self.prompt);
        match self.editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => Ok(Input::Line(line)),
            Ok(Signal::CtrlC) => Ok(Input::Interrupt),
            Ok(Signal::CtrlD) => Ok(Input::Eof),
            Err(e) => Err(IoError::Terminal(e.to_string())),
        }
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        let text = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => format!("{} {}", Color::Red.bold().paint("Error:"), output.text),
            OutputStyle::Stderr => Color::Red.paint(output.text).to_string(),
            OutputStyle::Info => Color::Cyan.paint(output.text).to_string(),
            OutputStyle::Banner => Color::Cyan.bold().paint(output.text).to_string(),
        };
        writeln!(io::stdout(), "{}", text)?;
        Ok(())
    }

    fn set_prompt(&mut self, prompt: PromptConfig) -> Result<(), IoError> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone_from(&prompt.paths);
        self.prompt = prompt;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}

/// `python main.py >`, or a bare `|` gutter while `edit` collects lines.
struct TerminalPrompt<'a>(&'a PromptConfig);

impl Prompt for TerminalPrompt<'_> {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let config = self.0;
        if config.collecting {
            return Cow::Owned(Color::DarkGray.paint(&config.location).to_string());
        }
        Cow::Owned(format!(
            "{} {}",
            Color::Blue.bold().paint(&config.language),
            Color::Yellow.paint(&config.location)
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        let marker = if self.0.collecting {
            Color::DarkGray.paint("|")
        } else {
            match edit_mode {
                PromptEditMode::Vi(PromptViMode::Normal) => Color::Blue.bold().paint(":"),
                _ => Color::Green.bold().paint(">"),
            }
        };
        Cow::Owned(format!(" {} ", marker))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let state = match history_search.status {
            PromptHistorySearchStatus::Passing => "search",
            PromptHistorySearchStatus::Failing => "no match",
        };
        Cow::Owned(format!("[{}: {}] ", state, history_search.term))
    }
}

/// Vi mode when `CODEPLAY_EDIT_MODE` asks for it, or else when `EDITOR`,
/// `VISUAL` or an inputrc points at vi. `CODEPLAY_EDIT_MODE=emacs` wins.
fn should_use_vi_mode() -> bool {
    match std::env::var(EDIT_MODE_ENV).map(|m| m.to_lowercase()).as_deref() {
        Ok("emacs") => return false,
        Ok("vi") | Ok("vim") => return true,
        _ => {}
    }

    ["EDITOR", "VISUAL"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| is_vi_editor(&editor))
        || inputrc_candidates()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .any(|content| inputrc_wants_vi(&content))
}

fn inputrc_candidates() -> impl Iterator<Item = PathBuf> {
    [
        std::env::var_os("INPUTRC").map(PathBuf::from),
        dirs::home_dir().map(|home| home.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ]
    .into_iter()
    .flatten()
}

fn is_vi_editor(editor: &str) -> bool {
    let name = Path::new(editor)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(editor)
        .to_lowercase();
    name.contains("vim") || name == "vi"
}

fn inputrc_wants_vi(content: &str) -> bool {
    content.lines().any(|line| {
        let words: Vec<&str> = line.split_whitespace().collect();
        words == ["set", "editing-mode", "vi"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vi_editors_are_detected() {
        assert!(is_vi_editor("vim"));
        assert!(is_vi_editor("/usr/bin/nvim"));
        assert!(is_vi_editor("vi"));
        assert!(!is_vi_editor("emacs"));
        assert!(!is_vi_editor("/usr/bin/nano"));
    }

    #[test]
    fn inputrc_editing_mode() {
        assert!(inputrc_wants_vi("$include /etc/inputrc\nset editing-mode vi\n"));
        assert!(inputrc_wants_vi("  set   editing-mode   vi"));
        assert!(!inputrc_wants_vi("set editing-mode emacs"));
        assert!(!inputrc_wants_vi("# set editing-mode vi"));
    }

    #[test]
    fn prompt_shows_language_and_file() {
        let config = PromptConfig {
            language: "python".to_string(),
            location: "src / app.py".to_string(),
            ..PromptConfig::default()
        };
        let left = TerminalPrompt(&config).render_prompt_left().into_owned();
        assert!(left.contains("python"));
        assert!(left.contains("src / app.py"));
    }

    #[test]
    fn collecting_prompt_is_a_gutter() {
        let config = PromptConfig {
            collecting: true,
            ..PromptConfig::default()
        };
        let indicator = TerminalPrompt(&config)
            .render_prompt_indicator(PromptEditMode::Emacs)
            .into_owned();
        assert!(indicator.contains('|'));
    }
}
