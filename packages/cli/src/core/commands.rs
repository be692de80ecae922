//! Shell command parsing.
//!
//! Commands:
//! - `ls` / `tree` - Show the workspace tree
//! - `open <path>` - Open a file in the editor
//! - `cat [path]` - Print a file, by default the open one
//! - `new <path>` - Create a file (`src/app` creates `app` in `src`)
//! - `mkdir <path>` - Create a folder
//! - `rm <path>` - Delete a file or folder and everything below it
//! - `edit [path]` - Replace the open file's text, line by line until `.`
//! - `append <text>` - Add a line to the end of the open file
//! - `fold <path>` - Collapse or expand a folder in the tree
//! - `run` - Run the open file
//! - `lang [name]` - Show languages or switch to one
//! - `status` - Show the session state
//! - `help` - Show help
//! - `exit` - Save and quit

use nu_ansi_term::{Color, Style};

/// Every command word, for completion and highlighting.
pub const COMMANDS: &[&str] = &[
    "ls", "tree", "open", "cat", "new", "mkdir", "rm", "edit", "append", "fold", "run", "lang",
    "status", "help", "exit", "quit",
];

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tree,
    Open(String),
    Cat(Option<String>),
    New(String),
    Mkdir(String),
    Remove(String),
    Edit(Option<String>),
    Append(String),
    Fold(String),
    Run,
    Lang(Option<String>),
    Status,
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(input: &str) -> Result<Option<Command>, ParseError> {
    let input = input.trim_start();
    if input.trim().is_empty() {
        return Ok(None);
    }

    let (word, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
    let arg = rest.trim();
    let optional = || (!arg.is_empty()).then(|| arg.to_string());
    let required = |usage: &'static str| {
        if arg.is_empty() {
            Err(ParseError::Usage(usage))
        } else {
            Ok(arg.to_string())
        }
    };

    let command = match word.to_lowercase().as_str() {
        "ls" | "tree" => Command::Tree,
        "open" | "o" => Command::Open(required("open <path>")?),
        "cat" => Command::Cat(optional()),
        "new" | "touch" => Command::New(required("new <path>")?),
        "mkdir" => Command::Mkdir(required("mkdir <path>")?),
        "rm" => Command::Remove(required("rm <path>")?),
        "edit" => Command::Edit(optional()),
        // Leading whitespace is kept so indented lines can be appended.
        "append" => Command::Append(rest.trim_end().to_string()),
        "fold" => Command::Fold(required("fold <path>")?),
        "run" | "r" => Command::Run,
        "lang" => Command::Lang(optional()),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        _ => return Err(ParseError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

/// Whether `command`'s argument is a workspace path.
pub fn takes_path(command: &str) -> bool {
    matches!(
        command,
        "open" | "cat" | "new" | "mkdir" | "rm" | "edit" | "fold"
    )
}

/// Split `a/b/c` into its parent `a/b` and name `c`.
pub fn split_parent(path: &str) -> (Option<&str>, &str) {
    match path.trim_matches('/').rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, path.trim_matches('/')),
    }
}

pub fn command_description(cmd: &str) -> &'static str {
    match cmd {
        "ls" | "tree" => "Show the workspace tree",
        "open" => "Open a file",
        "cat" => "Print a file",
        "new" => "Create a file",
        "mkdir" => "Create a folder",
        "rm" => "Delete a file or folder",
        "edit" => "Replace the open file's text",
        "append" => "Append a line to the open file",
        "fold" => "Collapse or expand a folder",
        "run" => "Run the open file",
        "lang" => "Show or switch language",
        "status" => "Show session state",
        "help" => "Show help",
        "exit" | "quit" => "Save and quit",
        _ => "",
    }
}

pub fn format_help() -> String {
    let cmd = Style::new().fg(Color::Cyan).bold();
    let arg = Style::new().fg(Color::Yellow);

    let rows = [
        ("ls", ""),
        ("open", "<path>"),
        ("cat", "[path]"),
        ("new", "<path>"),
        ("mkdir", "<path>"),
        ("rm", "<path>"),
        ("edit", "[path]"),
        ("append", "<text>"),
        ("fold", "<path>"),
        ("run", ""),
        ("lang", "[name]"),
        ("status", ""),
        ("help", ""),
        ("exit", ""),
    ];

    let mut help = format!("{}\n\n", Style::new().bold().paint("Commands:"));
    for (name, args) in rows {
        let usage = format!("{} {}", cmd.paint(name), arg.paint(args));
        let padding = 16usize.saturating_sub(name.len() + 1 + args.len());
        help.push_str(&format!(
            "  {}{}{}\n",
            usage,
            " ".repeat(padding),
            command_description(name)
        ));
    }
    help.push_str(&format!(
        "\n{} python, javascript, clojure\n",
        Style::new().bold().paint("Languages:")
    ));
    help.push_str("While editing, a line containing only '.' saves; Ctrl+C cancels.");
    help
}
