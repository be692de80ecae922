use std::sync::{Arc, Mutex, PoisonError};

use reedline::{Completer, Span, Suggestion};

use crate::core::commands::{command_description, takes_path, COMMANDS};

/// Workspace paths shared between the shell core and the completer.
pub type SharedPaths = Arc<Mutex<Vec<String>>>;

/// Completes command names, then workspace paths.
pub struct ShellCompleter {
    paths: SharedPaths,
}

impl ShellCompleter {
    pub fn new(paths: SharedPaths) -> Self {
        Self { paths }
    }
}

impl Completer for ShellCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();
        let typing_word = !line_to_pos.ends_with(' ');
        let prefix = if typing_word {
            words.last().copied().unwrap_or("")
        } else {
            ""
        };
        let span = Span::new(pos - prefix.len(), pos);

        if words.is_empty() || (words.len() == 1 && typing_word) {
            return COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(prefix))
                .map(|cmd| suggestion(cmd, Some(command_description(cmd)), span))
                .collect();
        }

        let command = words[0];
        if !takes_path(command) {
            return Vec::new();
        }

        let paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        paths
            .iter()
            .filter(|path| path.starts_with(prefix))
            .map(|path| suggestion(path, None, span))
            .collect()
    }
}

fn suggestion(value: &str, description: Option<&str>, span: Span) -> Suggestion {
    Suggestion {
        value: value.to_string(),
        description: description.map(str::to_string),
        style: None,
        extra: None,
        span,
        append_whitespace: true,
        match_indices: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer(paths: &[&str]) -> ShellCompleter {
        ShellCompleter::new(Arc::new(Mutex::new(
            paths.iter().map(|p| p.to_string()).collect(),
        )))
    }

    fn values(suggestions: Vec<Suggestion>) -> Vec<String> {
        suggestions.into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn completes_command_names() {
        let mut completer = completer(&[]);
        let suggestions = completer.complete("ca", 2);
        assert_eq!(values(suggestions.clone()), vec!["cat"]);
        assert_eq!(suggestions[0].span, Span::new(0, 2));
        assert!(suggestions[0].description.is_some());
    }

    #[test]
    fn completes_workspace_paths() {
        let mut completer = completer(&["main.py", "src", "src/app.py"]);
        let suggestions = completer.complete("open src/", 9);
        assert_eq!(values(suggestions.clone()), vec!["src/app.py"]);
        assert_eq!(suggestions[0].span, Span::new(5, 9));

        assert_eq!(completer.complete("rm ", 3).len(), 3);
    }

    #[test]
    fn commands_without_paths_get_nothing() {
        let mut completer = completer(&["main.py"]);
        assert!(completer.complete("run ", 4).is_empty());
        assert!(completer.complete("lang m", 6).is_empty());
    }

    #[test]
    fn shared_paths_update_live() {
        let paths: SharedPaths = Arc::new(Mutex::new(Vec::new()));
        let mut completer = ShellCompleter::new(paths.clone());
        assert!(completer.complete("cat ", 4).is_empty());

        paths.lock().unwrap().push("main.js".to_string());
        assert_eq!(values(completer.complete("cat ", 4)), vec!["main.js"]);
    }
}
