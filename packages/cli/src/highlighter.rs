use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::core::commands::{takes_path, COMMANDS};

/// Colours the input line as it is typed: the command word cyan when known
/// and red when not, path arguments yellow, language names magenta.
#[derive(Debug, Default)]
pub struct CommandHighlighter;

impl CommandHighlighter {
    pub fn new() -> Self {
        Self
    }

    fn command_style(word: &str) -> Style {
        if COMMANDS.contains(&word) {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        }
    }

    fn argument_style(word: &str) -> Style {
        if takes_path(word) {
            Style::new().fg(Color::Yellow)
        } else if word == "lang" {
            Style::new().fg(Color::Magenta)
        } else {
            Style::new()
        }
    }
}

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let start = line.len() - line.trim_start().len();
        if start == line.len() {
            if !line.is_empty() {
                styled.push((Style::new(), line.to_string()));
            }
            return styled;
        }

        let (lead, body) = line.split_at(start);
        let split = body.find(char::is_whitespace).unwrap_or(body.len());
        let (word, rest) = body.split_at(split);
        let lowered = word.to_lowercase();

        if !lead.is_empty() {
            styled.push((Style::new(), lead.to_string()));
        }
        styled.push((Self::command_style(&lowered), word.to_string()));
        if !rest.is_empty() {
            styled.push((Self::argument_style(&lowered), rest.to_string()));
        }
        styled
    }
}
