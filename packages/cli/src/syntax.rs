//! ANSI syntax highlighting for source shown by `cat`.

use std::sync::Arc;

use async_trait::async_trait;
use codeplay_session::{Highlighter, HighlighterLoader, SessionError};
use nu_ansi_term::{Color, Style};

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "False", "finally", "for", "from", "if", "import", "in", "is", "lambda",
    "None", "not", "or", "pass", "raise", "return", "True", "try", "while", "with", "yield",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default", "else",
    "export", "false", "for", "function", "if", "import", "let", "new", "null", "return",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "while",
];

const CLOJURE_KEYWORDS: &[&str] = &[
    "def", "defn", "defmacro", "do", "fn", "if", "let", "loop", "recur", "when", "cond", "ns",
    "nil", "true", "false",
];

/// Highlights keywords, strings, numbers and comments.
#[derive(Debug, Default)]
pub struct AnsiHighlighter;

impl AnsiHighlighter {
    fn keywords(mode: &str) -> &'static [&'static str] {
        match mode {
            "python" => PYTHON_KEYWORDS,
            "javascript" => JAVASCRIPT_KEYWORDS,
            "clojure" => CLOJURE_KEYWORDS,
            _ => &[],
        }
    }

    fn comment_marker(mode: &str) -> Option<&'static str> {
        match mode {
            "python" => Some("#"),
            "javascript" => Some("//"),
            "clojure" => Some(";"),
            _ => None,
        }
    }

    fn highlight_line(&self, mode: &str, line: &str, out: &mut String) {
        let keywords = Self::keywords(mode);
        let comment = Self::comment_marker(mode);
        let mut rest = line;

        while !rest.is_empty() {
            if comment.is_some_and(|marker| rest.starts_with(marker)) {
                out.push_str(&Style::new().fg(Color::DarkGray).paint(rest).to_string());
                return;
            }

            let first = rest.chars().next().unwrap_or(' ');
            let len = if first == '"' || first == '\'' {
                let end = rest[1..].find(first).map(|i| i + 2).unwrap_or(rest.len());
                out.push_str(&Color::Green.paint(&rest[..end]).to_string());
                end
            } else if first.is_alphanumeric() || first == '_' || first == '-' {
                let end = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '?'))
                    .unwrap_or(rest.len());
                let word = &rest[..end];
                if keywords.contains(&word) {
                    out.push_str(&Color::Magenta.bold().paint(word).to_string());
                } else if word.chars().all(|c| c.is_ascii_digit() || c == '_') {
                    out.push_str(&Color::Yellow.paint(word).to_string());
                } else {
                    out.push_str(word);
                }
                end
            } else {
                out.push(first);
                first.len_utf8()
            };
            rest = &rest[len..];
        }
    }
}

impl Highlighter for AnsiHighlighter {
    fn highlight(&self, mode: &str, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.highlight_line(mode, line, &mut out);
        }
        out
    }
}

/// Hands out an [`AnsiHighlighter`] unless colour is switched off.
#[derive(Debug, Clone, Default)]
pub struct AnsiLoader {
    no_color: bool,
}

impl AnsiLoader {
    /// Honours the `NO_COLOR` convention.
    pub fn from_env() -> Self {
        Self {
            no_color: std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
        }
    }

    pub fn disabled() -> Self {
        Self { no_color: true }
    }
}

#[async_trait]
impl HighlighterLoader for AnsiLoader {
    async fn load(&self) -> codeplay_session::Result<Arc<dyn Highlighter>> {
        if self.no_color {
            return Err(SessionError::HighlightUnavailable(
                "NO_COLOR is set".to_string(),
            ));
        }
        Ok(Arc::new(AnsiHighlighter))
    }
}
