//! Language namespaces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language tag. Each language owns a distinct workspace and open path.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    Clojure,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::Clojure];

    /// The language of the single-language predecessor, whose unprefixed
    /// storage keys are read as this namespace.
    pub const LEGACY: Language = Language::Python;

    /// The namespace tag used in storage keys.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Clojure => "clojure",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Clojure => "Clojure",
        }
    }

    /// Default file extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => ".py",
            Language::JavaScript => ".js",
            Language::Clojure => ".clj",
        }
    }

    /// Name of the file every fresh workspace starts with.
    pub fn default_file_name(self) -> String {
        format!("main{}", self.extension())
    }

    /// Body of the default file.
    pub fn hello_world(self) -> &'static str {
        match self {
            Language::Python => "print(\"hello world\")",
            Language::JavaScript => "console.log(\"hello world\");",
            Language::Clojure => "(println \"hello world\")",
        }
    }

    /// Syntax mode name handed to the editor.
    pub fn editor_mode(self) -> &'static str {
        self.tag()
    }

    /// Guess a language from a file path's extension.
    pub fn detect_from_path(path: &str) -> Option<Language> {
        if path.ends_with(".py") {
            Some(Language::Python)
        } else if path.ends_with(".js") {
            Some(Language::JavaScript)
        } else if path.ends_with(".clj") || path.ends_with(".cljs") {
            Some(Language::Clojure)
        } else {
            None
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when parsing an unknown language tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct ParseLanguageError(pub String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "clojure" | "clj" => Ok(Language::Clojure),
            other => Err(ParseLanguageError(other.to_string())),
        }
    }
}
