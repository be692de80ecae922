use codeplay_runner::Channel;
use serde::{Deserialize, Serialize};

/// What the user did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", content = "line", rename_all = "lowercase")]
pub enum Input {
    Line(String),
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D.
    Eof,
}

/// A rendering hint for one output line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Printed as-is; may already carry ANSI codes.
    #[default]
    Normal,
    /// A shell error, shown with an `Error:` prefix.
    Error,
    /// Program stderr.
    Stderr,
    Info,
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub text: String,
    #[serde(default)]
    pub style: OutputStyle,
}

impl Output {
    pub fn styled(style: OutputStyle, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(OutputStyle::Normal, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(OutputStyle::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(OutputStyle::Info, text)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(OutputStyle::Banner, text)
    }

    /// A line a program or runtime wrote to the console.
    pub fn console(channel: Channel, text: impl Into<String>) -> Self {
        let style = match channel {
            Channel::Stdout => OutputStyle::Normal,
            Channel::Stderr => OutputStyle::Stderr,
            Channel::System => OutputStyle::Info,
        };
        Self::styled(style, text)
    }
}

/// What the prompt shows before the next input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    pub language: String,
    /// Breadcrumb of the open file.
    pub location: String,
    /// Set while `edit` is collecting lines.
    pub collecting: bool,
    /// Workspace paths, for completion.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Why the shell loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    /// Ctrl+D.
    Eof,
}
