//! Execution engines and their providers.
//!
//! An `Engine` evaluates one script and hands back everything it printed.
//! An `EngineProvider` is how a runner gets hold of an engine: it is called
//! once per successful load and may fail when the engine cannot be found.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::Result;

/// Output of a script that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub stdout: String,
    pub stderr: String,
    /// The value of the final expression, for engines that report one.
    pub value: Option<String>,
}

impl Evaluation {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            ..Self::default()
        }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// A script that failed: syntax error, uncaught exception, bad exit status.
///
/// Carries whatever the script printed before it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineFault {
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }
}

/// Something that can evaluate source text.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn evaluate(&self, source: &str) -> std::result::Result<Evaluation, EngineFault>;
}

/// Acquires an engine, e.g. by locating an interpreter on the host.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn Engine>>;
}
