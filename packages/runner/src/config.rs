//! How each language's runtime is built.

use std::collections::BTreeMap;
use std::time::Duration;

use codeplay_vfs::Language;
use serde::{Deserialize, Serialize};

use crate::runner::RunnerKind;

/// How source text reaches an interpreter process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Written to the child's stdin, which is then closed.
    #[default]
    Stdin,
    /// Appended as the final command-line argument.
    Argument,
}

/// Starts the stdout line that carries a script's result value.
pub const VALUE_MARKER: &str = "\u{1e}codeplay-value:";

/// Runs stdin as a function body with `console` in scope and reports a
/// non-`undefined` return value after `VALUE_MARKER`, JSON encoded.
const NODE_PRELUDE: &str = r#"
const source = require('fs').readFileSync(0, 'utf8');
try {
  const result = new Function('console', source)(console);
  if (result !== undefined) {
    process.stdout.write('\x1ecodeplay-value:' + JSON.stringify(String(result)) + '\n');
  }
} catch (err) {
  console.error(String(err));
  process.exitCode = 1;
}
"#;

/// The runner variant and interpreter command for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub kind: RunnerKind,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub source_mode: SourceMode,
    /// When set, a stdout line starting with this marker holds the result
    /// value as a JSON string.
    #[serde(default)]
    pub value_marker: Option<String>,
}

impl RuntimeSpec {
    pub fn default_for(language: Language) -> Self {
        match language {
            Language::Python => Self {
                kind: RunnerKind::EmbeddedInterpreter,
                program: "python3".to_string(),
                args: vec!["-".to_string()],
                source_mode: SourceMode::Stdin,
                value_marker: None,
            },
            Language::JavaScript => Self {
                kind: RunnerKind::WorkerIsolated,
                program: "node".to_string(),
                args: vec!["-e".to_string(), NODE_PRELUDE.to_string()],
                source_mode: SourceMode::Stdin,
                value_marker: Some(VALUE_MARKER.to_string()),
            },
            // bb prints the value of the last form itself.
            Language::Clojure => Self {
                kind: RunnerKind::SandboxedEval,
                program: "bb".to_string(),
                args: vec!["-e".to_string()],
                source_mode: SourceMode::Argument,
                value_marker: None,
            },
        }
    }
}

/// Settings shared by every runner the registry builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Per-language overrides. Languages not listed use `RuntimeSpec::default_for`.
    pub runtimes: BTreeMap<Language, RuntimeSpec>,
    /// Abandon a run after this long. `None` waits forever.
    pub run_timeout: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            runtimes: BTreeMap::new(),
            run_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RegistryConfig {
    pub fn spec(&self, language: Language) -> RuntimeSpec {
        self.runtimes
            .get(&language)
            .cloned()
            .unwrap_or_else(|| RuntimeSpec::default_for(language))
    }
}
