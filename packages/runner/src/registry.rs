//! One cached runner per language.

use std::collections::BTreeMap;
use std::sync::Arc;

use codeplay_vfs::Language;

use crate::config::RegistryConfig;
use crate::embedded::EmbeddedRunner;
use crate::engine::EngineProvider;
use crate::process::ProcessProvider;
use crate::runner::{Runner, RunnerKind};
use crate::sandboxed::SandboxedRunner;
use crate::worker::WorkerRunner;

/// Builds runners on first request and keeps them for the session.
///
/// Switching languages never drops a runner, so a warmed runtime stays warm
/// when the user comes back to it.
pub struct RuntimeRegistry {
    config: RegistryConfig,
    providers: BTreeMap<Language, (RunnerKind, Arc<dyn EngineProvider>)>,
    runners: BTreeMap<Language, Arc<dyn Runner>>,
}

impl RuntimeRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            providers: BTreeMap::new(),
            runners: BTreeMap::new(),
        }
    }

    /// Use `provider` instead of an interpreter process for `language`.
    pub fn with_provider(
        mut self,
        language: Language,
        kind: RunnerKind,
        provider: Arc<dyn EngineProvider>,
    ) -> Self {
        self.providers.insert(language, (kind, provider));
        self
    }

    /// The runner for `language`, built on first request.
    pub fn get(&mut self, language: Language) -> Arc<dyn Runner> {
        if let Some(runner) = self.runners.get(&language) {
            return runner.clone();
        }

        let runner = self.build(language);
        tracing::debug!(%language, kind = %runner.kind(), "created runner");
        self.runners.insert(language, runner.clone());
        runner
    }

    /// The runner for `language` if it has been built.
    pub fn peek(&self, language: Language) -> Option<Arc<dyn Runner>> {
        self.runners.get(&language).cloned()
    }

    /// Languages whose runner has been built.
    pub fn cached(&self) -> impl Iterator<Item = Language> + '_ {
        self.runners.keys().copied()
    }

    fn build(&self, language: Language) -> Arc<dyn Runner> {
        let (kind, provider) = match self.providers.get(&language) {
            Some((kind, provider)) => (*kind, provider.clone()),
            None => {
                let spec = self.config.spec(language);
                let provider: Arc<dyn EngineProvider> =
                    Arc::new(ProcessProvider::new(language, spec.clone()));
                (spec.kind, provider)
            }
        };

        let timeout = self.config.run_timeout;
        match kind {
            RunnerKind::SandboxedEval => {
                Arc::new(SandboxedRunner::new(language, provider, timeout))
            }
            RunnerKind::WorkerIsolated => Arc::new(WorkerRunner::new(language, provider, timeout)),
            RunnerKind::EmbeddedInterpreter => {
                Arc::new(EmbeddedRunner::new(language, provider, timeout))
            }
        }
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
