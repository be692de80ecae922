//! Scripted engines for exercising runners without interpreters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;

use crate::engine::{Engine, EngineFault, EngineProvider, Evaluation};
use crate::error::{Result, RunnerError};

type Handler = dyn Fn(&str) -> std::result::Result<Evaluation, EngineFault> + Send + Sync;

/// An engine whose behavior is a closure over the source text.
pub struct ScriptedEngine {
    handler: Box<Handler>,
    delay: Option<Duration>,
    sources: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Evaluation, EngineFault> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Prints its source back on stdout.
    pub fn echo() -> Self {
        Self::new(|source| Ok(Evaluation::stdout(source)))
    }

    /// Prints nothing.
    pub fn silent() -> Self {
        Self::new(|_| Ok(Evaluation::default()))
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every source evaluated so far.
    pub fn sources(&self) -> Vec<String> {
        match self.sources.lock() {
            Ok(sources) => sources.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn evaluate(&self, source: &str) -> std::result::Result<Evaluation, EngineFault> {
        match self.sources.lock() {
            Ok(mut sources) => sources.push(source.to_string()),
            Err(poisoned) => poisoned.into_inner().push(source.to_string()),
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(source)
    }
}

/// A shared counter readable after the provider moved into a runner.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out one shared `ScriptedEngine`, optionally failing first.
pub struct ScriptedProvider {
    engine: Arc<ScriptedEngine>,
    language: Language,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    acquisitions: Counter,
}

impl ScriptedProvider {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            language: Language::default(),
            failures_left: AtomicUsize::new(0),
            delay: None,
            acquisitions: Counter::default(),
        }
    }

    /// A provider that never produces an engine.
    pub fn unavailable() -> Self {
        Self::new(ScriptedEngine::silent()).failing(usize::MAX)
    }

    /// Fail the first `times` acquisitions.
    pub fn failing(self, times: usize) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn for_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sleep this long inside every acquisition.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Counts calls to `acquire`, successful or not.
    pub fn acquisitions(&self) -> Counter {
        self.acquisitions.clone()
    }

    pub fn engine(&self) -> Arc<ScriptedEngine> {
        self.engine.clone()
    }
}

#[async_trait]
impl EngineProvider for ScriptedProvider {
    async fn acquire(&self) -> Result<Arc<dyn Engine>> {
        self.acquisitions.bump();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RunnerError::unavailable(self.language, "scripted failure"));
        }

        Ok(self.engine.clone())
    }
}
