//! In-process evaluation against an acquired evaluator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;
use tracing::Instrument;

use crate::engine::{Engine, EngineProvider};
use crate::error::{Result, RunnerError};
use crate::runner::{evaluate, ready_message, report, Lifecycle, RunId, Runner, RunnerKind, RunnerState};
use crate::sink::OutputSink;

pub struct SandboxedRunner {
    language: Language,
    provider: Arc<dyn EngineProvider>,
    timeout: Option<Duration>,
    engine: Lifecycle<Arc<dyn Engine>>,
}

impl SandboxedRunner {
    pub fn new(
        language: Language,
        provider: Arc<dyn EngineProvider>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            language,
            provider,
            timeout,
            engine: Lifecycle::new(language),
        }
    }
}

#[async_trait]
impl Runner for SandboxedRunner {
    fn language(&self) -> Language {
        self.language
    }

    fn kind(&self) -> RunnerKind {
        RunnerKind::SandboxedEval
    }

    fn state(&self) -> RunnerState {
        self.engine.state()
    }

    async fn load(&self, sink: &dyn OutputSink) -> Result<()> {
        self.engine
            .load(|| async {
                let engine = self.provider.acquire().await?;
                sink.system(&ready_message(self.language));
                Ok(engine)
            })
            .await
            .map(|_| ())
    }

    async fn run(&self, source: &str, sink: &dyn OutputSink) {
        let Some(engine) = self.engine.get() else {
            sink.stderr(&RunnerError::NotLoaded(self.language).to_string());
            return;
        };

        let span = tracing::info_span!("run", run_id = %RunId::new(), language = %self.language);
        let outcome = evaluate(engine.as_ref(), source, self.timeout)
            .instrument(span)
            .await;
        report(sink, outcome);
    }
}
