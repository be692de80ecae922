//! An interpreter loaded as an external asset.
//!
//! Loading is announced before it starts, since acquiring the interpreter
//! can take a while. Source is preprocessed before evaluation and all
//! output is buffered until the run ends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;
use tracing::Instrument;

use crate::engine::{Engine, EngineProvider};
use crate::error::{Result, RunnerError};
use crate::preprocess::slash_comments_to_hash;
use crate::runner::{evaluate, ready_message, report, Lifecycle, RunId, Runner, RunnerKind, RunnerState};
use crate::sink::OutputSink;

pub struct EmbeddedRunner {
    language: Language,
    provider: Arc<dyn EngineProvider>,
    timeout: Option<Duration>,
    engine: Lifecycle<Arc<dyn Engine>>,
}

impl EmbeddedRunner {
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

    fn preprocess(&self, source: &str) -> String {
        match self.language {
            Language::Python => slash_comments_to_hash(source),
            _ => source.to_string(),
        }
    }
}

#[async_trait]
impl Runner for EmbeddedRunner {
    fn language(&self) -> Language {
        self.language
    }

    fn kind(&self) -> RunnerKind {
        RunnerKind::EmbeddedInterpreter
    }

    fn state(&self) -> RunnerState {
        self.engine.state()
    }

    async fn load(&self, sink: &dyn OutputSink) -> Result<()> {
        self.engine
            .load(|| async {
                sink.system(&format!(
                    "Loading {} runtime...",
                    self.language.display_name()
                ));
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

        let source = self.preprocess(source);
        let span = tracing::info_span!("run", run_id = %RunId::new(), language = %self.language);
        let outcome = evaluate(engine.as_ref(), &source, self.timeout)
            .instrument(span)
            .await;
        report(sink, outcome);
    }
}
