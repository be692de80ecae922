//! Engine owned by a dedicated worker task.
//!
//! The runner never touches the engine directly. Source goes to the worker
//! over an mpsc channel and the outcome comes back on a oneshot channel.
//! Runs are serialized: a second run waits for the first reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codeplay_vfs::Language;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::Instrument;

use crate::engine::{Engine, EngineFault, EngineProvider, Evaluation};
use crate::error::{Result, RunnerError};
use crate::runner::{evaluate, ready_message, report, Lifecycle, RunId, Runner, RunnerKind, RunnerState};
use crate::sink::OutputSink;

/// Queue depth between runner and worker.
const QUEUE_CAPACITY: usize = 8;

struct WorkerRequest {
    source: String,
    reply: oneshot::Sender<std::result::Result<Evaluation, EngineFault>>,
}

pub struct WorkerRunner {
    language: Language,
    provider: Arc<dyn EngineProvider>,
    timeout: Option<Duration>,
    worker: Lifecycle<mpsc::Sender<WorkerRequest>>,
    in_flight: Mutex<()>,
}

impl WorkerRunner {
    pub fn new(
        language: Language,
        provider: Arc<dyn EngineProvider>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            language,
            provider,
            timeout,
            worker: Lifecycle::new(language),
            in_flight: Mutex::new(()),
        }
    }

    fn spawn_worker(&self, engine: Arc<dyn Engine>) -> mpsc::Sender<WorkerRequest> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(serve(self.language, engine, rx, self.timeout));
        tx
    }

    async fn round_trip(&self, source: &str) -> Result<std::result::Result<Evaluation, EngineFault>> {
        let requests = self
            .worker
            .get()
            .ok_or(RunnerError::NotLoaded(self.language))?;

        let _turn = self.in_flight.lock().await;
        let (reply, response) = oneshot::channel();
        requests
            .send(WorkerRequest {
                source: source.to_string(),
                reply,
            })
            .await
            .map_err(|_| RunnerError::WorkerGone(self.language))?;

        response
            .await
            .map_err(|_| RunnerError::WorkerGone(self.language))
    }
}

/// The worker loop. Ends when the runner drops its sender.
async fn serve(
    language: Language,
    engine: Arc<dyn Engine>,
    mut requests: mpsc::Receiver<WorkerRequest>,
    timeout: Option<Duration>,
) {
    tracing::debug!(%language, "worker started");
    while let Some(request) = requests.recv().await {
        let outcome = evaluate(engine.as_ref(), &request.source, timeout).await;
        if request.reply.send(outcome).is_err() {
            tracing::debug!(%language, "run abandoned before reply");
        }
    }
    tracing::debug!(%language, "worker stopped");
}

#[async_trait]
impl Runner for WorkerRunner {
    fn language(&self) -> Language {
        self.language
    }

    fn kind(&self) -> RunnerKind {
        RunnerKind::WorkerIsolated
    }

    fn state(&self) -> RunnerState {
        self.worker.state()
    }

    async fn load(&self, sink: &dyn OutputSink) -> Result<()> {
        self.worker
            .load(|| async {
                let engine = self.provider.acquire().await?;
                let requests = self.spawn_worker(engine);
                sink.system(&ready_message(self.language));
                Ok(requests)
            })
            .await
            .map(|_| ())
    }

    async fn run(&self, source: &str, sink: &dyn OutputSink) {
        let span = tracing::info_span!("run", run_id = %RunId::new(), language = %self.language);
        match self.round_trip(source).instrument(span).await {
            Ok(outcome) => report(sink, outcome),
            Err(e) => sink.stderr(&e.to_string()),
        }
    }
}
