//! # codeplay runners
//!
//! Language runtimes behind one contract. A `Runner` owns a lazily acquired
//! engine and moves through `Unloaded → Loading → Ready`; it never moves
//! back. Three variants host engines differently:
//!
//! - `SandboxedRunner`: evaluates in-process and prints the final value
//! - `WorkerRunner`: engine lives in a worker task, reached over channels
//! - `EmbeddedRunner`: announced load, preprocessed source, buffered output
//!
//! Engines come from an `EngineProvider`. By default that is a
//! `ProcessProvider` which locates an interpreter (`python3`, `node`, `bb`)
//! on the host. The `RuntimeRegistry` builds one runner per language on
//! first use and caches it.
//!
//! ```text
//! RuntimeRegistry ──get(lang)──► Arc<dyn Runner>
//!                                   │ load()  ──► EngineProvider::acquire()
//!                                   │ run()   ──► Engine::evaluate()
//!                                   ▼
//!                               OutputSink (stdout / stderr / system)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use codeplay_runner::testing::{ScriptedEngine, ScriptedProvider};
//! use codeplay_runner::{BufferSink, Channel, RunnerKind, RuntimeRegistry};
//! use codeplay_vfs::Language;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut registry = RuntimeRegistry::default().with_provider(
//!     Language::Python,
//!     RunnerKind::EmbeddedInterpreter,
//!     Arc::new(ScriptedProvider::new(ScriptedEngine::echo())),
//! );
//!
//! let sink = BufferSink::new();
//! let python = registry.get(Language::Python);
//! python.load(&sink).await.unwrap();
//! python.run("hi", &sink).await;
//! assert_eq!(sink.channel(Channel::Stdout), vec!["hi"]);
//! # });
//! ```

pub mod config;
pub mod embedded;
pub mod engine;
pub mod error;
pub mod preprocess;
pub mod process;
pub mod registry;
pub mod runner;
pub mod sandboxed;
pub mod sink;
pub mod testing;
pub mod worker;

pub use config::{RegistryConfig, RuntimeSpec, SourceMode, VALUE_MARKER};
pub use embedded::EmbeddedRunner;
pub use engine::{Engine, EngineFault, EngineProvider, Evaluation};
pub use error::{Result, RunnerError};
pub use preprocess::slash_comments_to_hash;
pub use process::{ProcessEngine, ProcessProvider, PROBE_TIMEOUT};
pub use registry::RuntimeRegistry;
pub use runner::{ready_message, RunId, Runner, RunnerKind, RunnerState, NO_OUTPUT, TIMED_OUT};
pub use sandboxed::SandboxedRunner;
pub use sink::{BufferSink, Channel, OutputSink};
pub use worker::WorkerRunner;
