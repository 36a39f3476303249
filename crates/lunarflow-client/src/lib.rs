//! Lunarflow Client
//!
//! Async client for the Lunar backend. The backend stores workflows and
//! components, runs them and streams results; this crate only speaks its
//! HTTP API:
//!
//! - [`LunarClient`]: typed calls for `/workflow`, `/component`, `/demo` and
//!   `/auto_workflow*`, each tagged with the configured user id
//! - [`RunResults`]: per-label run outcomes, either a component or an error
//! - [`AgentEvent`]: streamed workflow results as reasoning-chain events
//! - [`WorkflowCache`]: per-user cache shared between client clones

mod cache;
mod client;
mod config;
mod error;
mod events;
mod run;
mod stream;

pub use cache::WorkflowCache;
pub use client::LunarClient;
pub use config::{CONFIG_FILE, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ClientError, Result};
pub use events::{AgentError, AgentEvent, ReasoningOutput, ReasoningStep};
pub use run::{RunOutcome, RunResults};
pub use stream::{EventTranslator, NdjsonDecoder, WorkflowEvent, agent_events};
