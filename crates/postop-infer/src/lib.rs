//! Inference orchestration for postoperative complication models.
//!
//! [`Orchestrator`] invokes already-normalized batches; [`score`] runs a raw
//! submission through the registry, the normalizer and the orchestrator.

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{Invocation, Orchestrator, ScoringOptions};
pub use pipeline::score;
