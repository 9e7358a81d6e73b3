//! Packrun Core — skill resolution, template substitution, and sequential
//! execution against a remote workflow API.
//!
//! Skills are declaratively-defined bindings to a single remote workflow
//! node type (atomic) or ordered pipelines of steps (composed), installed
//! on disk as packs. This crate turns a skill definition plus
//! caller-supplied input into one or more remote workflow runs (or local
//! script executions), propagating each step's output into later steps'
//! inputs and classifying run status to decide when to stop polling.
//!
//! Transport-agnostic: the remote API sits behind the [`workflow::WorkflowApi`]
//! trait, so the executor can run against any backend (or a test fake).

pub mod config;
pub mod error;
pub mod skills;
pub mod template;
pub mod workflow;

// Convenience re-exports
pub use config::EngineConfig;
pub use error::EngineError;
pub use skills::{PackStore, SkillDefinition};
pub use workflow::{ExecutionReport, HttpWorkflowClient, RunOptions, SkillRunner};
