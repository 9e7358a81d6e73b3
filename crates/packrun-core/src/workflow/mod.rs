//! Workflow execution — skills turned into remote workflow runs.
//!
//! # Architecture
//!
//! ```text
//! installed packs ──► PackStore ──► SkillRunner (invocation input)
//!                                        │
//!            template resolver ◄─────────┼─────────► connection resolver
//!                                        │
//!                                  submit_and_wait
//!                                        │
//!                            WorkflowApi (HTTP) ──► status classifier
//! ```

pub mod adapter;
pub mod builder;
pub mod client;
pub mod connections;
pub mod executor;
pub mod status;

pub use adapter::{submit_and_wait, ExecutionResult, SubmitOptions, WorkflowSource};
pub use builder::{build_workflow, validate_shape};
pub use client::{HttpWorkflowClient, WorkflowApi};
pub use connections::resolve_connection;
pub use executor::{ExecutionReport, ReportOutcome, RunOptions, SkillRunner};
pub use status::{classify, StatusClass};
