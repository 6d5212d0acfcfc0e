//! Approval workflow engine for multi-party cooperation agreements.
//!
//! A proposal moves from `draft` through intake, substantive review, a
//! revision loop, two-tier legal review, a paraf chain and final approval,
//! then forks into partner and leadership signing tracks that must both
//! finish before document exchange, archival and completion. See
//! [`workflow::WorkflowEngine`] for the entry point.

pub mod config;
pub mod demo;
pub mod error;
pub mod workflow;

pub use error::{AuditError, RegistryError, StoreError, WorkflowError};
