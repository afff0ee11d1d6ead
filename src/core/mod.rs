//! Core domain models
//!
//! This module defines the fundamental data structures that represent
//! pipelines, jobs, steps, and workflows.

pub mod config;
pub mod job;
pub mod pipeline;
pub mod state;

pub use job::*;
pub use pipeline::*;
pub use state::*;
