//! Command orchestration.
pub mod deploy;
