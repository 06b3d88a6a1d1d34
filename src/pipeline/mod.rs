//! # Pipeline Module
//!
//! Background execution of analyze cycles off the caller's thread.

pub mod queue;

pub use queue::{AnalysisOutcome, AnalysisTicket, AnalyzeQueue};
