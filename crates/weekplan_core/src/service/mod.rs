//! Revision use-case services.
//!
//! # Responsibility
//! - Orchestrate detection, placement and store commits per request.
//! - Keep callers (CLI, chat front end) decoupled from algorithm details.

pub mod outcome;
pub mod revision_controller;
pub mod revision_queue;
