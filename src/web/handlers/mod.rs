//! # Web API Handlers
//!
//! Thin adapters between HTTP and the signature flow engine. Handlers resolve
//! the caller, call exactly one engine operation and shape the envelope.

pub mod flows;
pub mod health;
