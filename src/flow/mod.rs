//! # Signature Flow Engine
//!
//! Tracks, per document, an ordered sequence of signing stages and advances
//! the document to `signed` once every stage has met its quota.
//!
//! - [`transitions`] - pure decisions over loaded stages
//! - [`engine`] - the four engine operations, each run in one transaction scope
//! - [`outcome`] - the result of recording a signature

pub mod engine;
pub mod outcome;
pub mod transitions;

pub use engine::SignatureFlowEngine;
pub use outcome::SignatureOutcome;
