#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Signflow Core
//!
//! Multi-stage document signature flow engine.
//!
//! ## Overview
//!
//! A document's signature flow is an ordered list of stages. Each stage asks
//! for a number of signatures from one role (operational staff, coordinators,
//! sub-administrators, administrators). Only the earliest incomplete stage
//! accepts signatures; once every stage has met its quota the document is
//! marked `signed`.
//!
//! The engine tracks approval state only. Producing the signed artifact and
//! notifying signers belong to other components, which can follow progress
//! through [`events::FlowEventPublisher`].
//!
//! ## Module Organization
//!
//! - [`flow`] - Engine operations and pure transition logic
//! - [`repository`] - Transaction-scoped persistence (PostgreSQL and in-memory)
//! - [`models`] - Stages, signature records and read views
//! - [`constants`] - Signer roles and document statuses
//! - [`error`] - Structured error handling
//! - [`events`] - Flow lifecycle events
//! - [`config`] - YAML configuration with environment overrides
//! - [`database`] - Connection pool and embedded migrations
//! - [`logging`] - Structured logging
//! - [`web`] - HTTP surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signflow_core::constants::SignerRole;
//! use signflow_core::models::StageDefinition;
//! use signflow_core::repository::PgSignatureFlowStore;
//! use signflow_core::flow::SignatureFlowEngine;
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, document_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SignatureFlowEngine::new(PgSignatureFlowStore::new(pool));
//!
//! engine
//!     .create_flow(
//!         document_id,
//!         &[
//!             StageDefinition::new(SignerRole::Employer, 2, 1),
//!             StageDefinition::new(SignerRole::Management, 1, 2),
//!         ],
//!     )
//!     .await?;
//!
//! let outcome = engine
//!     .record_signature(document_id, user_id, SignerRole::Employer)
//!     .await?;
//! assert!(!outcome.stage_completed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                        # unit, engine, HTTP and property tests
//! cargo test -- --ignored           # PostgreSQL store tests (needs DATABASE_URL)
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod flow;
pub mod logging;
pub mod models;
pub mod repository;
pub mod web;

pub use config::{ConfigManager, SignflowConfig};
pub use constants::{DocumentStatus, SignerRole};
pub use error::{ErrorKind, FlowError, FlowResult};
pub use events::{FlowEvent, FlowEventPublisher};
pub use flow::{SignatureFlowEngine, SignatureOutcome};
pub use models::{FlowProgress, FlowStage, FlowStageView, PendingDocument, StageDefinition};
pub use repository::{InMemorySignatureFlowStore, PgSignatureFlowStore, SignatureFlowStore};
