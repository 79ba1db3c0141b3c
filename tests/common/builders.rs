//! Test data builders for engine, store and HTTP tests

#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{DateTime, Utc};
use signflow_core::constants::{DocumentStatus, SignerRole};
use signflow_core::events::FlowEventPublisher;
use signflow_core::flow::SignatureFlowEngine;
use signflow_core::models::{DocumentSummary, StageDefinition};
use signflow_core::repository::InMemorySignatureFlowStore;
use uuid::Uuid;

/// An in-memory store and engine sharing data, plus one seeded document
pub struct FlowFixture {
    pub store: InMemorySignatureFlowStore,
    pub engine: SignatureFlowEngine,
    pub events: FlowEventPublisher,
    pub document_id: Uuid,
    pub creator_id: Uuid,
}

impl FlowFixture {
    /// Register a user and return its id
    pub async fn user(&self, name: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.store.insert_user(user_id, name).await;
        user_id
    }

    /// Seed another document owned by the fixture creator
    pub async fn document(&self, name: &str, created_at: DateTime<Utc>) -> Uuid {
        let document_id = Uuid::new_v4();
        self.store
            .insert_document(DocumentSummary {
                document_id,
                name: name.to_string(),
                created_by: self.creator_id,
                status: DocumentStatus::Pending,
                created_at,
                updated_at: created_at,
            })
            .await;
        document_id
    }

    pub async fn document_status(&self) -> DocumentStatus {
        self.store
            .document(self.document_id)
            .await
            .map(|document| document.status)
            .expect("fixture document exists")
    }
}

/// Builder pattern for a seeded flow fixture
pub struct FlowFixtureBuilder {
    document_name: String,
    stages: Vec<StageDefinition>,
}

impl FlowFixtureBuilder {
    pub fn new() -> Self {
        Self {
            document_name: "Contrato de servicios".to_string(),
            stages: Vec::new(),
        }
    }

    pub fn with_document_name(mut self, name: &str) -> Self {
        self.document_name = name.to_string();
        self
    }

    pub fn with_stage(mut self, role: SignerRole, count: i32, order: i32) -> Self {
        self.stages.push(StageDefinition::new(role, count, order));
        self
    }

    /// Seed the store and, when stages were given, define the flow
    pub async fn build(self) -> FlowFixture {
        let store = InMemorySignatureFlowStore::new();
        let events = FlowEventPublisher::new(64);
        let engine = SignatureFlowEngine::with_event_publisher(store.clone(), events.clone());

        let creator_id = Uuid::new_v4();
        store.insert_user(creator_id, "Ana Administradora").await;
        let document_id = store
            .create_pending_document(self.document_name, creator_id)
            .await;

        if !self.stages.is_empty() {
            engine
                .create_flow(document_id, &self.stages)
                .await
                .expect("Failed to define fixture flow");
        }

        FlowFixture {
            store,
            engine,
            events,
            document_id,
            creator_id,
        }
    }
}

impl Default for FlowFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Two operational signatures followed by one coordinator signature
pub async fn operational_then_coordinator() -> FlowFixture {
    FlowFixtureBuilder::new()
        .with_stage(SignerRole::Employer, 2, 1)
        .with_stage(SignerRole::Management, 1, 2)
        .build()
        .await
}
