//! # PostgreSQL Signature Flow Store
//!
//! sqlx-backed implementation of the repository traits. Each scope is a real
//! database transaction with `SET LOCAL` statement and lock timeouts, so a
//! stuck lock surfaces as a persistence failure instead of blocking forever.
//!
//! ## Locking
//!
//! `lock_document` takes `SELECT ... FOR UPDATE` on the document row and
//! `load_stages(_, true)` locks the stage rows. Every writer locks the
//! document first, which serializes signers of the same document and keeps a
//! flow redefinition from interleaving with a signature. Readers run at READ
//! COMMITTED and therefore only ever see the old or the new stage set.
//!
//! All statements are parameterized runtime queries; role and status values
//! travel as their snake_case codes.

use super::{FlowTransaction, SignatureFlowStore};
use crate::constants::{DocumentStatus, SignerRole};
use crate::error::{FlowError, FlowResult};
use crate::models::{
    DocumentSignature, DocumentSummary, FlowStage, NewSignatureRecord, PendingDocument,
    SignatureRecord, StageDefinition,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const STAGE_COLUMNS: &str = "flow_stage_id, document_id, role, required_count, current_count, flow_order, created_at";

const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Store handing out PostgreSQL transaction scopes
#[derive(Debug, Clone)]
pub struct PgSignatureFlowStore {
    pool: PgPool,
    statement_timeout: Duration,
    lock_timeout: Duration,
}

impl PgSignatureFlowStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, statement_timeout: Duration, lock_timeout: Duration) -> Self {
        self.statement_timeout = statement_timeout;
        self.lock_timeout = lock_timeout;
        self
    }
}

#[async_trait]
impl SignatureFlowStore for PgSignatureFlowStore {
    async fn begin(&self) -> FlowResult<Box<dyn FlowTransaction>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FlowError::from(e).during("begin transaction"))?;

        // SET cannot take bind parameters; both values are integers we own.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = {}",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        Ok(Box::new(PgFlowTransaction { tx }))
    }
}

/// One open PostgreSQL transaction; rolled back on drop unless committed
pub struct PgFlowTransaction {
    tx: Transaction<'static, Postgres>,
}

#[derive(Debug, FromRow)]
struct FlowStageRow {
    flow_stage_id: i64,
    document_id: Uuid,
    role: String,
    required_count: i32,
    current_count: i32,
    flow_order: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<FlowStageRow> for FlowStage {
    type Error = FlowError;

    fn try_from(row: FlowStageRow) -> Result<Self, Self::Error> {
        Ok(FlowStage {
            flow_stage_id: row.flow_stage_id,
            document_id: row.document_id,
            role: parse_role(&row.role)?,
            required_count: row.required_count,
            current_count: row.current_count,
            flow_order: row.flow_order,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SignatureRecordRow {
    signature_record_id: i64,
    document_id: Uuid,
    user_id: Uuid,
    role: String,
    signed_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DocumentSignatureRow {
    role: String,
    user_id: Uuid,
    user_name: Option<String>,
    signed_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    document_id: Uuid,
    name: String,
    created_by: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PendingDocumentRow {
    document_id: Uuid,
    name: String,
    created_by: Uuid,
    creator_name: Option<String>,
    created_at: DateTime<Utc>,
    role: String,
    required_count: i32,
    current_count: i32,
    remaining_signatures: i32,
}

fn parse_role(code: &str) -> FlowResult<SignerRole> {
    code.parse::<SignerRole>()
        .map_err(|e| FlowError::persistence("decode signer role", e))
}

fn into_stages(rows: Vec<FlowStageRow>) -> FlowResult<Vec<FlowStage>> {
    rows.into_iter().map(FlowStage::try_from).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl FlowTransaction for PgFlowTransaction {
    async fn lock_document(&mut self, document_id: Uuid) -> FlowResult<Option<DocumentSummary>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id AS document_id, name, created_by, status, created_at, updated_at
            FROM documents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| {
            let status = row
                .status
                .parse::<DocumentStatus>()
                .map_err(|e| FlowError::persistence("decode document status", e))?;
            Ok(DocumentSummary {
                document_id: row.document_id,
                name: row.name,
                created_by: row.created_by,
                status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    async fn load_stages(
        &mut self,
        document_id: Uuid,
        for_update: bool,
    ) -> FlowResult<Vec<FlowStage>> {
        let lock_clause = if for_update { "FOR UPDATE" } else { "" };
        let sql = format!(
            "SELECT {STAGE_COLUMNS} FROM signature_flow_stages \
             WHERE document_id = $1 ORDER BY flow_order, flow_stage_id {lock_clause}"
        );

        let rows = sqlx::query_as::<_, FlowStageRow>(&sql)
            .bind(document_id)
            .fetch_all(&mut *self.tx)
            .await?;

        into_stages(rows)
    }

    async fn replace_stages(
        &mut self,
        document_id: Uuid,
        stages: &[StageDefinition],
    ) -> FlowResult<Vec<FlowStage>> {
        let deleted = sqlx::query("DELETE FROM signature_flow_stages WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        debug!(%document_id, deleted, "Removed previous flow stages");

        let insert_sql = format!(
            "INSERT INTO signature_flow_stages \
             (document_id, role, required_count, current_count, flow_order, created_at) \
             VALUES ($1, $2, $3, 0, $4, NOW()) RETURNING {STAGE_COLUMNS}"
        );

        let mut created = Vec::with_capacity(stages.len());
        for stage in stages {
            let row = sqlx::query_as::<_, FlowStageRow>(&insert_sql)
                .bind(document_id)
                .bind(stage.role.as_str())
                .bind(stage.required_count)
                .bind(stage.flow_order)
                .fetch_one(&mut *self.tx)
                .await?;
            created.push(FlowStage::try_from(row)?);
        }

        created.sort_by(|a, b| a.sequence_cmp(b));
        Ok(created)
    }

    async fn signature_exists(&mut self, document_id: Uuid, user_id: Uuid) -> FlowResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM signature_records
                WHERE document_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn insert_signature_record(
        &mut self,
        record: &NewSignatureRecord,
    ) -> FlowResult<SignatureRecord> {
        let row = sqlx::query_as::<_, SignatureRecordRow>(
            r#"
            INSERT INTO signature_records (document_id, user_id, role, signed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING signature_record_id, document_id, user_id, role, signed_at
            "#,
        )
        .bind(record.document_id)
        .bind(record.user_id)
        .bind(record.role.as_str())
        .bind(record.signed_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FlowError::AlreadySigned
            } else {
                FlowError::from(e)
            }
        })?;

        Ok(SignatureRecord {
            signature_record_id: row.signature_record_id,
            document_id: row.document_id,
            user_id: row.user_id,
            role: parse_role(&row.role)?,
            signed_at: row.signed_at,
        })
    }

    async fn increment_stage_count(&mut self, flow_stage_id: i64) -> FlowResult<FlowStage> {
        let sql = format!(
            "UPDATE signature_flow_stages SET current_count = current_count + 1 \
             WHERE flow_stage_id = $1 AND current_count < required_count \
             RETURNING {STAGE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, FlowStageRow>(&sql)
            .bind(flow_stage_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| {
                FlowError::persistence(
                    "increment stage count",
                    format!("stage {flow_stage_id} is missing or already at quota"),
                )
            })?;

        FlowStage::try_from(row)
    }

    async fn find_next_stage(&mut self, current: &FlowStage) -> FlowResult<Option<FlowStage>> {
        let sql = format!(
            "SELECT {STAGE_COLUMNS} FROM signature_flow_stages \
             WHERE document_id = $1 \
               AND (flow_order > $2 OR (flow_order = $2 AND flow_stage_id > $3)) \
             ORDER BY flow_order, flow_stage_id \
             LIMIT 1"
        );

        let row = sqlx::query_as::<_, FlowStageRow>(&sql)
            .bind(current.document_id)
            .bind(current.flow_order)
            .bind(current.flow_stage_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(FlowStage::try_from).transpose()
    }

    async fn mark_document_signed(&mut self, document_id: Uuid) -> FlowResult<()> {
        let updated = sqlx::query("UPDATE documents SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(DocumentStatus::Signed.as_str())
            .bind(document_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(FlowError::DocumentNotFound(document_id));
        }
        Ok(())
    }

    async fn load_signatures(&mut self, document_id: Uuid) -> FlowResult<Vec<DocumentSignature>> {
        let rows = sqlx::query_as::<_, DocumentSignatureRow>(
            r#"
            SELECT sr.role, sr.user_id, u.name AS user_name, sr.signed_at
            FROM signature_records sr
            LEFT JOIN users u ON u.id = sr.user_id
            WHERE sr.document_id = $1
            ORDER BY sr.signed_at, sr.signature_record_id
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DocumentSignature {
                    role: parse_role(&row.role)?,
                    user_id: row.user_id,
                    user_name: row.user_name,
                    signed_at: row.signed_at,
                })
            })
            .collect()
    }

    async fn pending_signatures(
        &mut self,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<Vec<PendingDocument>> {
        let rows = sqlx::query_as::<_, PendingDocumentRow>(
            r#"
            SELECT * FROM (
                SELECT DISTINCT ON (d.id)
                       d.id AS document_id, d.name, d.created_by, u.name AS creator_name,
                       d.created_at, sf.role, sf.required_count, sf.current_count,
                       (sf.required_count - sf.current_count) AS remaining_signatures
                FROM documents d
                JOIN signature_flow_stages sf ON sf.document_id = d.id
                LEFT JOIN users u ON u.id = d.created_by
                WHERE sf.role = $1
                  AND sf.current_count < sf.required_count
                  AND d.status = $2
                  AND NOT EXISTS (
                      SELECT 1 FROM signature_records sr
                      WHERE sr.document_id = d.id AND sr.user_id = $3
                  )
                  AND NOT EXISTS (
                      SELECT 1 FROM signature_flow_stages prior
                      WHERE prior.document_id = d.id
                        AND (prior.flow_order, prior.flow_stage_id) < (sf.flow_order, sf.flow_stage_id)
                        AND prior.current_count < prior.required_count
                  )
                ORDER BY d.id, sf.flow_order, sf.flow_stage_id
            ) pending
            ORDER BY pending.created_at DESC, pending.document_id
            "#,
        )
        .bind(role.as_str())
        .bind(DocumentStatus::Pending.as_str())
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(PendingDocument {
                    document_id: row.document_id,
                    name: row.name,
                    created_by: row.created_by,
                    creator_name: row.creator_name,
                    created_at: row.created_at,
                    role: parse_role(&row.role)?,
                    required_count: row.required_count,
                    current_count: row.current_count,
                    remaining_signatures: row.remaining_signatures,
                })
            })
            .collect()
    }

    async fn commit(self: Box<Self>) -> FlowResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| FlowError::from(e).during("commit transaction"))
    }
}
