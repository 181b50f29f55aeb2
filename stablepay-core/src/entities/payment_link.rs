use std::collections::HashMap;

use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::types::Json;
use stablepay_sdk::link::{LinkIdError, link_id};
use stablepay_sdk::objects::PaymentParams;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentLink {
    pub id: String,
    pub params: Json<PaymentParams>,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
/// Insert a link. Inserting an id that already exists is a no-op, which is
/// correct because ids are derived from the params.
pub struct InsertPaymentLink {
    pub id: String,
    pub params: PaymentParams,
}

impl Processor<InsertPaymentLink> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertPaymentLink")]
    async fn process(&self, insert: InsertPaymentLink) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_links (id, params)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(insert.id)
        .bind(Json(insert.params))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct GetPaymentLinkById {
    pub id: String,
}

impl Processor<GetPaymentLinkById> for DatabaseProcessor {
    type Output = Option<PaymentLink>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPaymentLinkById")]
    async fn process(&self, query: GetPaymentLinkById) -> Result<Option<PaymentLink>, sqlx::Error> {
        let link = sqlx::query_as::<_, PaymentLink>(
            r#"
            SELECT id, params, created_at
            FROM payment_links
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }
}

#[derive(Debug, Error)]
pub enum LinkStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to derive link id: {0}")]
    Id(#[from] LinkIdError),
}

/// Content-addressed storage of payment parameters behind short ids.
#[async_trait]
pub trait PaymentLinkStore: Send + Sync {
    /// Store `params` and return their id. Storing the same params twice
    /// returns the same id.
    async fn set_payment_params(&self, params: &PaymentParams) -> Result<String, LinkStoreError>;

    async fn get_payment_params(&self, id: &str) -> Result<Option<PaymentParams>, LinkStoreError>;
}

/// Postgres-backed [`PaymentLinkStore`].
pub struct PgPaymentLinkStore {
    db: DatabaseProcessor,
}

impl PgPaymentLinkStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl PaymentLinkStore for PgPaymentLinkStore {
    async fn set_payment_params(&self, params: &PaymentParams) -> Result<String, LinkStoreError> {
        let id = link_id(params)?;
        let inserted = self
            .db
            .process(InsertPaymentLink {
                id: id.clone(),
                params: params.clone(),
            })
            .await?;
        tracing::debug!(%id, inserted, "Stored payment link");
        Ok(id)
    }

    async fn get_payment_params(&self, id: &str) -> Result<Option<PaymentParams>, LinkStoreError> {
        let link = self
            .db
            .process(GetPaymentLinkById { id: id.to_string() })
            .await?;
        Ok(link.map(|link| link.params.0))
    }
}

/// In-process [`PaymentLinkStore`]; links are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryPaymentLinkStore {
    links: RwLock<HashMap<String, PaymentParams>>,
}

impl MemoryPaymentLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLinkStore for MemoryPaymentLinkStore {
    async fn set_payment_params(&self, params: &PaymentParams) -> Result<String, LinkStoreError> {
        let id = link_id(params)?;
        self.links
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| params.clone());
        Ok(id)
    }

    async fn get_payment_params(&self, id: &str) -> Result<Option<PaymentParams>, LinkStoreError> {
        Ok(self.links.read().await.get(id).cloned())
    }
}
