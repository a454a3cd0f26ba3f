use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BatchId, BatchStatus, PrizeId, ProjectId},
    error::{ApiException, ErrorBody, ErrorCode},
    protocol::{
        DrawBatchRecord, PreviewDrawRequest, PrizeRecord, ProjectMemberRecord, VoidDrawRequest,
    },
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub mod snapshot;
pub use snapshot::ProjectSnapshot;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const EMPTY_PREVIEW_VOID_REASON: &str = "empty preview";

/// The remote draw-batch resource. Implementations must not retry
/// `preview`: every call may select a different sample.
#[async_trait]
pub trait DrawApi: Send + Sync {
    async fn list_members(&self, project_id: ProjectId) -> Result<Vec<ProjectMemberRecord>>;
    async fn list_prizes(&self, project_id: ProjectId) -> Result<Vec<PrizeRecord>>;
    async fn list_batches(
        &self,
        project_id: ProjectId,
        status: Option<BatchStatus>,
    ) -> Result<Vec<DrawBatchRecord>>;
    async fn preview(&self, request: &PreviewDrawRequest) -> Result<DrawBatchRecord>;
    async fn confirm(&self, batch_id: BatchId) -> Result<DrawBatchRecord>;
    async fn void(&self, batch_id: BatchId, reason: &str) -> Result<DrawBatchRecord>;
}

pub struct HttpDrawApi {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
    project_header: Option<ProjectId>,
}

impl HttpDrawApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("invalid draw server url '{base_url}'"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            auth_token: None,
            project_header: None,
        })
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_project_header(mut self, project_id: ProjectId) -> Self {
        self.project_header = Some(project_id);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(project_id) = self.project_header {
            builder = builder.header("X-Project-Id", project_id.to_string());
        }
        builder
    }
}

/// The request never produced a response: connect failure, timeout or a
/// dropped connection. Status 0 marks the missing HTTP status.
fn transport_error(err: reqwest::Error) -> ApiException {
    let kind = if err.is_timeout() { "timed out" } else { "failed" };
    warn!(error = %err, "draw server request {kind}");
    ApiException::new(ErrorCode::Transport, 0, format!("draw server request {kind}: {err}"))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.ok();
        let err = ApiException::from_response(status.as_u16(), body);
        if err.requires_reauth() {
            warn!("draw server rejected credentials; sign in again");
        }
        return Err(err.into());
    }
    Ok(response.json().await?)
}

#[async_trait]
impl DrawApi for HttpDrawApi {
    async fn list_members(&self, project_id: ProjectId) -> Result<Vec<ProjectMemberRecord>> {
        let response = self
            .request(Method::GET, "/project-members/")
            .query(&[("project_id", project_id.to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn list_prizes(&self, project_id: ProjectId) -> Result<Vec<PrizeRecord>> {
        let response = self
            .request(Method::GET, "/prizes/")
            .query(&[("project_id", project_id.to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn list_batches(
        &self,
        project_id: ProjectId,
        status: Option<BatchStatus>,
    ) -> Result<Vec<DrawBatchRecord>> {
        let mut query = vec![("project_id", project_id.to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_query().to_string()));
        }
        let response = self
            .request(Method::GET, "/draw-batches/")
            .query(&query)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn preview(&self, request: &PreviewDrawRequest) -> Result<DrawBatchRecord> {
        let response = self
            .request(Method::POST, "/draw-batches/preview/")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn confirm(&self, batch_id: BatchId) -> Result<DrawBatchRecord> {
        let response = self
            .request(Method::POST, &format!("/draw-batches/{batch_id}/confirm/"))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn void(&self, batch_id: BatchId, reason: &str) -> Result<DrawBatchRecord> {
        let response = self
            .request(Method::POST, &format!("/draw-batches/{batch_id}/void/"))
            .json(&VoidDrawRequest {
                reason: reason.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("draw batch {0} is still pending; confirm or void it first")]
    BatchPending(BatchId),
    #[error("there is no pending draw batch")]
    NoPendingBatch,
    #[error("draw preview failed: {0}")]
    Preview(#[source] anyhow::Error),
    #[error("confirming draw batch {batch_id} failed: {source}")]
    Confirm {
        batch_id: BatchId,
        source: anyhow::Error,
    },
    #[error("voiding draw batch {batch_id} failed: {source}")]
    Void {
        batch_id: BatchId,
        source: anyhow::Error,
    },
    #[error("project sync failed: {0}")]
    Sync(#[source] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    pub id: BatchId,
    pub prize_id: PrizeId,
    pub winner_count: usize,
}

/// Three-phase preview / confirm / void protocol holding at most one
/// pending batch. A pending id is only forgotten after the server accepted
/// its confirm or void.
pub struct DrawTransactionClient {
    api: Arc<dyn DrawApi>,
    pending: Option<PendingBatch>,
}

impl DrawTransactionClient {
    pub fn new(api: Arc<dyn DrawApi>) -> Self {
        Self { api, pending: None }
    }

    pub fn pending(&self) -> Option<&PendingBatch> {
        self.pending.as_ref()
    }

    pub async fn preview(
        &mut self,
        request: &PreviewDrawRequest,
    ) -> Result<DrawBatchRecord, TransactionError> {
        if let Some(pending) = &self.pending {
            return Err(TransactionError::BatchPending(pending.id));
        }
        let batch = self
            .api
            .preview(request)
            .await
            .map_err(TransactionError::Preview)?;

        if batch.winners.is_empty() {
            warn!(batch_id = %batch.id, "preview selected nobody; discarding batch");
            if let Err(err) = self.api.void(batch.id, EMPTY_PREVIEW_VOID_REASON).await {
                warn!(batch_id = %batch.id, error = %err, "failed to void empty preview");
            }
            return Ok(batch);
        }

        info!(
            batch_id = %batch.id,
            prize_id = %batch.prize,
            requested = request.count,
            selected = batch.winners.len(),
            "draw batch pending"
        );
        self.pending = Some(PendingBatch {
            id: batch.id,
            prize_id: batch.prize,
            winner_count: batch.winners.len(),
        });
        Ok(batch)
    }

    pub async fn confirm(&mut self) -> Result<DrawBatchRecord, TransactionError> {
        let batch_id = self
            .pending
            .as_ref()
            .map(|pending| pending.id)
            .ok_or(TransactionError::NoPendingBatch)?;
        let batch = self
            .api
            .confirm(batch_id)
            .await
            .map_err(|source| TransactionError::Confirm { batch_id, source })?;
        self.pending = None;
        info!(%batch_id, "draw batch confirmed");
        Ok(batch)
    }

    pub async fn void(&mut self, reason: &str) -> Result<DrawBatchRecord, TransactionError> {
        let batch_id = self
            .pending
            .as_ref()
            .map(|pending| pending.id)
            .ok_or(TransactionError::NoPendingBatch)?;
        let batch = self
            .api
            .void(batch_id, reason)
            .await
            .map_err(|source| TransactionError::Void { batch_id, source })?;
        self.pending = None;
        info!(%batch_id, reason, "draw batch voided");
        Ok(batch)
    }

    /// Full reconciliation of members, prizes and confirmed winners.
    pub async fn sync(&self, project_id: ProjectId) -> Result<ProjectSnapshot, TransactionError> {
        ProjectSnapshot::fetch(self.api.as_ref(), project_id)
            .await
            .map_err(TransactionError::Sync)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
