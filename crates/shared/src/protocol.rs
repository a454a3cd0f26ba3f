use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchId, BatchStatus, PrizeId, ProjectId, WinnerId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMemberRecord {
    pub id: i64,
    #[serde(default)]
    pub project: ProjectId,
    pub uid: String,
    pub name: String,
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrizeRecord {
    pub id: PrizeId,
    #[serde(default)]
    pub project: ProjectId,
    pub name: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub is_all: bool,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawWinnerRecord {
    #[serde(default)]
    pub id: WinnerId,
    #[serde(default)]
    pub batch: BatchId,
    #[serde(default)]
    pub prize: PrizeId,
    pub uid: String,
    pub name: String,
    pub phone: String,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub void_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawBatchRecord {
    pub id: BatchId,
    pub project: ProjectId,
    pub prize: PrizeId,
    #[serde(default)]
    pub draw_count: u32,
    pub status: BatchStatus,
    #[serde(default)]
    pub draw_scope: Option<DrawScope>,
    #[serde(default)]
    pub void_reason: String,
    #[serde(default)]
    pub winners: Vec<DrawWinnerRecord>,
}

/// Optional restriction of the candidate pool for a preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawScope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_uids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_phones: Vec<String>,
}

impl DrawScope {
    pub fn is_empty(&self) -> bool {
        self.include_uids.is_empty() && self.include_phones.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewDrawRequest {
    pub project_id: ProjectId,
    pub prize_id: PrizeId,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<DrawScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidDrawRequest {
    pub reason: String,
}

fn default_true() -> bool {
    true
}
