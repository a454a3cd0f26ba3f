use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use draw_client::DrawApi;
use shared::{
    domain::{BatchId, BatchStatus, PrizeId, ProjectId, WinnerId},
    error::{ApiException, ErrorCode},
    protocol::{
        DrawBatchRecord, DrawWinnerRecord, PreviewDrawRequest, PrizeRecord, ProjectMemberRecord,
    },
};

/// In-memory draw backend with the server's bookkeeping: previews pick the
/// first members not already holding a live batch, confirms bump usage.
#[derive(Default)]
pub struct FakeState {
    pub members: Vec<ProjectMemberRecord>,
    pub prizes: Vec<PrizeRecord>,
    pub batches: Vec<DrawBatchRecord>,
    pub preview_requests: Vec<PreviewDrawRequest>,
    pub confirm_calls: u32,
    pub void_reasons: Vec<String>,
    pub empty_previews: bool,
    pub fail_preview: bool,
    pub fail_confirm: bool,
    pub fail_void: bool,
    pub fail_sync: bool,
}

#[derive(Default)]
pub struct FakeDrawApi {
    pub state: Mutex<FakeState>,
}

impl FakeDrawApi {
    pub fn with_pool(members: usize, prizes: Vec<PrizeRecord>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().expect("lock");
            state.members = (1..=members as i64).map(member).collect();
            state.prizes = prizes;
        }
        api
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("lock")
    }
}

pub fn member(id: i64) -> ProjectMemberRecord {
    ProjectMemberRecord {
        id,
        project: ProjectId::default(),
        uid: format!("U{id:03}"),
        name: format!("Member {id}"),
        phone: format!("1370000{id:04}"),
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

pub fn prize(name: &str, total_count: u32, used_count: u32) -> PrizeRecord {
    PrizeRecord {
        id: PrizeId::new_v4(),
        project: ProjectId::default(),
        name: name.to_string(),
        sort: 1,
        is_all: false,
        total_count,
        used_count,
        description: String::new(),
        is_active: true,
    }
}

fn server_error(message: &str) -> anyhow::Error {
    ApiException::new(ErrorCode::Internal, 500, message).into()
}

#[async_trait]
impl DrawApi for FakeDrawApi {
    async fn list_members(&self, _project_id: ProjectId) -> Result<Vec<ProjectMemberRecord>> {
        let state = self.state();
        if state.fail_sync {
            return Err(server_error("members unavailable"));
        }
        Ok(state.members.clone())
    }

    async fn list_prizes(&self, _project_id: ProjectId) -> Result<Vec<PrizeRecord>> {
        Ok(self.state().prizes.clone())
    }

    async fn list_batches(
        &self,
        _project_id: ProjectId,
        status: Option<BatchStatus>,
    ) -> Result<Vec<DrawBatchRecord>> {
        Ok(self
            .state()
            .batches
            .iter()
            .filter(|batch| status.map_or(true, |status| batch.status == status))
            .cloned()
            .collect())
    }

    async fn preview(&self, request: &PreviewDrawRequest) -> Result<DrawBatchRecord> {
        let mut state = self.state();
        state.preview_requests.push(request.clone());
        if state.fail_preview {
            return Err(server_error("draw service timed out"));
        }
        let prize = state
            .prizes
            .iter()
            .find(|prize| prize.id == request.prize_id)
            .cloned()
            .ok_or_else(|| anyhow!("prize not found"))?;
        let taken: Vec<String> = state
            .batches
            .iter()
            .filter(|batch| batch.status != BatchStatus::Void)
            .flat_map(|batch| batch.winners.iter().map(|winner| winner.phone.clone()))
            .collect();
        let count = if state.empty_previews {
            0
        } else {
            request.count.min(prize.total_count.saturating_sub(prize.used_count)) as usize
        };
        let id = BatchId::new_v4();
        let winners = state
            .members
            .iter()
            .filter(|member| !taken.contains(&member.phone))
            .take(count)
            .map(|member| DrawWinnerRecord {
                id: WinnerId::new_v4(),
                batch: id,
                prize: prize.id,
                uid: member.uid.clone(),
                name: member.name.clone(),
                phone: member.phone.clone(),
                status: BatchStatus::Pending,
                confirmed_at: None,
                void_reason: String::new(),
            })
            .collect();
        let batch = DrawBatchRecord {
            id,
            project: request.project_id,
            prize: prize.id,
            draw_count: request.count,
            status: BatchStatus::Pending,
            draw_scope: request.scope.clone(),
            void_reason: String::new(),
            winners,
        };
        state.batches.push(batch.clone());
        Ok(batch)
    }

    async fn confirm(&self, batch_id: BatchId) -> Result<DrawBatchRecord> {
        let mut state = self.state();
        state.confirm_calls += 1;
        if state.fail_confirm {
            return Err(server_error("database unavailable"));
        }
        let batch = state
            .batches
            .iter_mut()
            .find(|batch| batch.id == batch_id)
            .ok_or_else(|| anyhow!("batch not found"))?;
        if batch.status != BatchStatus::Pending {
            return Err(anyhow!("batch is not pending"));
        }
        batch.status = BatchStatus::Confirmed;
        for winner in &mut batch.winners {
            winner.status = BatchStatus::Confirmed;
        }
        let batch = batch.clone();
        if let Some(prize) = state.prizes.iter_mut().find(|prize| prize.id == batch.prize) {
            prize.used_count += batch.winners.len() as u32;
        }
        Ok(batch)
    }

    async fn void(&self, batch_id: BatchId, reason: &str) -> Result<DrawBatchRecord> {
        let mut state = self.state();
        state.void_reasons.push(reason.to_string());
        if state.fail_void {
            return Err(server_error("void rejected"));
        }
        let batch = state
            .batches
            .iter_mut()
            .find(|batch| batch.id == batch_id)
            .ok_or_else(|| anyhow!("batch not found"))?;
        batch.status = BatchStatus::Void;
        batch.void_reason = reason.to_string();
        Ok(batch.clone())
    }
}
