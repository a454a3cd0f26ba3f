use std::collections::HashMap;

use anyhow::Result;
use shared::{
    domain::{BatchStatus, DrawBatch, Person, Prize, PrizeId, ProjectId},
    protocol::{DrawBatchRecord, DrawWinnerRecord, PrizeRecord, ProjectMemberRecord},
};
use tracing::debug;

use crate::DrawApi;

/// Local view of a project rebuilt from the server after every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectSnapshot {
    pub project_id: ProjectId,
    pub people: Vec<Person>,
    pub prizes: Vec<Prize>,
    pub current_prize: Option<Prize>,
}

impl ProjectSnapshot {
    pub async fn fetch(api: &dyn DrawApi, project_id: ProjectId) -> Result<Self> {
        let (members, prizes, batches) = futures::try_join!(
            api.list_members(project_id),
            api.list_prizes(project_id),
            api.list_batches(project_id, Some(BatchStatus::Confirmed)),
        )?;
        let snapshot = Self::reconcile(project_id, members, prizes, batches);
        debug!(
            %project_id,
            people = snapshot.people.len(),
            prizes = snapshot.prizes.len(),
            "project snapshot refreshed"
        );
        Ok(snapshot)
    }

    pub fn reconcile(
        project_id: ProjectId,
        members: Vec<ProjectMemberRecord>,
        prizes: Vec<PrizeRecord>,
        batches: Vec<DrawBatchRecord>,
    ) -> Self {
        let mut people: Vec<Person> = members
            .iter()
            .filter(|member| member.is_active)
            .enumerate()
            .map(|(index, member)| {
                Person::new(index as u64 + 1, &member.uid, &member.name, &member.phone)
            })
            .collect();

        let mut prizes: Vec<Prize> = prizes
            .iter()
            .filter(|prize| prize.is_active)
            .map(Prize::from)
            .collect();
        prizes.sort_by_key(|prize| prize.sort_order);
        let prize_names: HashMap<PrizeId, &str> = prizes
            .iter()
            .map(|prize| (prize.id, prize.name.as_str()))
            .collect();

        let by_phone: HashMap<String, usize> = people
            .iter()
            .enumerate()
            .map(|(index, person)| (person.phone.clone(), index))
            .collect();
        for batch in batches
            .iter()
            .filter(|batch| batch.status == BatchStatus::Confirmed)
        {
            let prize_name = prize_names.get(&batch.prize).copied().unwrap_or_default();
            for winner in &batch.winners {
                let Some(&index) = by_phone.get(&winner.phone) else {
                    continue;
                };
                let person = &mut people[index];
                person.is_win = true;
                person.prize_names.push(prize_name.to_string());
                person.prize_ids.push(batch.prize);
                if let Some(at) = winner.confirmed_at {
                    person.prize_times.push(at);
                }
            }
        }

        let current_prize = choose_current_prize(&prizes);
        Self {
            project_id,
            people,
            prizes,
            current_prize,
        }
    }

    pub fn prize(&self, prize_id: PrizeId) -> Option<&Prize> {
        self.prizes.iter().find(|prize| prize.id == prize_id)
    }

    pub fn person_by_phone(&self, phone: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.phone == phone)
    }

    /// Maps a server winner onto the local roster. Unknown phones get a
    /// synthesized person with an id past the end of the roster.
    pub fn resolve_winner(&self, winner: &DrawWinnerRecord, index: usize) -> Person {
        match self.person_by_phone(&winner.phone) {
            Some(person) => person.clone(),
            None => {
                let next_id = self.people.iter().map(|person| person.id).max().unwrap_or(0);
                Person::from_winner(next_id + 1 + index as u64, winner)
            }
        }
    }

    pub fn resolve_batch(&self, record: &DrawBatchRecord) -> DrawBatch {
        DrawBatch::from_record(record, |winner, index| self.resolve_winner(winner, index))
    }
}

/// First prize that still has stock in display order, otherwise the first.
pub fn choose_current_prize(prizes: &[Prize]) -> Option<Prize> {
    prizes
        .iter()
        .find(|prize| !prize.is_exhausted())
        .or_else(|| prizes.first())
        .cloned()
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
