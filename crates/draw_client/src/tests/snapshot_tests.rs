use super::*;
use chrono::{TimeZone, Utc};
use shared::domain::{BatchId, WinnerId};

fn member(id: i64, phone: &str, active: bool) -> ProjectMemberRecord {
    ProjectMemberRecord {
        id,
        project: ProjectId::default(),
        uid: format!("U{id}"),
        name: format!("Member {id}"),
        phone: phone.to_string(),
        is_active: active,
        created_at: None,
        updated_at: None,
    }
}

fn prize(name: &str, sort: i64, total_count: u32, used_count: u32, active: bool) -> PrizeRecord {
    PrizeRecord {
        id: PrizeId::new_v4(),
        project: ProjectId::default(),
        name: name.to_string(),
        sort,
        is_all: false,
        total_count,
        used_count,
        description: String::new(),
        is_active: active,
    }
}

fn winner(phone: &str, status: BatchStatus) -> DrawWinnerRecord {
    DrawWinnerRecord {
        id: WinnerId::new_v4(),
        batch: BatchId::default(),
        prize: PrizeId::default(),
        uid: "W".into(),
        name: "Walk-in".into(),
        phone: phone.to_string(),
        status,
        confirmed_at: Some(Utc.with_ymd_and_hms(2024, 1, 20, 19, 30, 0).unwrap()),
        void_reason: String::new(),
    }
}

fn batch(prize: PrizeId, status: BatchStatus, winners: Vec<DrawWinnerRecord>) -> DrawBatchRecord {
    DrawBatchRecord {
        id: BatchId::new_v4(),
        project: ProjectId::default(),
        prize,
        draw_count: winners.len() as u32,
        status,
        draw_scope: None,
        void_reason: String::new(),
        winners,
    }
}

#[test]
fn inactive_members_are_skipped_and_ids_are_sequential() {
    let snapshot = ProjectSnapshot::reconcile(
        ProjectId::default(),
        vec![
            member(10, "111", true),
            member(11, "222", false),
            member(12, "333", true),
        ],
        Vec::new(),
        Vec::new(),
    );
    let ids: Vec<u64> = snapshot.people.iter().map(|p| p.id).collect();
    let phones: Vec<&str> = snapshot.people.iter().map(|p| p.phone.as_str()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(phones, vec!["111", "333"]);
    assert!(snapshot.current_prize.is_none());
}

#[test]
fn prizes_are_ordered_and_first_with_stock_is_current() {
    let first = prize("Grand", 1, 1, 1, true);
    let hidden = prize("Hidden", 0, 5, 0, false);
    let second = prize("Second", 2, 3, 1, true);
    let second_id = second.id;
    let snapshot = ProjectSnapshot::reconcile(
        ProjectId::default(),
        Vec::new(),
        vec![second, hidden, first],
        Vec::new(),
    );
    let names: Vec<&str> = snapshot.prizes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Grand", "Second"]);
    assert_eq!(snapshot.current_prize.map(|p| p.id), Some(second_id));
}

#[test]
fn falls_back_to_first_prize_when_all_are_exhausted() {
    let grand = prize("Grand", 1, 1, 1, true);
    let grand_id = grand.id;
    let snapshot = ProjectSnapshot::reconcile(
        ProjectId::default(),
        Vec::new(),
        vec![prize("Second", 2, 2, 2, true), grand],
        Vec::new(),
    );
    assert_eq!(snapshot.current_prize.map(|p| p.id), Some(grand_id));
}

#[test]
fn confirmed_batches_annotate_winners_by_phone() {
    let grand = prize("Grand", 1, 5, 2, true);
    let grand_id = grand.id;
    let snapshot = ProjectSnapshot::reconcile(
        ProjectId::default(),
        vec![member(1, "111", true), member(2, "222", true)],
        vec![grand],
        vec![
            batch(grand_id, BatchStatus::Confirmed, vec![winner("222", BatchStatus::Confirmed)]),
            batch(grand_id, BatchStatus::Void, vec![winner("111", BatchStatus::Void)]),
            batch(grand_id, BatchStatus::Confirmed, vec![winner("999", BatchStatus::Confirmed)]),
        ],
    );
    let first = snapshot.person_by_phone("111").expect("member 1");
    let second = snapshot.person_by_phone("222").expect("member 2");
    assert!(!first.is_win);
    assert!(second.is_win);
    assert_eq!(second.prize_names, vec!["Grand".to_string()]);
    assert_eq!(second.prize_ids, vec![grand_id]);
    assert_eq!(second.prize_times.len(), 1);
    assert_eq!(snapshot.people.len(), 2, "unknown winners are not added to the roster");
}

#[test]
fn unknown_winner_gets_synthesized_person_past_roster() {
    let snapshot = ProjectSnapshot::reconcile(
        ProjectId::default(),
        vec![member(1, "111", true), member(2, "222", true)],
        Vec::new(),
        Vec::new(),
    );
    let known = snapshot.resolve_winner(&winner("222", BatchStatus::Pending), 0);
    assert_eq!(known.id, 2);
    assert_eq!(known.name, "Member 2");

    let record = batch(
        PrizeId::default(),
        BatchStatus::Pending,
        vec![winner("111", BatchStatus::Pending), winner("555", BatchStatus::Pending)],
    );
    let resolved = snapshot.resolve_batch(&record);
    assert_eq!(resolved.winners[0].id, 1);
    assert_eq!(resolved.winners[1].id, 4);
    assert_eq!(resolved.winners[1].phone, "555");
    assert!(!resolved.winners[1].is_win);
}
