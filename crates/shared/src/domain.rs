use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{DrawBatchRecord, DrawWinnerRecord, PrizeRecord};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }
    };
}

id_newtype!(ProjectId);
id_newtype!(PrizeId);
id_newtype!(BatchId);
id_newtype!(WinnerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,
    Confirmed,
    Void,
}

impl BatchStatus {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Void => "VOID",
        }
    }
}

/// A drawable person. Identity is the phone number; `id` is a local
/// sequence number used to seed winner slot selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub uid: String,
    pub name: String,
    pub phone: String,
    pub is_win: bool,
    pub prize_names: Vec<String>,
    pub prize_ids: Vec<PrizeId>,
    pub prize_times: Vec<DateTime<Utc>>,
}

impl Person {
    pub fn new(id: u64, uid: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id,
            uid: uid.into(),
            name: name.into(),
            phone: phone.into(),
            is_win: false,
            prize_names: Vec::new(),
            prize_ids: Vec::new(),
            prize_times: Vec::new(),
        }
    }

    pub fn from_winner(id: u64, winner: &DrawWinnerRecord) -> Self {
        let mut person = Self::new(id, &winner.uid, &winner.name, &winner.phone);
        person.is_win = winner.status == BatchStatus::Confirmed;
        person
    }

    pub fn masked_phone(&self) -> String {
        mask_phone(&self.phone)
    }
}

/// Masks the middle of a phone number: `13812345678` -> `138****5678`.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    match chars.len() {
        0 => String::new(),
        len if len >= 11 => {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[len - 4..].iter().collect();
            format!("{head}****{tail}")
        }
        len if len > 2 => {
            let tail: String = chars[len - 2..].iter().collect();
            format!("{}{tail}", "*".repeat(len - 2))
        }
        len => "*".repeat(len),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub id: PrizeId,
    pub name: String,
    pub sort_order: i64,
    pub total_count: u32,
    pub used_count: u32,
    pub is_active: bool,
    pub is_all: bool,
}

impl Prize {
    pub fn remaining(&self) -> u32 {
        self.total_count.saturating_sub(self.used_count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.total_count
    }
}

impl From<&PrizeRecord> for Prize {
    fn from(record: &PrizeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            sort_order: record.sort,
            total_count: record.total_count,
            used_count: record.used_count,
            is_active: record.is_active,
            is_all: record.is_all,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub id: BatchId,
    pub project_id: ProjectId,
    pub prize_id: PrizeId,
    pub status: BatchStatus,
    pub winners: Vec<Person>,
}

impl DrawBatch {
    /// Builds the domain batch, resolving each wire winner to a person with
    /// `resolve(winner, index)`.
    pub fn from_record(
        record: &DrawBatchRecord,
        mut resolve: impl FnMut(&DrawWinnerRecord, usize) -> Person,
    ) -> Self {
        Self {
            id: record.id,
            project_id: record.project,
            prize_id: record.prize,
            status: record.status,
            winners: record
                .winners
                .iter()
                .enumerate()
                .map(|(index, winner)| resolve(winner, index))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_standard_mobile_numbers() {
        assert_eq!(mask_phone("13812345678"), "138****5678");
    }

    #[test]
    fn masks_short_numbers_except_last_two_digits() {
        assert_eq!(mask_phone("12345"), "***45");
        assert_eq!(mask_phone("12"), "**");
        assert_eq!(mask_phone(""), "");
    }

    #[test]
    fn prize_remaining_saturates() {
        let prize = Prize {
            id: PrizeId::default(),
            name: "Grand".into(),
            sort_order: 0,
            total_count: 3,
            used_count: 5,
            is_active: true,
            is_all: false,
        };
        assert_eq!(prize.remaining(), 0);
        assert!(prize.is_exhausted());
    }

    #[test]
    fn ids_parse_from_hyphenated_text() {
        let id: ProjectId = " 5f1c2a8e-9b0d-4c55-8a39-3f8f1d0c2b11 ".parse().expect("parse");
        assert_eq!(id.to_string(), "5f1c2a8e-9b0d-4c55-8a39-3f8f1d0c2b11");
        assert!("not-a-uuid".parse::<PrizeId>().is_err());
    }

    #[test]
    fn batch_status_uses_upper_case_wire_names() {
        let raw = serde_json::to_string(&BatchStatus::Confirmed).expect("serialize");
        assert_eq!(raw, "\"CONFIRMED\"");
        assert_eq!(BatchStatus::Void.as_query(), "VOID");
    }
}
