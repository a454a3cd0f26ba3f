use draw_client::TransactionError;
use scene::LayoutError;
use thiserror::Error;

use crate::{
    events::NoticeLevel,
    state::{LotteryState, Trigger},
};

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("{trigger:?} is not a valid transition while {state}")]
    InvalidTransition { state: LotteryState, trigger: Trigger },
    #[error("a layout transform is still running")]
    Busy,
    #[error("no project is selected")]
    NoProject,
    #[error("no prize is selected")]
    NoPrize,
    #[error("prize '{0}' has been fully drawn")]
    PrizeExhausted(String),
    #[error("there are no members to draw from")]
    NoMembers,
    #[error("the draw selected nobody; every candidate was excluded")]
    NoWinners,
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("cannot place winner cards: {0}")]
    Layout(#[from] LayoutError),
}

impl LotteryError {
    /// Dropped inputs are not worth telling the operator about.
    pub fn is_ignored_input(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::Busy)
    }

    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            Self::InvalidTransition { .. } | Self::Busy => NoticeLevel::Info,
            Self::NoProject
            | Self::NoPrize
            | Self::PrizeExhausted(_)
            | Self::NoMembers
            | Self::NoWinners => NoticeLevel::Warning,
            Self::Transaction(_) | Self::Layout(_) => NoticeLevel::Error,
        }
    }
}
