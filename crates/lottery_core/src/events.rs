use shared::domain::Person;

use crate::state::LotteryState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Operator-facing feed. Subscribers that fall behind lose the oldest events.
#[derive(Debug, Clone, PartialEq)]
pub enum LotteryEvent {
    StateChanged {
        from: LotteryState,
        to: LotteryState,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
    WinnerRevealed {
        card: usize,
        person: Person,
        prize: Option<String>,
    },
}
