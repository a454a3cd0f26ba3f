use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LotteryState {
    /// Table layout, waiting for the operator.
    #[default]
    Idle,
    /// Sphere layout, ready to draw.
    Armed,
    /// A preview is held and the sphere spins.
    Drawing,
    /// Winners are on screen; confirm or void next.
    Concluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Enter,
    Start,
    Stop,
    Continue,
    Quit,
}

/// Keyboard-style inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Advance,
    Abort,
}

impl LotteryState {
    pub fn accepts(self, trigger: Trigger) -> bool {
        matches!(
            (self, trigger),
            (Self::Idle, Trigger::Enter)
                | (Self::Armed, Trigger::Start)
                | (Self::Drawing, Trigger::Stop | Trigger::Quit)
                | (Self::Concluded, Trigger::Continue | Trigger::Quit)
        )
    }

    pub fn trigger_for(self, key: Key) -> Option<Trigger> {
        match (self, key) {
            (Self::Idle, Key::Advance) => Some(Trigger::Enter),
            (Self::Armed, Key::Advance) => Some(Trigger::Start),
            (Self::Drawing, Key::Advance) => Some(Trigger::Stop),
            (Self::Concluded, Key::Advance) => Some(Trigger::Continue),
            (Self::Drawing, Key::Abort) => Some(Trigger::Quit),
            (_, Key::Abort) => None,
        }
    }

    /// States whose cards may be re-skinned by the refresh sampler.
    pub fn shows_live_cards(self) -> bool {
        matches!(self, Self::Idle | Self::Armed)
    }
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Drawing => "drawing",
            Self::Concluded => "concluded",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
