pub mod config;
pub mod error;
pub mod events;
pub mod machine;
pub mod sampler;
pub mod state;

pub use config::{load_settings, LotteryConfig, ServerSettings};
pub use error::LotteryError;
pub use events::{LotteryEvent, NoticeLevel};
pub use machine::LotteryMachine;
pub use sampler::RefreshSampler;
pub use state::{Key, LotteryState, Trigger};

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;
