use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use audio_pool::AudioAssets;
use scene::{CardSize, Palette, Viewport};
use serde::Deserialize;
use shared::{domain::ProjectId, protocol::DrawScope};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "lottery.toml";
pub const DEFAULT_MAX_BATCH_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub project_id: Option<ProjectId>,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".into(),
            auth_token: None,
            project_id: None,
            request_timeout_secs: 10,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Everything the draw engine reads from the outside. Passed by value into
/// the machine; nothing here is global.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub row_count: usize,
    pub card_size: CardSize,
    pub palette: Palette,
    /// Seconds until a running draw stops by itself; 0 waits for the operator.
    pub draw_duration_secs: u64,
    pub low_performance: bool,
    pub mute: bool,
    pub max_batch_size: u32,
    pub viewport: Viewport,
    pub scope: DrawScope,
    pub audio: AudioAssets,
    pub server: ServerSettings,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            row_count: 7,
            card_size: CardSize::default(),
            palette: Palette::default(),
            draw_duration_secs: 0,
            low_performance: false,
            mute: false,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            viewport: Viewport::default(),
            scope: DrawScope::default(),
            audio: AudioAssets::default(),
            server: ServerSettings::default(),
        }
    }
}

impl LotteryConfig {
    pub fn draw_duration(&self) -> Option<Duration> {
        (self.draw_duration_secs > 0).then(|| Duration::from_secs(self.draw_duration_secs))
    }
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
/// An explicit `path` must exist; without one, `lottery.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<LotteryConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut config = if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        toml::from_str::<LotteryConfig>(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?
    } else if required {
        anyhow::bail!("config file '{}' does not exist", path.display());
    } else {
        LotteryConfig::default()
    };

    apply_env_overrides(&mut config, std::env::vars());
    Ok(config)
}

pub fn apply_env_overrides(
    config: &mut LotteryConfig,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    for (key, value) in vars {
        let Some(name) = key.strip_prefix("APP__") else {
            continue;
        };
        match name {
            "ROW_COUNT" => parse_into(name, &value, &mut config.row_count),
            "DRAW_DURATION_SECS" => parse_into(name, &value, &mut config.draw_duration_secs),
            "LOW_PERFORMANCE" => parse_into(name, &value, &mut config.low_performance),
            "MUTE" => parse_into(name, &value, &mut config.mute),
            "MAX_BATCH_SIZE" => parse_into(name, &value, &mut config.max_batch_size),
            "TEXT_SIZE" => parse_into(name, &value, &mut config.palette.text_size),
            "SERVER_URL" => config.server.base_url = value,
            "AUTH_TOKEN" => config.server.auth_token = Some(value),
            "REQUEST_TIMEOUT_SECS" => {
                parse_into(name, &value, &mut config.server.request_timeout_secs)
            }
            "PROJECT_ID" => match value.parse::<ProjectId>() {
                Ok(project_id) => config.server.project_id = Some(project_id),
                Err(err) => warn!(%value, error = %err, "ignoring APP__PROJECT_ID"),
            },
            _ => {}
        }
    }
}

fn parse_into<T: std::str::FromStr>(name: &str, raw: &str, slot: &mut T) {
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(variable = name, value = raw, "ignoring unparsable override"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
