use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use audio_pool::{AudioBackend, AudioPool, SilentBackend};
use clap::Parser;
use draw_client::HttpDrawApi;
use lottery_core::{
    load_settings, sampler::REFRESH_INTERVAL, LotteryConfig, LotteryEvent, LotteryMachine,
    NoticeLevel,
};
use shared::domain::ProjectId;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::RecvError, mpsc},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod input;
mod renderer;

use input::{parse_command, Command};
use renderer::LogRenderer;

#[derive(Parser, Debug)]
#[command(about = "Runs a live prize draw against the draw-batch server")]
struct Args {
    /// Settings file; `lottery.toml` is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    project: Option<ProjectId>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    mute: bool,
    #[arg(long)]
    low_performance: bool,
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

impl Args {
    fn apply(&self, config: &mut LotteryConfig) {
        if let Some(url) = &self.server_url {
            config.server.base_url = url.clone();
        }
        if let Some(project) = self.project {
            config.server.project_id = Some(project);
        }
        if let Some(token) = &self.token {
            config.server.auth_token = Some(token.clone());
        }
        config.mute |= self.mute;
        config.low_performance |= self.low_performance;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut config = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut config);

    let mut api = HttpDrawApi::new(&config.server.base_url, config.server.request_timeout())?;
    if let Some(token) = &config.server.auth_token {
        api = api.with_auth_token(token.clone());
    }
    if let Some(project) = config.server.project_id {
        api = api.with_project_header(project);
    }
    info!(server = api.base_url(), project = ?config.server.project_id, "starting presenter");

    let audio = AudioPool::new(audio_backend(&config), config.mute);
    let fps = args.fps.clamp(1, 240);
    let mut machine = LotteryMachine::new(
        config,
        Arc::new(api),
        audio,
        Box::new(LogRenderer::new(u64::from(fps))),
    );

    if let Err(err) = machine.init(Instant::now().into_std()).await {
        warn!(error = %err, "starting with an incomplete project");
    }
    println!("ready: <enter> advances, 'esc' aborts a running draw, 'exit' leaves");

    let result = run_loop(&mut machine, fps).await;
    machine.shutdown();
    result
}

async fn run_loop(machine: &mut LotteryMachine, fps: u32) -> Result<()> {
    let mut frames = time::interval(Duration::from_secs(1) / fps);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut refresh = time::interval(REFRESH_INTERVAL);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events = machine.subscribe_events();

    let (tx, mut commands) = mpsc::channel(16);
    tokio::spawn(read_commands(tx));

    loop {
        let command = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            now = frames.tick() => {
                machine.tick(now.into_std());
                continue;
            }
            _ = refresh.tick() => {
                machine.refresh_tick();
                continue;
            }
            event = events.recv() => {
                match event {
                    Ok(event) => report(event),
                    Err(RecvError::Lagged(missed)) => warn!(missed, "operator feed lagged"),
                    Err(RecvError::Closed) => break,
                }
                continue;
            }
            command = commands.recv() => command,
        };

        let Some(command) = command else {
            info!("input closed");
            break;
        };
        let now = Instant::now().into_std();
        let outcome = match command {
            Command::Exit => break,
            Command::Resize { width, height } => {
                machine.resize(width, height);
                continue;
            }
            Command::Key(key) => machine.on_key(key, now).await,
            Command::Trigger(trigger) => machine.handle(trigger, now).await,
        };
        match outcome {
            Err(err) if err.is_ignored_input() => debug!(error = %err, "input ignored"),
            Err(err) => debug!(error = %err, "transition failed"),
            Ok(()) => {}
        }

        let mut dropped = 0;
        while commands.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded input received during the transition");
        }
    }
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => println!("unknown command '{}'", line.trim()),
            },
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read operator input");
                break;
            }
        }
    }
}

fn report(event: LotteryEvent) {
    match event {
        LotteryEvent::StateChanged { from, to } => println!("state: {from} -> {to}"),
        LotteryEvent::Notice { level, message } => {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            println!("[{tag}] {message}");
        }
        LotteryEvent::WinnerRevealed { person, prize, .. } => println!(
            "winner: {} {} {}{}",
            person.uid,
            person.name,
            person.masked_phone(),
            prize.map(|name| format!(" ({name})")).unwrap_or_default()
        ),
    }
}

#[cfg(feature = "playback")]
fn audio_backend(config: &LotteryConfig) -> Box<dyn AudioBackend> {
    match audio_pool::RodioBackend::new(&config.audio) {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            warn!(error = %err, "no audio output; continuing silently");
            Box::new(SilentBackend)
        }
    }
}

#[cfg(not(feature = "playback"))]
fn audio_backend(_config: &LotteryConfig) -> Box<dyn AudioBackend> {
    Box::new(SilentBackend)
}
