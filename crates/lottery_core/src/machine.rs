use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use audio_pool::AudioPool;
use draw_client::{DrawApi, DrawTransactionClient, PendingBatch, ProjectSnapshot};
use rand::{rngs::StdRng, Rng, SeedableRng};
use scene::{
    card::table_roster,
    layout::{self, select_card, winner_slot},
    CardMove, Easing, FrameGate, LayoutKind, LayoutParams, Scene, SceneRenderer, SkinMode,
    TweenBatchId, TweenEvent, TweenScheduler, Viewport,
};
use shared::{
    domain::{Person, ProjectId},
    protocol::PreviewDrawRequest,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    config::LotteryConfig,
    error::LotteryError,
    events::{LotteryEvent, NoticeLevel},
    sampler::RefreshSampler,
    state::{Key, LotteryState, Trigger},
};

pub const LAYOUT_TRANSFORM_DURATION: Duration = Duration::from_millis(1000);
pub const WINNER_FLIGHT_POSITION: Duration = Duration::from_millis(1200);
pub const WINNER_FLIGHT_ROTATION: Duration = Duration::from_millis(900);
pub const QUIT_VOID_REASON: &str = "manual void and redraw";

const ARMED_SPIN: (f64, Duration) = (0.1, Duration::from_secs(2000));
const DRAWING_SPIN: (f64, Duration) = (10.0, Duration::from_secs(3000));
const EVENT_CAPACITY: usize = 64;

/// Top-level draw controller. Single-threaded: the host feeds it frames,
/// refresh ticks and operator triggers, passing the current `Instant` in.
pub struct LotteryMachine {
    config: LotteryConfig,
    project_id: Option<ProjectId>,
    state: LotteryState,
    scene: Scene,
    tweens: TweenScheduler,
    frame_gate: FrameGate,
    audio: AudioPool,
    renderer: Box<dyn SceneRenderer>,
    client: DrawTransactionClient,
    snapshot: ProjectSnapshot,
    sampler: RefreshSampler,
    rng: StdRng,
    events: broadcast::Sender<LotteryEvent>,
    winners: Vec<Person>,
    winner_cards: Vec<usize>,
    viewport: Viewport,
    layout_batch: Option<(TweenBatchId, LayoutKind)>,
    flight_batch: Option<TweenBatchId>,
    draw_deadline: Option<Instant>,
}

impl LotteryMachine {
    pub fn new(
        config: LotteryConfig,
        api: Arc<dyn DrawApi>,
        audio: AudioPool,
        renderer: Box<dyn SceneRenderer>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            project_id: config.server.project_id,
            state: LotteryState::Idle,
            scene: Scene::new(),
            tweens: TweenScheduler::new(),
            frame_gate: FrameGate::new(config.low_performance),
            audio,
            renderer,
            client: DrawTransactionClient::new(api),
            snapshot: ProjectSnapshot::default(),
            sampler: RefreshSampler::default(),
            rng: StdRng::from_entropy(),
            events,
            winners: Vec::new(),
            winner_cards: Vec::new(),
            viewport: config.viewport,
            layout_batch: None,
            flight_batch: None,
            draw_deadline: None,
            config,
        }
    }

    /// Fixes the random source, for reproducible scatter and sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LotteryEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> LotteryState {
        self.state
    }

    /// False while a layout transform or winner flight is in flight.
    pub fn can_operate(&self) -> bool {
        !self.tweens.is_transforming()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn pending_batch(&self) -> Option<&PendingBatch> {
        self.client.pending()
    }

    pub fn winners(&self) -> &[Person] {
        &self.winners
    }

    pub fn winner_cards(&self) -> &[usize] {
        &self.winner_cards
    }

    pub fn draw_deadline(&self) -> Option<Instant> {
        self.draw_deadline
    }

    pub fn audio(&self) -> &AudioPool {
        &self.audio
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn set_project(&mut self, project_id: Option<ProjectId>) {
        self.project_id = project_id;
    }

    /// Loads the project and lays the table out. A failed sync still builds
    /// the (blank) table; the error is returned after.
    pub async fn init(&mut self, now: Instant) -> Result<(), LotteryError> {
        let synced = self.sync().await;
        let roster = table_roster(&self.snapshot.people, self.config.row_count);
        self.scene.populate(&roster, &self.config.palette, &mut self.rng);
        self.transform_to(LayoutKind::Table, now);
        self.state = LotteryState::Idle;
        info!(cards = self.scene.len(), people = self.snapshot.people.len(), "table ready");
        synced
    }

    /// Replaces the local snapshot with the server's view of the project.
    pub async fn sync(&mut self) -> Result<(), LotteryError> {
        let Some(project_id) = self.project_id else {
            return Err(self.report(LotteryError::NoProject));
        };
        match self.client.sync(project_id).await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(())
            }
            Err(err) => Err(self.report(err.into())),
        }
    }

    pub async fn handle(&mut self, trigger: Trigger, now: Instant) -> Result<(), LotteryError> {
        match trigger {
            Trigger::Enter => self.enter(now),
            Trigger::Start => self.start(now).await,
            Trigger::Stop => self.stop(now),
            Trigger::Continue => self.continue_draw(now).await,
            Trigger::Quit => self.quit(now).await,
        }
    }

    /// Maps a key onto the transition it means in the current state. Keys
    /// with no meaning here are ignored.
    pub async fn on_key(&mut self, key: Key, now: Instant) -> Result<(), LotteryError> {
        match self.state.trigger_for(key) {
            Some(trigger) => self.handle(trigger, now).await,
            None => {
                debug!(?key, state = %self.state, "key ignored");
                Ok(())
            }
        }
    }

    pub fn enter(&mut self, now: Instant) -> Result<(), LotteryError> {
        self.guard(Trigger::Enter)?;
        self.arm(now);
        Ok(())
    }

    pub async fn start(&mut self, now: Instant) -> Result<(), LotteryError> {
        self.guard(Trigger::Start)?;
        let request = self.preview_request().map_err(|err| self.report(err))?;

        let batch = match self.client.preview(&request).await {
            Ok(batch) => batch,
            Err(err) => return Err(self.report(err.into())),
        };
        if batch.winners.is_empty() {
            return Err(self.report(LotteryError::NoWinners));
        }

        self.winners = self.snapshot.resolve_batch(&batch).winners;
        let prize_name = self
            .snapshot
            .prize(request.prize_id)
            .map(|prize| prize.name.clone())
            .unwrap_or_default();
        self.notice(
            NoticeLevel::Info,
            format!("drawing {} for {prize_name}", self.winners.len()),
        );

        self.audio.start_music();
        let (turns, duration) = DRAWING_SPIN;
        self.tweens.spin(&mut self.scene, turns, duration, now);
        self.draw_deadline = self.config.draw_duration().map(|after| now + after);
        self.set_state(LotteryState::Drawing);
        Ok(())
    }

    /// Freezes the winners: each gets a card and flies it to its slot.
    pub fn stop(&mut self, now: Instant) -> Result<(), LotteryError> {
        self.guard(Trigger::Stop)?;

        let total = self.winners.len();
        let mut taken = self.winner_cards.clone();
        for person in &self.winners {
            let card = select_card(&taken, self.scene.len(), person.id)
                .map_err(|err| self.report(err.into()))?;
            taken.push(card);
        }

        self.draw_deadline = None;
        self.audio.stop_music();
        self.audio.play_end_chime();
        self.tweens.halt_spin(&mut self.scene);

        let mut moves = Vec::with_capacity(total);
        let fresh = &taken[self.winner_cards.len()..];
        for (index, (person, &card)) in self.winners.iter().zip(fresh).enumerate() {
            let slot = winner_slot(index, total, self.config.card_size, self.viewport);
            if let Some(object) = self.scene.card_mut(card) {
                object.assign(Some(person), &self.config.palette, SkinMode::Lucky, slot.scale, 1.0);
            }
            moves.push(CardMove {
                card,
                target: slot.target,
                position_duration: WINNER_FLIGHT_POSITION,
                rotation_duration: WINNER_FLIGHT_ROTATION,
                easing: Easing::ExponentialInOut,
            });
        }
        self.winner_cards = taken;
        self.flight_batch = Some(self.tweens.animate(&self.scene, moves, now));
        self.set_state(LotteryState::Concluded);
        Ok(())
    }

    /// Commits the pending batch, resyncs and goes back to the sphere.
    pub async fn continue_draw(&mut self, now: Instant) -> Result<(), LotteryError> {
        self.guard(Trigger::Continue)?;
        match self.client.confirm().await {
            Ok(batch) => self.notice(
                NoticeLevel::Info,
                format!("{} winner(s) confirmed", batch.winners.len()),
            ),
            Err(err) => return Err(self.report(err.into())),
        }
        if let Err(err) = self.sync().await {
            warn!(error = %err, "resync after confirm failed; keeping previous snapshot");
        }
        self.arm(now);
        Ok(())
    }

    /// Voids whatever is pending, resyncs and re-arms.
    pub async fn quit(&mut self, now: Instant) -> Result<(), LotteryError> {
        self.guard(Trigger::Quit)?;
        if self.client.pending().is_some() {
            // A failed void leaves the draw running untouched for a retry.
            if let Err(err) = self.client.void(QUIT_VOID_REASON).await {
                return Err(self.report(err.into()));
            }
            self.notice(NoticeLevel::Info, "draw voided".to_string());
        }
        self.audio.stop_music();
        self.draw_deadline = None;
        if let Err(err) = self.sync().await {
            warn!(error = %err, "resync after void failed; keeping previous snapshot");
        }
        self.arm(now);
        Ok(())
    }

    /// One animation frame. Returns false when the frame gate skipped it.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.frame_gate.admit(now) {
            return false;
        }
        for event in self.tweens.tick(&mut self.scene, now) {
            self.on_tween_event(event, now);
        }
        if self.state == LotteryState::Drawing
            && self.draw_deadline.is_some_and(|deadline| now >= deadline)
        {
            info!("draw duration elapsed; stopping");
            if let Err(err) = self.stop(now) {
                warn!(error = %err, "automatic stop failed");
                self.draw_deadline = None;
            }
        }
        self.renderer.render(&self.scene);
        true
    }

    /// Refresh-sampler tick; re-skins a few cards when the wall is idle.
    pub fn refresh_tick(&mut self) -> usize {
        if !self.state.shows_live_cards() || !self.can_operate() {
            return 0;
        }
        let mode = match self.state {
            LotteryState::Idle => SkinMode::Default,
            _ => SkinMode::Sphere,
        };
        self.sampler
            .refresh(
                &mut self.scene,
                &self.snapshot.people,
                &self.winner_cards,
                &self.config.palette,
                mode,
                &mut self.rng,
            )
            .len()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        debug!(width, height, "viewport resized");
        self.renderer.render(&self.scene);
    }

    /// Teardown: no more frames, timers, sounds or cards.
    pub fn shutdown(&mut self) {
        self.tweens.cancel_all();
        self.draw_deadline = None;
        self.layout_batch = None;
        self.flight_batch = None;
        self.audio.dispose();
        self.renderer.dispose();
        self.scene.clear();
        if let Some(pending) = self.client.pending() {
            warn!(batch_id = %pending.id, "shutting down with an unconfirmed draw batch");
        }
        info!("lottery shut down");
    }

    fn guard(&self, trigger: Trigger) -> Result<(), LotteryError> {
        if !self.state.accepts(trigger) {
            debug!(?trigger, state = %self.state, "transition ignored");
            return Err(LotteryError::InvalidTransition {
                state: self.state,
                trigger,
            });
        }
        if !self.can_operate() {
            debug!(?trigger, "transition dropped while transforming");
            return Err(LotteryError::Busy);
        }
        Ok(())
    }

    fn preview_request(&self) -> Result<PreviewDrawRequest, LotteryError> {
        let project_id = self.project_id.ok_or(LotteryError::NoProject)?;
        let prize = self
            .snapshot
            .current_prize
            .as_ref()
            .ok_or(LotteryError::NoPrize)?;
        if prize.is_exhausted() {
            return Err(LotteryError::PrizeExhausted(prize.name.clone()));
        }
        if self.snapshot.people.is_empty() {
            return Err(LotteryError::NoMembers);
        }
        let scope = &self.config.scope;
        Ok(PreviewDrawRequest {
            project_id,
            prize_id: prize.id,
            count: prize.remaining().min(self.config.max_batch_size),
            scope: (!scope.is_empty()).then(|| scope.clone()),
        })
    }

    /// Shared tail of enter, continue and quit: back to the spinning sphere.
    fn arm(&mut self, now: Instant) {
        self.audio.reset();
        self.tint_pattern_cards();
        self.tweens.halt_spin(&mut self.scene);
        self.transform_to(LayoutKind::Sphere, now);
        self.set_state(LotteryState::Armed);
    }

    fn tint_pattern_cards(&mut self) {
        let limit = self.config.row_count * scene::card::TABLE_MIN_COLUMNS;
        let base = self.config.palette.card();
        for number in self.config.palette.pattern_list.iter().take(limit) {
            let alpha = self.rng.gen_range(0.25_f32..0.75);
            if let Some(card) = number.checked_sub(1).and_then(|i| self.scene.card_mut(i)) {
                card.skin.background = base.with_alpha(alpha);
            }
        }
    }

    fn transform_to(&mut self, kind: LayoutKind, now: Instant) {
        let params = LayoutParams::new(self.config.row_count, self.config.card_size);
        let targets = layout::layout(kind, self.scene.len(), &params);
        let batch = self.tweens.transform(
            &self.scene,
            &targets,
            LAYOUT_TRANSFORM_DURATION,
            &mut self.rng,
            now,
        );
        self.flight_batch = None;
        self.layout_batch = Some((batch, kind));
    }

    fn on_tween_event(&mut self, event: TweenEvent, now: Instant) {
        match event {
            TweenEvent::CardSettled { batch, card } if Some(batch) == self.flight_batch => {
                self.reveal_winner(card, now);
            }
            TweenEvent::BatchComplete(batch) if Some(batch) == self.flight_batch => {
                self.flight_batch = None;
            }
            TweenEvent::BatchComplete(batch) => {
                if let Some((expected, kind)) = self.layout_batch {
                    if expected == batch {
                        self.layout_batch = None;
                        self.on_layout_settled(kind, now);
                    }
                }
            }
            TweenEvent::CardSettled { .. } | TweenEvent::SpinComplete | TweenEvent::CameraReset => {}
        }
    }

    fn reveal_winner(&mut self, card: usize, now: Instant) {
        self.audio.play_chime();
        if !self.config.low_performance {
            self.renderer.celebrate(card);
        }
        self.tweens.reset_camera(&self.scene, now);

        let person = self
            .winner_cards
            .iter()
            .position(|&c| c == card)
            .and_then(|slot| self.winners.get(slot))
            .cloned();
        if let Some(person) = person {
            let prize = self.snapshot.current_prize.as_ref().map(|p| p.name.clone());
            info!(card, name = %person.name, phone = %person.masked_phone(), "winner revealed");
            let _ = self.events.send(LotteryEvent::WinnerRevealed { card, person, prize });
        }
    }

    fn on_layout_settled(&mut self, kind: LayoutKind, now: Instant) {
        debug!(?kind, "layout settled");
        if kind != LayoutKind::Sphere {
            return;
        }
        for &card in &self.winner_cards {
            if let Some(object) = self.scene.card_mut(card) {
                object.restyle(&self.config.palette, SkinMode::Sphere, 1.0, 1.0);
            }
        }
        self.winner_cards.clear();
        self.winners.clear();
        if self.state == LotteryState::Armed {
            let (turns, duration) = ARMED_SPIN;
            self.tweens.spin(&mut self.scene, turns, duration, now);
        }
    }

    fn set_state(&mut self, to: LotteryState) {
        let from = std::mem::replace(&mut self.state, to);
        if from != to {
            info!(%from, %to, "lottery state changed");
            let _ = self.events.send(LotteryEvent::StateChanged { from, to });
        }
    }

    fn notice(&self, level: NoticeLevel, message: String) {
        let _ = self.events.send(LotteryEvent::Notice { level, message });
    }

    /// Tells the operator about `err` and hands it back.
    fn report(&self, err: LotteryError) -> LotteryError {
        if !err.is_ignored_input() {
            warn!(error = %err, state = %self.state, "lottery operation failed");
            self.notice(err.notice_level(), err.to_string());
        }
        err
    }
}

#[cfg(test)]
#[path = "tests/machine_tests.rs"]
mod tests;
