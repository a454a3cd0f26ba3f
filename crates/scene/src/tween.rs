//! Frame-driven interpolation of card transforms, scene spin and camera.
//!
//! The scheduler never renders and never sleeps. Callers feed it `now` once
//! per frame through [`TweenScheduler::tick`] and react to the returned events.

use std::{
    f64::consts::PI,
    time::{Duration, Instant},
};

use rand::Rng;

use crate::{card::Camera, Scene, Target, Transform, Vec3};

pub const LOW_PERFORMANCE_FRAME_INTERVAL: Duration = Duration::from_millis(30);
pub const CAMERA_PHASE_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Fast start, long deceleration.
    ExponentialOut,
    ExponentialInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::ExponentialOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::ExponentialInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenBatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardMove {
    pub card: usize,
    pub target: Target,
    pub position_duration: Duration,
    pub rotation_duration: Duration,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenEvent {
    CardSettled { batch: TweenBatchId, card: usize },
    BatchComplete(TweenBatchId),
    SpinComplete,
    CameraReset,
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    from: Vec3,
    to: Vec3,
    start: Instant,
    duration: Duration,
}

impl Channel {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn sample(&self, now: Instant, easing: Easing) -> (Vec3, bool) {
        let t = self.progress(now);
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from.lerp(self.to, easing.apply(t)), false)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CardTween {
    card: usize,
    position: Channel,
    rotation: Channel,
    easing: Easing,
    settled: bool,
}

#[derive(Debug)]
struct ActiveBatch {
    id: TweenBatchId,
    tweens: Vec<CardTween>,
}

#[derive(Debug, Clone, Copy)]
struct Spin {
    to_y: f64,
    start: Instant,
    duration: Duration,
}

#[derive(Debug, Clone, Copy)]
enum CameraPhase {
    Position(Channel),
    Rotation(Channel),
}

#[derive(Debug, Default)]
pub struct TweenScheduler {
    batch: Option<ActiveBatch>,
    spin: Option<Spin>,
    camera: Option<CameraPhase>,
    next_batch: u64,
}

impl TweenScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves every card to its target. Each channel of each card gets its own
    /// duration drawn from `[duration, 2 * duration)`.
    pub fn transform(
        &mut self,
        scene: &Scene,
        targets: &[Target],
        duration: Duration,
        rng: &mut impl Rng,
        now: Instant,
    ) -> TweenBatchId {
        let mut jitter = || duration.mul_f64(1.0 + rng.gen::<f64>());
        let moves = targets
            .iter()
            .enumerate()
            .take(scene.len())
            .map(|(card, target)| CardMove {
                card,
                target: *target,
                position_duration: jitter(),
                rotation_duration: jitter(),
                easing: Easing::ExponentialOut,
            })
            .collect();
        self.animate(scene, moves, now)
    }

    /// Starts a new batch from the cards' current transforms. Any batch still
    /// in flight is dropped on the spot.
    pub fn animate(&mut self, scene: &Scene, moves: Vec<CardMove>, now: Instant) -> TweenBatchId {
        if let Some(previous) = self.batch.take() {
            tracing::debug!(batch = previous.id.0, "superseding in-flight tween batch");
        }
        let id = TweenBatchId(self.next_batch);
        self.next_batch += 1;

        let tweens = moves
            .into_iter()
            .filter_map(|mv| {
                let current = scene.card(mv.card)?.transform;
                Some(CardTween {
                    card: mv.card,
                    position: Channel {
                        from: current.position,
                        to: mv.target.position,
                        start: now,
                        duration: mv.position_duration,
                    },
                    rotation: Channel {
                        from: current.rotation,
                        to: mv.target.rotation,
                        start: now,
                        duration: mv.rotation_duration,
                    },
                    easing: mv.easing,
                    settled: false,
                })
            })
            .collect();

        self.batch = Some(ActiveBatch { id, tweens });
        id
    }

    pub fn is_transforming(&self) -> bool {
        self.batch.is_some()
    }

    pub fn active_batch(&self) -> Option<TweenBatchId> {
        self.batch.as_ref().map(|batch| batch.id)
    }

    /// Ambient y-rotation from 0 to `PI * turns * 1000` over `duration`.
    pub fn spin(&mut self, scene: &mut Scene, turns: f64, duration: Duration, now: Instant) {
        scene.rotation.y = 0.0;
        self.spin = Some(Spin {
            to_y: PI * turns * 1000.0,
            start: now,
            duration,
        });
    }

    pub fn halt_spin(&mut self, scene: &mut Scene) {
        self.spin = None;
        scene.rotation = Vec3::ZERO;
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    /// Flies the camera home, then straightens it.
    pub fn reset_camera(&mut self, scene: &Scene, now: Instant) {
        self.camera = Some(CameraPhase::Position(Channel {
            from: scene.camera.position,
            to: Camera::HOME,
            start: now,
            duration: CAMERA_PHASE_DURATION,
        }));
    }

    pub fn cancel_all(&mut self) {
        self.batch = None;
        self.spin = None;
        self.camera = None;
    }

    pub fn tick(&mut self, scene: &mut Scene, now: Instant) -> Vec<TweenEvent> {
        let mut events = Vec::new();
        self.tick_batch(scene, now, &mut events);
        self.tick_spin(scene, now, &mut events);
        self.tick_camera(scene, now, &mut events);
        events
    }

    fn tick_batch(&mut self, scene: &mut Scene, now: Instant, events: &mut Vec<TweenEvent>) {
        let Some(batch) = self.batch.as_mut() else {
            return;
        };
        for tween in batch.tweens.iter_mut().filter(|tween| !tween.settled) {
            let (position, position_done) = tween.position.sample(now, tween.easing);
            let (rotation, rotation_done) = tween.rotation.sample(now, tween.easing);
            if let Some(card) = scene.card_mut(tween.card) {
                card.transform = Transform { position, rotation };
            }
            if position_done && rotation_done {
                tween.settled = true;
                events.push(TweenEvent::CardSettled {
                    batch: batch.id,
                    card: tween.card,
                });
            }
        }
        if batch.tweens.iter().all(|tween| tween.settled) {
            events.push(TweenEvent::BatchComplete(batch.id));
            self.batch = None;
        }
    }

    fn tick_spin(&mut self, scene: &mut Scene, now: Instant, events: &mut Vec<TweenEvent>) {
        let Some(spin) = self.spin else {
            return;
        };
        let channel = Channel {
            from: Vec3::ZERO,
            to: Vec3::new(0.0, spin.to_y, 0.0),
            start: spin.start,
            duration: spin.duration,
        };
        let (rotation, done) = channel.sample(now, Easing::Linear);
        scene.rotation = rotation;
        if done {
            self.spin = None;
            events.push(TweenEvent::SpinComplete);
        }
    }

    fn tick_camera(&mut self, scene: &mut Scene, now: Instant, events: &mut Vec<TweenEvent>) {
        let Some(phase) = self.camera else {
            return;
        };
        match phase {
            CameraPhase::Position(channel) => {
                let (position, done) = channel.sample(now, Easing::Linear);
                scene.camera.position = position;
                if done {
                    self.camera = Some(CameraPhase::Rotation(Channel {
                        from: scene.camera.rotation,
                        to: Vec3::ZERO,
                        start: now,
                        duration: CAMERA_PHASE_DURATION,
                    }));
                }
            }
            CameraPhase::Rotation(channel) => {
                let (rotation, done) = channel.sample(now, Easing::Linear);
                scene.camera.rotation = rotation;
                if done {
                    scene.camera = Camera::default();
                    self.camera = None;
                    events.push(TweenEvent::CameraReset);
                }
            }
        }
    }
}

/// Drops frames that arrive faster than the low-performance cap allows.
#[derive(Debug, Clone)]
pub struct FrameGate {
    min_interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameGate {
    pub fn new(low_performance: bool) -> Self {
        Self {
            min_interval: low_performance.then_some(LOW_PERFORMANCE_FRAME_INTERVAL),
            last: None,
        }
    }

    pub fn admit(&mut self, now: Instant) -> bool {
        if let (Some(min), Some(last)) = (self.min_interval, self.last) {
            if now.saturating_duration_since(last) < min {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

#[cfg(test)]
#[path = "tests/tween_tests.rs"]
mod tests;
