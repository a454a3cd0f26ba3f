//! Card scene model, layout generation and tween scheduling for the draw stage.
//!
//! Nothing in this crate owns a clock or a render loop: callers pass `Instant`s
//! in and drive [`tween::TweenScheduler::tick`] once per animation frame.

use serde::{Deserialize, Serialize};

pub mod card;
pub mod layout;
pub mod tween;

pub use card::{CardObject, CardSkin, Color, Palette, Scene, SkinMode};
pub use layout::{LayoutError, LayoutKind, LayoutParams, WinnerSlot};
pub use tween::{CardMove, Easing, FrameGate, TweenBatchId, TweenEvent, TweenScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self).scale(t)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Position plus Euler rotation (radians).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }
}

/// A layout slot. Not owned by any card until the scheduler moves one there.
pub type Target = Transform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: 140.0,
            height: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Host-side drawing surface. The scheduler calls nothing here; the state
/// machine renders after every admitted frame.
pub trait SceneRenderer {
    fn render(&mut self, scene: &Scene);

    /// Celebratory particle burst over a freshly revealed winner card.
    fn celebrate(&mut self, _card: usize) {}

    /// Release every resource tied to the scene.
    fn dispose(&mut self) {}
}

pub struct NullRenderer;

impl SceneRenderer for NullRenderer {
    fn render(&mut self, _scene: &Scene) {}
}
