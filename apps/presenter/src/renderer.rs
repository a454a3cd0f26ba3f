use scene::{Scene, SceneRenderer};
use tracing::{debug, info};

/// Headless renderer: logs a scene summary every `every` frames.
pub struct LogRenderer {
    frames: u64,
    every: u64,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            frames: 0,
            every: every.max(1),
        }
    }
}

impl SceneRenderer for LogRenderer {
    fn render(&mut self, scene: &Scene) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }
        let lucky = scene
            .cards()
            .iter()
            .filter(|card| card.skin.mode == scene::SkinMode::Lucky)
            .count();
        debug!(
            frame = self.frames,
            cards = scene.len(),
            lucky,
            spin = scene.rotation.y,
            camera_z = scene.camera.position.z,
            "frame"
        );
    }

    fn celebrate(&mut self, card: usize) {
        info!(card, "celebration burst");
    }

    fn dispose(&mut self) {
        debug!(frames = self.frames, "renderer disposed");
    }
}
