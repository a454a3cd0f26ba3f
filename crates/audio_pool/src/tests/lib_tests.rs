use std::{cell::RefCell, rc::Rc};

use super::*;

/// Backend whose clips stay `Playing` until the test flips them.
#[derive(Default, Clone)]
struct ScriptedBackend {
    clips: Rc<RefCell<Vec<Rc<RefCell<PlaybackStatus>>>>>,
    started: Rc<RefCell<Vec<Cue>>>,
    fail_next: Rc<RefCell<bool>>,
}

struct ScriptedClip {
    status: Rc<RefCell<PlaybackStatus>>,
}

impl PlaybackHandle for ScriptedClip {
    fn status(&self) -> PlaybackStatus {
        *self.status.borrow()
    }

    fn stop(&mut self) {
        *self.status.borrow_mut() = PlaybackStatus::Ended;
    }
}

impl AudioBackend for ScriptedBackend {
    fn play(&mut self, cue: Cue) -> Result<Box<dyn PlaybackHandle>> {
        if std::mem::take(&mut *self.fail_next.borrow_mut()) {
            return Err(anyhow::anyhow!("playback blocked by platform policy"));
        }
        let status = Rc::new(RefCell::new(PlaybackStatus::Playing));
        self.clips.borrow_mut().push(status.clone());
        self.started.borrow_mut().push(cue);
        Ok(Box::new(ScriptedClip { status }))
    }
}

impl ScriptedBackend {
    fn finish(&self, index: usize) {
        *self.clips.borrow()[index].borrow_mut() = PlaybackStatus::Ended;
    }

    fn fail(&self, index: usize) {
        *self.clips.borrow()[index].borrow_mut() = PlaybackStatus::Failed;
    }

    fn status(&self, index: usize) -> PlaybackStatus {
        *self.clips.borrow()[index].borrow()
    }
}

fn pool() -> (AudioPool, ScriptedBackend) {
    let backend = ScriptedBackend::default();
    (AudioPool::new(Box::new(backend.clone()), false), backend)
}

#[test]
fn chime_pool_is_capped_and_reopens_after_clips_finish() {
    let (mut pool, backend) = pool();
    let outcomes: Vec<PlayOutcome> = (0..15).map(|_| pool.play_chime()).collect();
    assert_eq!(
        outcomes.iter().filter(|o| **o == PlayOutcome::Started).count(),
        10
    );
    assert_eq!(
        outcomes.iter().filter(|o| **o == PlayOutcome::Dropped).count(),
        5
    );
    assert_eq!(pool.active_chimes(), 10);

    backend.finish(0);
    backend.finish(1);
    backend.fail(2);

    assert_eq!(pool.play_chime(), PlayOutcome::Started);
    assert!(pool.active_chimes() <= 10);
    assert_eq!(pool.active_chimes(), 8);
}

#[test]
fn end_chime_is_tracked_but_not_capped() {
    let (mut pool, _backend) = pool();
    for _ in 0..10 {
        pool.play_chime();
    }
    assert_eq!(pool.play_end_chime(), PlayOutcome::Started);
    assert_eq!(pool.tracked_effects(), 11);
    assert_eq!(pool.active_chimes(), 10);
}

#[test]
fn music_slot_replaces_previous_instance() {
    let (mut pool, backend) = pool();
    pool.start_music();
    pool.start_music();
    assert_eq!(backend.status(0), PlaybackStatus::Ended);
    assert_eq!(backend.status(1), PlaybackStatus::Playing);
    assert!(pool.is_music_playing());
    assert_eq!(pool.tracked_effects(), 0);

    pool.stop_music();
    assert!(!pool.is_music_playing());
    assert_eq!(backend.status(1), PlaybackStatus::Ended);
}

#[test]
fn muted_pool_never_touches_the_backend() {
    let backend = ScriptedBackend::default();
    let mut pool = AudioPool::new(Box::new(backend.clone()), true);
    assert_eq!(pool.play_chime(), PlayOutcome::Muted);
    assert_eq!(pool.play_end_chime(), PlayOutcome::Muted);
    assert_eq!(pool.start_music(), PlayOutcome::Muted);
    pool.stop_music();
    pool.reset();
    assert!(backend.started.borrow().is_empty());
}

#[test]
fn blocked_playback_is_swallowed() {
    let (mut pool, backend) = pool();
    *backend.fail_next.borrow_mut() = true;
    assert_eq!(pool.play_chime(), PlayOutcome::Failed);
    assert_eq!(pool.tracked_effects(), 0);
    assert_eq!(pool.play_chime(), PlayOutcome::Started);
}

#[test]
fn reset_and_dispose_stop_everything() {
    let (mut pool, backend) = pool();
    pool.start_music();
    pool.play_chime();
    pool.play_end_chime();
    pool.reset();
    assert_eq!(pool.tracked_effects(), 0);
    assert!(!pool.is_music_playing());
    assert!((0..3).all(|i| backend.status(i) == PlaybackStatus::Ended));

    pool.start_music();
    pool.play_chime();
    pool.dispose();
    assert_eq!(pool.tracked_effects(), 0);
    assert!(!pool.is_music_playing());
}

#[test]
fn silent_backend_loops_until_stopped() {
    let mut backend = SilentBackend;
    let mut music = backend.play(Cue::DrumRoll).expect("music");
    assert_eq!(music.status(), PlaybackStatus::Playing);
    music.stop();
    assert_eq!(music.status(), PlaybackStatus::Ended);

    let chime = backend.play(Cue::WinnerChime).expect("chime");
    assert_eq!(chime.status(), PlaybackStatus::Playing);
}
