use std::{collections::HashMap, io::Cursor, sync::Arc};

use anyhow::{anyhow, Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::{AudioAssets, AudioBackend, Cue, PlaybackHandle, PlaybackStatus};

/// Speaker output through the default device. Clips are read into memory
/// once so repeated chimes never touch the filesystem.
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clips: HashMap<Cue, Arc<Vec<u8>>>,
}

impl RodioBackend {
    pub fn new(assets: &AudioAssets) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("failed to open default audio output")?;
        let mut clips = HashMap::new();
        for cue in [Cue::WinnerChime, Cue::EndChime, Cue::DrumRoll] {
            let path = assets.path(cue);
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read audio asset {}", path.display()))?;
            tracing::info!(?cue, path = %path.display(), bytes = bytes.len(), "loaded audio asset");
            clips.insert(cue, Arc::new(bytes));
        }
        Ok(Self {
            _stream: stream,
            handle,
            clips,
        })
    }
}

struct RodioClip {
    sink: Sink,
}

impl PlaybackHandle for RodioClip {
    fn status(&self) -> PlaybackStatus {
        if self.sink.empty() {
            PlaybackStatus::Ended
        } else {
            PlaybackStatus::Playing
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

impl AudioBackend for RodioBackend {
    fn play(&mut self, cue: Cue) -> Result<Box<dyn PlaybackHandle>> {
        let bytes = self
            .clips
            .get(&cue)
            .ok_or_else(|| anyhow!("no audio loaded for {cue:?}"))?;
        let decoder = Decoder::new(Cursor::new(bytes.as_ref().clone()))
            .with_context(|| format!("failed to decode {cue:?}"))?;
        let sink = Sink::try_new(&self.handle).context("failed to open audio sink")?;
        sink.set_volume(cue.volume());
        if cue.is_looping() {
            sink.append(decoder.repeat_infinite());
        } else {
            sink.append(decoder);
        }
        Ok(Box::new(RodioClip { sink }))
    }
}
