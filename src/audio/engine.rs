use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::sample_buffer::SampleBuffer;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, SampleId};

// Fixed pool so we never malloc per-trigger in the audio callback.
const MAX_VOICES: usize = 32;

#[derive(Clone, Copy, Debug)]
struct Pending {
    frame: u64,
    id: SampleId,
}

/// Runs inside the cpal callback. Keeps a monotonic frame counter (the
/// audio clock), a pending list of precisely-timed starts, and the voice
/// pool. A pending start activates in the render block containing its
/// frame, at the exact offset inside that block.
pub struct Engine {
    sample_rate: f32,
    samples: HashMap<SampleId, SampleBuffer>,
    voices: [Voice; MAX_VOICES],
    pending: Vec<Pending>,
    frames_done: u64,
    clock_frames: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(sample_rate: u32, clock_frames: Arc<AtomicU64>) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            samples: HashMap::new(),
            voices: [Voice::silent(); MAX_VOICES],
            pending: Vec::with_capacity(64),
            frames_done: 0,
            clock_frames,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                self.samples.insert(id, buffer);
            }
            AudioCommand::PlayAt { id, when } => {
                let frame = (when.max(0.0) * self.sample_rate as f64).round() as u64;
                self.pending.push(Pending { frame, id });
            }
            AudioCommand::PlayTone { freq } => {
                self.launch(Voice::tone(freq, self.sample_rate));
            }
        }
    }

    fn launch(&mut self, voice: Voice) {
        // free slot, or steal the first one
        let slot = self.voices.iter().position(|v| !v.active).unwrap_or(0);
        self.voices[slot] = voice;
    }

    pub fn render_block(&mut self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        let n_frames = (out.len() / channels) as u64;
        let block_start = self.frames_done;
        let block_end = block_start + n_frames;

        // Promote pending starts that land in this block. A start already in
        // the past (late command, clock skew) begins at offset 0.
        let mut i = 0;
        while i < self.pending.len() {
            let p = self.pending[i];
            if p.frame < block_end {
                if self.samples.contains_key(&p.id) {
                    let offset = p.frame.saturating_sub(block_start) as usize;
                    self.launch(Voice::sample(p.id, offset));
                }
                self.pending.swap_remove(i);
            } else {
                i += 1;
            }
        }

        for voice in &mut self.voices {
            if !voice.active {
                continue;
            }
            let buffer = voice.sample_id().and_then(|id| self.samples.get(&id));
            voice.render(out, channels, buffer);
        }

        self.frames_done = block_end;
        self.clock_frames.store(block_end, Ordering::Relaxed);
    }
}
