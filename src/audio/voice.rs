use super::sample_buffer::SampleBuffer;
use crate::audio_api::SampleId;

/// What a voice plays: a registered sample, or the synthesized fallback
/// tone used while a sample isn't decoded yet.
#[derive(Clone, Copy, Debug)]
pub enum VoiceKind {
    Sample { id: SampleId, pos: usize },
    Tone { phase: f32, phase_inc: f32, amp: f32 },
}

// Fallback tone shape: quiet and short so a late-decoding kit stays usable
// without being obnoxious.
const TONE_START_AMP: f32 = 0.2;
const TONE_DECAY: f32 = 0.9995;
const TONE_FLOOR: f32 = 0.0005;

#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub active: bool,
    kind: VoiceKind,
    /// Frame offset into the first render block this voice sounds in;
    /// consumed after that block.
    start_offset: usize,
}

impl Voice {
    pub fn silent() -> Self {
        Self {
            active: false,
            kind: VoiceKind::Tone {
                phase: 0.0,
                phase_inc: 0.0,
                amp: 0.0,
            },
            start_offset: 0,
        }
    }

    pub fn sample(id: SampleId, start_offset: usize) -> Self {
        Self {
            active: true,
            kind: VoiceKind::Sample { id, pos: 0 },
            start_offset,
        }
    }

    pub fn tone(freq: f32, sample_rate: f32) -> Self {
        Self {
            active: true,
            kind: VoiceKind::Tone {
                phase: 0.0,
                phase_inc: std::f32::consts::TAU * freq / sample_rate,
                amp: TONE_START_AMP,
            },
            start_offset: 0,
        }
    }

    pub fn sample_id(&self) -> Option<SampleId> {
        match self.kind {
            VoiceKind::Sample { id, .. } => Some(id),
            VoiceKind::Tone { .. } => None,
        }
    }

    /// Mix this voice into an interleaved output block. `buffer` must be
    /// the registered buffer for a sample voice and is ignored for tones.
    pub fn render(&mut self, out: &mut [f32], channels: usize, buffer: Option<&SampleBuffer>) {
        if !self.active {
            return;
        }
        let n_frames = out.len() / channels;
        let first = self.start_offset.min(n_frames);
        self.start_offset = 0;

        match &mut self.kind {
            VoiceKind::Sample { pos, .. } => {
                let Some(buffer) = buffer else {
                    self.active = false;
                    return;
                };
                for f in first..n_frames {
                    let Some(frame) = buffer.frame(*pos) else {
                        self.active = false;
                        break;
                    };
                    *pos += 1;
                    mix_frame(out, channels, f, frame);
                }
            }
            VoiceKind::Tone { phase, phase_inc, amp } => {
                for f in first..n_frames {
                    let s = *amp * phase.sin();
                    mix_frame(out, channels, f, [s, s]);
                    *phase += *phase_inc;
                    if *phase > std::f32::consts::TAU {
                        *phase -= std::f32::consts::TAU;
                    }
                    *amp *= TONE_DECAY;
                    if *amp < TONE_FLOOR {
                        self.active = false;
                        break;
                    }
                }
            }
        }
    }
}

#[inline]
fn mix_frame(out: &mut [f32], channels: usize, frame_idx: usize, frame: [f32; 2]) {
    let base = frame_idx * channels;
    out[base] += frame[0];
    if channels > 1 {
        out[base + 1] += frame[1];
    }
    // channels beyond stereo stay silent
}
