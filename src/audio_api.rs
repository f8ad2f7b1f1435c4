// Commands the control side sends into the audio render callback. The
// engine can't touch the filesystem (that would stall the stream), so
// buffers are decoded elsewhere and registered here by id.

use std::sync::atomic::{AtomicU64, Ordering};

pub use crate::audio::SampleBuffer;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub u64);

/// Unique ids, safe to mint from the decode thread.
pub fn next_sample_id() -> SampleId {
    SampleId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    /// Hand a decoded buffer to the engine. Must arrive before any PlayAt
    /// for the same id.
    RegisterSample { id: SampleId, buffer: SampleBuffer },

    /// Start a registered sample at an absolute clock time in seconds,
    /// sample-accurate: the engine places it at the exact frame offset
    /// inside whichever render block contains `when`.
    PlayAt { id: SampleId, when: f64 },

    /// Best-effort fallback: start a short tone at the top of the next
    /// render block. No timing guarantee; used while a sample is still
    /// decoding or after its decode failed.
    PlayTone { freq: f32 },
}
