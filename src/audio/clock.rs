use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read side of the engine's frame counter: monotonic seconds since the
/// stream started. Cheap to clone and poll from the control thread.
#[derive(Clone, Debug)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioClock {
    pub fn new(frames: Arc<AtomicU64>, sample_rate: u32) -> Self {
        Self { frames, sample_rate }
    }

    pub fn now(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_tracks_the_frame_counter() {
        let frames = Arc::new(AtomicU64::new(0));
        let clock = AudioClock::new(Arc::clone(&frames), 44100);
        assert_eq!(clock.now(), 0.0);
        frames.store(44100, Ordering::Relaxed);
        assert!((clock.now() - 1.0).abs() < 1e-9);
        frames.store(66150, Ordering::Relaxed);
        assert!((clock.now() - 1.5).abs() < 1e-9);
    }
}
