use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use crate::audio_api::AudioCommand;

mod clock;
mod engine;
mod sample_buffer;
mod voice;

pub use clock::AudioClock;
pub use sample_buffer::SampleBuffer;

use engine::Engine;

/// Owns the output stream, the command channel into the render callback,
/// and the clock readout. Dropping it tears the stream down.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: AudioClock,
    stream: cpal::Stream,
}

impl AudioHandle {
    /// Fire and forget; a full queue drops the command rather than block.
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }

    pub fn clock(&self) -> AudioClock {
        self.clock.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    /// Kick a paused stream back into motion. Harmless on a running one;
    /// some hosts suspend output until a user gesture, so start() calls
    /// this every time.
    pub fn resume(&self) -> anyhow::Result<()> {
        self.stream.play().context("resuming output stream")?;
        Ok(())
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    if config.sample_format() != cpal::SampleFormat::F32 {
        anyhow::bail!(
            "unsupported sample format {:?} (only f32 supported)",
            config.sample_format()
        );
    }

    let frames = Arc::new(AtomicU64::new(0));
    let mut engine = Engine::new(sample_rate, Arc::clone(&frames));

    let err_fn = |err| log::error!("audio output stream error: {err}");
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render_block(data, channels);
        },
        err_fn,
        None,
    )?;
    stream.play().context("failed to start output stream")?;

    log::info!("audio stream up: {sample_rate} Hz, {channels} channels");

    Ok(AudioHandle {
        tx,
        clock: AudioClock::new(frames, sample_rate),
        stream,
    })
}
