// Per-instrument sample slots. Decoding runs on a background thread:
// read WAV -> resample -> register with the engine -> report back over a
// channel. The scheduler only ever asks "is this instrument ready", so a
// slow disk can never stall a pump. A failed decode leaves the slot in
// fallback for the rest of the session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::audio::SampleBuffer;
use crate::audio_api::{AudioCommand, SampleId, next_sample_id};
use crate::book::roll_base;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Decode in flight; triggers fall back to the tone voice.
    Pending,
    /// Buffer registered with the engine; triggers schedule precisely.
    Ready(SampleId),
    /// Decode failed; permanent fallback for this session.
    Failed,
}

#[derive(Debug)]
enum DecodeEvent {
    Decoded { instrument: String, id: SampleId },
    Failed { instrument: String },
}

#[derive(Default)]
pub struct SampleBank {
    slots: BTreeMap<String, SlotState>,
    events: Option<Receiver<DecodeEvent>>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kick off async decoding of every source. Call once, when the audio
    /// clock is first acquired.
    pub fn begin_decode(
        &mut self,
        sources: &BTreeMap<String, PathBuf>,
        audio_tx: Sender<AudioCommand>,
        sample_rate: u32,
    ) {
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<DecodeEvent>();
        self.events = Some(event_rx);
        for instrument in sources.keys() {
            self.slots.insert(instrument.clone(), SlotState::Pending);
        }

        let sources = sources.clone();
        thread::spawn(move || {
            for (instrument, path) in sources {
                match SampleBuffer::from_wav(&path, sample_rate) {
                    Ok(buffer) => {
                        let id = next_sample_id();
                        let _ = audio_tx.send(AudioCommand::RegisterSample { id, buffer });
                        let _ = event_tx.send(DecodeEvent::Decoded { instrument, id });
                    }
                    Err(e) => {
                        log::warn!("decode failed for {instrument} ({}): {e}", path.display());
                        let _ = event_tx.send(DecodeEvent::Failed { instrument });
                    }
                }
            }
        });
    }

    /// Absorb decode results. Non-blocking; call from the host tick.
    pub fn pump_events(&mut self) {
        let Some(rx) = &self.events else { return };
        while let Ok(event) = rx.try_recv() {
            match event {
                DecodeEvent::Decoded { instrument, id } => {
                    self.slots.insert(instrument, SlotState::Ready(id));
                }
                DecodeEvent::Failed { instrument } => {
                    self.slots.insert(instrument, SlotState::Failed);
                }
            }
        }
    }

    /// Translate a hit into an engine command. Rolled ids resolve to their
    /// base sample. Unknown instruments produce nothing at all.
    pub fn command_for(&self, instrument: &str, when: f64) -> Option<AudioCommand> {
        let base = roll_base(instrument);
        match self.slots.get(base)? {
            SlotState::Ready(id) => Some(AudioCommand::PlayAt { id: *id, when }),
            SlotState::Pending | SlotState::Failed => Some(AudioCommand::PlayTone {
                freq: fallback_freq(base),
            }),
        }
    }

    /// Instruments currently without a precise buffer, for the status line.
    pub fn fallback_instruments(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|(_, s)| !matches!(s, SlotState::Ready(_)))
            .map(|(inst, _)| inst.clone())
            .collect()
    }

    pub fn state(&self, instrument: &str) -> Option<SlotState> {
        self.slots.get(roll_base(instrument)).copied()
    }

    #[cfg(test)]
    pub(crate) fn set_slot(&mut self, instrument: &str, state: SlotState) {
        self.slots.insert(instrument.to_string(), state);
    }
}

/// Rough pitch per drum so the fallback tone at least hints at the part.
fn fallback_freq(instrument: &str) -> f32 {
    match instrument {
        "BD" => 65.0,
        "LT" => 110.0,
        "MT" => 150.0,
        "HT" => 200.0,
        "SN" => 190.0,
        "RS" | "CL" | "CB" => 520.0,
        "CH" | "OH" | "CY" | "SH" | "AC" => 880.0,
        _ => 220.0,
    }
}

/// Map WAV files in a directory to instrument ids by uppercased file stem
/// (`bd.wav` -> "BD").
pub fn index_samples_dir(dir: &Path) -> anyhow::Result<BTreeMap<String, PathBuf>> {
    let mut sources = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !is_wav {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            sources.insert(stem.to_ascii_uppercase(), path.clone());
        }
    }
    Ok(sources)
}
