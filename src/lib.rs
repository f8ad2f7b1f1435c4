//! beatbook: a step-sequencer drum machine with a lookahead audio
//! scheduler, plus offline rendering of the same patterns to MIDI files.
//!
//! The core loop books every step due inside a small window ahead of the
//! audio clock and tags each one with its precise start time, so playback
//! stays sample-accurate no matter how coarse or jittery the driving tick
//! is. See `sequencer` for the clock math, `machine` for the transport
//! state machine, `audio` for the cpal engine it schedules into.

pub mod audio;
pub mod audio_api;
pub mod bank;
pub mod book;
pub mod machine;
pub mod midi;
pub mod sequencer;
pub mod shared;
pub mod tui;

pub use machine::BeatMachine;
pub use book::{Pattern, PatternBook};
