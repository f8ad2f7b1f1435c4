// Offline rendering of patterns to standard MIDI files: one file per
// pattern, one track per instrument, sixteen divisions at a fixed tempo.
// A division is a note-on (plus subdivisions for rolls) or a rest; rests
// are plain delta time. All drums go to the GM percussion channel.

use std::path::Path;

use midly::num::{u4, u7, u15, u24, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::book::{Pattern, is_roll, roll_base};

pub const DIVISIONS: usize = 16;

const TICKS_PER_BEAT: u16 = 480;
/// One sixteenth-note division.
const DIVISION_TICKS: u32 = TICKS_PER_BEAT as u32 / 4;
/// A roll packs four hits into one division.
const ROLL_TICKS: u32 = DIVISION_TICKS / 4;

const PERCUSSION_CHANNEL: u8 = 9;
const VELOCITY: u8 = 90;
/// 120 BPM, in microseconds per beat.
const FIXED_TEMPO: u32 = 500_000;

/// General MIDI percussion note for an instrument id; rolled ids resolve
/// through their base instrument.
pub fn percussion_note(instrument: &str) -> Option<u8> {
    let note = match roll_base(instrument) {
        "BD" => 36, // Bass Drum 1
        "SN" => 38, // Acoustic Snare
        "CL" => 39, // Hand Clap
        "CH" => 42, // Closed Hi-Hat
        "LT" => 45, // Low Tom
        "OH" => 46, // Open Hi-Hat
        "MT" => 47, // Low-Mid Tom
        "HT" => 50, // High Tom
        "CY" => 51, // Ride Cymbal 1
        "RS" => 53, // Ride Bell
        "CB" => 56, // Cowbell
        "AC" => 69, // Cabasa
        "SH" => 70, // Maracas
        _ => return None,
    };
    Some(note)
}

/// Filesystem-safe name for a book or pattern label.
pub fn safe_id(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub fn pattern_to_smf(pattern: &Pattern) -> Smf<'static> {
    let mut smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::new(TICKS_PER_BEAT))),
        tracks: Vec::new(),
    };
    for (i, instrument) in pattern.instruments().enumerate() {
        smf.tracks
            .push(instrument_track(pattern, instrument, i == 0));
    }
    smf
}

pub fn write_pattern(pattern: &Pattern, path: &Path) -> anyhow::Result<()> {
    pattern_to_smf(pattern).save(path)?;
    Ok(())
}

fn instrument_track(pattern: &Pattern, instrument: &str, with_tempo: bool) -> Track<'static> {
    let mut events: Track = Vec::new();
    if with_tempo {
        events.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(FIXED_TEMPO))),
        });
    }

    let mut rest: u32 = 0;
    match percussion_note(instrument) {
        Some(note) => {
            let rolled = is_roll(instrument);
            for division in 0..DIVISIONS as u32 {
                if pattern.contains(instrument, division + 1) {
                    if rolled {
                        for _ in 0..4 {
                            push_note(&mut events, note, rest, ROLL_TICKS);
                            rest = 0;
                        }
                    } else {
                        push_note(&mut events, note, rest, DIVISION_TICKS);
                        rest = 0;
                    }
                } else {
                    rest += DIVISION_TICKS;
                }
            }
        }
        // no GM mapping: a track of nothing but the full-cycle rest
        None => rest = DIVISIONS as u32 * DIVISION_TICKS,
    }

    events.push(TrackEvent {
        delta: u28::new(rest),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    events
}

fn push_note(events: &mut Track<'static>, note: u8, delta: u32, duration: u32) {
    events.push(TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(PERCUSSION_CHANNEL),
            message: MidiMessage::NoteOn {
                key: u7::new(note),
                vel: u7::new(VELOCITY),
            },
        },
    });
    events.push(TrackEvent {
        delta: u28::new(duration),
        kind: TrackEventKind::Midi {
            channel: u4::new(PERCUSSION_CHANNEL),
            message: MidiMessage::NoteOff {
                key: u7::new(note),
                vel: u7::new(0),
            },
        },
    });
}
