// The playback controller: the Idle/Playing state machine around the
// scheduler, plus lazy audio acquisition. All transport mutation happens
// here or in the scheduler it owns; the tui only ever sees DisplayState
// snapshots.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::audio::{AudioHandle, start_audio};
use crate::audio_api::AudioCommand;
use crate::bank::SampleBank;
use crate::book::{Pattern, is_roll};
use crate::sequencer::{Scheduler, hits_for_step};
use crate::shared::{DEFAULT_TEMPO, DisplayState, PUMP_INTERVAL_MS, PatternRow, STEP_COUNT};

pub struct BeatMachine {
    audio: Option<AudioHandle>,
    bank: SampleBank,
    sources: BTreeMap<String, PathBuf>,
    scheduler: Scheduler,
    pattern: Pattern,
    rows: Vec<PatternRow>,
    book_name: String,
    pattern_name: String,
    playing: bool,
    active_step: usize,
    /// Re-arm handle for the pump: when the next drain may run. None while
    /// stopped, which is what "cancel the pending re-arm" means here.
    next_pump: Option<Instant>,
}

impl BeatMachine {
    pub fn new(sources: BTreeMap<String, PathBuf>) -> Self {
        Self::with_settings(sources, DEFAULT_TEMPO, STEP_COUNT)
    }

    pub fn with_settings(
        sources: BTreeMap<String, PathBuf>,
        tempo: u32,
        step_count: usize,
    ) -> Self {
        Self {
            audio: None,
            bank: SampleBank::new(),
            sources,
            scheduler: Scheduler::new(tempo, step_count),
            pattern: Pattern::new(),
            rows: Vec::new(),
            book_name: String::new(),
            pattern_name: String::new(),
            playing: false,
            active_step: 0,
            next_pump: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn tempo(&self) -> u32 {
        self.scheduler.tempo()
    }

    pub fn set_tempo(&mut self, tempo: u32) {
        self.scheduler.set_tempo(tempo);
    }

    /// Replace the active pattern wholesale. Safe mid-playback: steps not
    /// yet drained pick up the new pattern, already-booked ones don't.
    pub fn update_pattern(&mut self, pattern: Pattern) {
        self.rows = build_rows(&pattern, self.scheduler.step_count());
        self.pattern = pattern;
    }

    /// update_pattern plus the labels the status line shows.
    pub fn select(&mut self, book: &str, name: &str, pattern: Pattern) {
        self.book_name = book.to_string();
        self.pattern_name = name.to_string();
        self.update_pattern(pattern);
    }

    /// Idle -> Playing. Lazily opens the audio stream on first use and
    /// kicks off sample decoding; if no device is available this logs and
    /// stays Idle so a later press can retry.
    pub fn start(&mut self) {
        if self.playing {
            return;
        }
        if self.audio.is_none() {
            match start_audio() {
                Ok(handle) => {
                    self.bank
                        .begin_decode(&self.sources, handle.sender(), handle.sample_rate());
                    self.audio = Some(handle);
                }
                Err(e) => {
                    log::error!("cannot start playback, audio unavailable: {e:#}");
                    return;
                }
            }
        }
        let Some(audio) = &self.audio else { return };
        if let Err(e) = audio.resume() {
            log::warn!("stream resume failed: {e:#}");
        }
        let now = audio.clock().now();
        self.begin_at(now);
    }

    /// Playing -> Idle. Idempotent; sounds already booked inside the
    /// lookahead window still play out (at most SCHEDULE_AHEAD seconds).
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.next_pump = None;
        self.scheduler.reset(0.0);
        self.active_step = 0;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Host tick: absorb decode results and, while playing, run the pump
    /// whenever its re-arm interval has elapsed.
    pub fn tick(&mut self) {
        self.bank.pump_events();
        if !self.playing {
            return;
        }
        let now_wall = Instant::now();
        match self.next_pump {
            Some(at) if now_wall < at => return,
            _ => {}
        }
        self.next_pump = Some(now_wall + Duration::from_millis(PUMP_INTERVAL_MS));

        let Some(audio) = &self.audio else { return };
        let now = audio.clock().now();
        let cmds = self.pump_at(now);
        if let Some(audio) = &self.audio {
            for cmd in cmds {
                audio.send(cmd);
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            playing: self.playing,
            active_step: self.active_step,
            tempo: self.scheduler.tempo(),
            step_count: self.scheduler.step_count(),
            book: self.book_name.clone(),
            pattern: self.pattern_name.clone(),
            rows: self.rows.clone(),
            fallback_instruments: self.bank.fallback_instruments(),
        }
    }

    // Transition into Playing with the cursor rewound and the first step
    // due at `now`. Split out so the timing contract tests run clockless.
    fn begin_at(&mut self, now: f64) {
        self.playing = true;
        self.scheduler.reset(now);
        self.active_step = 0;
        self.next_pump = Some(Instant::now());
    }

    // One pump: drain due steps, expand hits, translate through the bank.
    // The active-step mark follows the latest booked step; the tui paints
    // it on its next frame.
    fn pump_at(&mut self, now: f64) -> Vec<AudioCommand> {
        let tempo = self.scheduler.tempo();
        let mut cmds = Vec::new();
        for trigger in self.scheduler.drain(now) {
            for hit in hits_for_step(&self.pattern, trigger, tempo) {
                if let Some(cmd) = self.bank.command_for(&hit.instrument, hit.when) {
                    cmds.push(cmd);
                }
            }
            self.active_step = trigger.step;
        }
        cmds
    }
}

// Widget teardown must never leave the scheduler armed.
impl Drop for BeatMachine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_rows(pattern: &Pattern, step_count: usize) -> Vec<PatternRow> {
    pattern
        .instruments()
        .map(|instrument| PatternRow {
            instrument: instrument.to_string(),
            cells: (1..=step_count as u32)
                .map(|n| pattern.contains(instrument, n))
                .collect(),
            rolled: is_roll(instrument),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::next_sample_id;
    use crate::bank::SlotState;

    fn machine_with_pattern(pattern: Pattern) -> BeatMachine {
        let mut m = BeatMachine::new(BTreeMap::new());
        m.bank.set_slot("BD", SlotState::Ready(next_sample_id()));
        m.bank.set_slot("CH", SlotState::Ready(next_sample_id()));
        m.update_pattern(pattern);
        m
    }

    fn four_on_floor() -> Pattern {
        let mut p = Pattern::new();
        p.set_steps("BD", &[1, 5, 9, 13], 16);
        p
    }

    #[test]
    fn start_resets_cursor_and_clock_origin() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(3.0);
        m.pump_at(4.0);
        assert_ne!(m.scheduler.current_step(), 0);

        m.stop();
        assert_eq!(m.active_step, 0);
        m.begin_at(9.0);
        assert_eq!(m.scheduler.current_step(), 0);
        assert!((m.scheduler.next_step_time() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(0.0);
        m.pump_at(0.5);
        m.stop();
        let after_first = (m.playing, m.active_step, m.scheduler.current_step());
        m.stop();
        assert_eq!(
            after_first,
            (m.playing, m.active_step, m.scheduler.current_step())
        );
        assert!(!m.playing);
    }

    #[test]
    fn start_while_playing_is_a_noop() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(0.0);
        m.pump_at(1.0);
        let step_before = m.scheduler.current_step();
        // the public path: a second start must not rewind anything
        m.start();
        assert_eq!(m.scheduler.current_step(), step_before);
    }

    #[test]
    fn empty_pattern_emits_nothing_but_advances() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(0.0);
        assert!(!m.pump_at(0.4).is_empty());

        // replace mid-playback with an empty pattern
        m.update_pattern(Pattern::new());
        let before = m.scheduler.current_step();
        let cmds = m.pump_at(1.2);
        assert!(cmds.is_empty());
        assert!(m.scheduler.current_step() != before);
        assert_eq!(m.active_step, m.scheduler.current_step().wrapping_sub(1) % 16);
    }

    #[test]
    fn pump_translates_hits_through_the_bank() {
        let mut p = four_on_floor();
        p.set_steps("XX", &[1], 16); // no slot: silently skipped
        let mut m = machine_with_pattern(p);
        m.begin_at(0.0);
        let cmds = m.pump_at(0.0); // only step 0 is due
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], AudioCommand::PlayAt { .. }));
    }

    #[test]
    fn active_step_follows_latest_trigger() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(0.0);
        m.pump_at(0.6); // books steps 0..=5 (0.625 < 0.7)
        assert_eq!(m.active_step, 5);
        let ds = m.display_state();
        assert_eq!(ds.active_step, 5);
        assert!(ds.playing);
    }

    #[test]
    fn rows_rebuild_on_pattern_update() {
        let mut m = machine_with_pattern(Pattern::new());
        assert!(m.display_state().rows.is_empty());
        let mut p = Pattern::new();
        p.set_steps("CHR", &[2, 4], 16);
        m.update_pattern(p);
        let rows = m.display_state().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].instrument, "CHR");
        assert!(rows[0].rolled);
        assert!(!rows[0].cells[0]);
        assert!(rows[0].cells[1]);
        assert!(rows[0].cells[3]);
    }

    #[test]
    fn tempo_applies_to_subsequent_steps() {
        let mut m = machine_with_pattern(four_on_floor());
        m.begin_at(0.0);
        m.pump_at(0.0);
        m.set_tempo(240);
        assert_eq!(m.tempo(), 240);
        // next step still at the old spacing, then the new one kicks in
        assert!((m.scheduler.next_step_time() - 0.125).abs() < 1e-9);
    }
}
