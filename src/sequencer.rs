// The lookahead scheduler. A coarse tick (25ms-ish, jitter doesn't matter)
// drains every step whose target time falls inside the schedule-ahead
// window; each drained step carries its own precise audio-clock time, so
// actual sound start is decoupled from tick granularity. Same idea as a
// software sequencer clock: book ahead, never chase the timer.

use crate::book::{Pattern, is_roll, roll_base};
use crate::shared::SCHEDULE_AHEAD;

/// Seconds between steps at sixteenth-note resolution (4 steps per beat).
pub fn seconds_per_step(tempo: u32) -> f64 {
    (60.0 / tempo as f64) / 4.0
}

/// A step the scheduler has booked: 0-based step index plus the absolute
/// audio-clock time it should sound at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepTrigger {
    pub step: usize,
    pub when: f64,
}

/// One sound to start: instrument id (still carrying any roll marker; the
/// bank resolves it to a sample) and its precise start time.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub instrument: String,
    pub when: f64,
}

/// Transport cursor plus the drain logic. Owned by the playback controller;
/// nothing else mutates it.
#[derive(Clone, Debug)]
pub struct Scheduler {
    step_count: usize,
    tempo: u32,
    current_step: usize,
    next_step_time: f64,
}

impl Scheduler {
    pub fn new(tempo: u32, step_count: usize) -> Self {
        Self {
            step_count: step_count.max(1),
            tempo: tempo.max(1),
            current_step: 0,
            next_step_time: 0.0,
        }
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Takes effect on the next computed step interval, not retroactively.
    pub fn set_tempo(&mut self, tempo: u32) {
        self.tempo = tempo.max(1);
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }

    /// Rewind to step 0 with the next step due right now.
    pub fn reset(&mut self, now: f64) {
        self.current_step = 0;
        self.next_step_time = now;
    }

    /// Book every step due inside the lookahead window. Returns them in
    /// schedule order; the cursor advances one step per trigger and wraps.
    pub fn drain(&mut self, now: f64) -> Vec<StepTrigger> {
        let mut due = Vec::new();
        while self.next_step_time < now + SCHEDULE_AHEAD {
            due.push(StepTrigger {
                step: self.current_step,
                when: self.next_step_time,
            });
            self.next_step_time += seconds_per_step(self.tempo);
            self.current_step = (self.current_step + 1) % self.step_count;
        }
        due
    }
}

/// Expand one booked step into sound starts. A rolled instrument fires its
/// main hit plus three subdivisions of the base sound, evenly carving the
/// sixteenth into quarters.
pub fn hits_for_step(pattern: &Pattern, trigger: StepTrigger, tempo: u32) -> Vec<Hit> {
    let step_number = trigger.step as u32 + 1;
    let mut hits = Vec::new();
    for instrument in pattern.instruments_at(step_number) {
        hits.push(Hit {
            instrument: instrument.to_string(),
            when: trigger.when,
        });
        if is_roll(instrument) {
            let roll_unit = seconds_per_step(tempo) / 4.0;
            for k in 1..=3 {
                hits.push(Hit {
                    instrument: roll_base(instrument).to_string(),
                    when: trigger.when + roll_unit * k as f64,
                });
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Pattern;

    const EPS: f64 = 1e-9;

    #[test]
    fn step_spacing_follows_tempo() {
        assert!((seconds_per_step(120) - 0.125).abs() < EPS);
        assert!((seconds_per_step(60) - 0.25).abs() < EPS);
        // doubling tempo halves the spacing
        assert!((seconds_per_step(240) - seconds_per_step(120) / 2.0).abs() < EPS);
    }

    #[test]
    fn cursor_wraps_modulo_step_count() {
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        // drain enough wall-clock for 21 steps: 21 * 0.125 = 2.625
        let n = s.drain(2.5).len();
        assert_eq!(n, 21);
        assert_eq!(s.current_step(), 21 % 16);
    }

    #[test]
    fn next_step_time_advances_exactly_one_interval_per_step() {
        let mut s = Scheduler::new(120, 16);
        s.reset(1.0);
        let due = s.drain(1.35);
        assert_eq!(due.len(), 4); // 1.0, 1.125, 1.25, 1.375 < 1.45
        for (i, t) in due.iter().enumerate() {
            assert!((t.when - (1.0 + 0.125 * i as f64)).abs() < EPS);
            assert_eq!(t.step, i);
        }
        assert!((s.next_step_time() - 1.5).abs() < EPS);
    }

    #[test]
    fn drain_is_empty_until_window_reaches_next_step() {
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        assert_eq!(s.drain(0.0).len(), 1); // step 0 due immediately
        // next step at 0.125; window is now + 0.1, so nothing at now=0.0
        assert!(s.drain(0.0).is_empty());
        assert_eq!(s.drain(0.03).len(), 1);
    }

    #[test]
    fn tempo_change_applies_to_next_interval() {
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        s.drain(0.0); // books step 0, next at 0.125
        s.set_tempo(240);
        let due = s.drain(0.2);
        // 0.125, then 0.0625 spacing from the new tempo
        assert!((due[0].when - 0.125).abs() < EPS);
        assert!((due[1].when - 0.1875).abs() < EPS);
    }

    #[test]
    fn empty_pattern_emits_no_hits_but_cursor_advances() {
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        let pattern = Pattern::new();
        let due = s.drain(0.9);
        assert!(!due.is_empty());
        for t in &due {
            assert!(hits_for_step(&pattern, *t, 120).is_empty());
        }
        assert!(s.current_step() > 0);
    }

    #[test]
    fn four_on_the_floor_triggers_evenly() {
        let mut pattern = Pattern::new();
        pattern.set_steps("BD", &[1, 5, 9, 13], 16);
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        // one full cycle: steps 0..16, last one due at 1.875
        let mut hits = Vec::new();
        for t in s.drain(1.85) {
            hits.extend(hits_for_step(&pattern, t, 120));
        }
        assert_eq!(hits.len(), 4);
        let spacing = 4.0 * 0.125; // quarter-cycle apart
        for (i, h) in hits.iter().enumerate() {
            assert_eq!(h.instrument, "BD");
            assert!((h.when - spacing * i as f64).abs() < EPS);
        }
    }

    #[test]
    fn rolled_hit_is_a_four_hit_flam() {
        let mut pattern = Pattern::new();
        pattern.set_steps("SNR", &[1], 16);
        let t = StepTrigger { step: 0, when: 2.0 };
        let hits = hits_for_step(&pattern, t, 120);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].instrument, "SNR");
        let unit = seconds_per_step(120) / 4.0;
        for (k, h) in hits.iter().enumerate().skip(1) {
            assert_eq!(h.instrument, "SN");
            assert!((h.when - (2.0 + unit * k as f64)).abs() < EPS);
        }
        // all four land inside one sixteenth
        assert!(hits[3].when < 2.0 + seconds_per_step(120));
    }

    #[test]
    fn full_cycle_end_to_end() {
        let mut pattern = Pattern::new();
        pattern.set_steps("BD", &[1, 5, 9, 13], 16);
        pattern.set_steps("CH", &[1, 3, 5, 7, 9, 11, 13, 15], 16);
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        let mut bd_steps = Vec::new();
        let mut ch_steps = Vec::new();
        for t in s.drain(1.85) {
            for h in hits_for_step(&pattern, t, 120) {
                match h.instrument.as_str() {
                    "BD" => bd_steps.push(t.step),
                    "CH" => ch_steps.push(t.step),
                    other => panic!("unexpected instrument {other}"),
                }
                assert!((h.when - t.step as f64 * 0.125).abs() < EPS);
            }
        }
        assert_eq!(bd_steps, vec![0, 4, 8, 12]);
        assert_eq!(ch_steps, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn reset_rewinds_cursor_and_clock_origin() {
        let mut s = Scheduler::new(120, 16);
        s.reset(0.0);
        s.drain(1.0);
        assert_ne!(s.current_step(), 0);
        s.reset(7.5);
        assert_eq!(s.current_step(), 0);
        assert!((s.next_step_time() - 7.5).abs() < EPS);
        let due = s.drain(7.5);
        assert_eq!(due[0].step, 0);
        assert!((due[0].when - 7.5).abs() < EPS);
    }
}
