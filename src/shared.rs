// Constants and the display snapshot shared between the machine and the tui.
//
// The tui never reads transport state directly; each frame it asks the
// machine for a DisplayState and paints that. The "active step" mark
// therefore lands on the next frame after the trigger that set it, and
// when several triggers queue up between frames only the latest survives.

pub const STEP_COUNT: usize = 16;
pub const DEFAULT_TEMPO: u32 = 120;

/// Marker suffix on an instrument id for the rolled (subdivided) variant.
pub const ROLL_MARKER: char = 'R';

/// How far ahead of the audio clock the scheduler books steps, in seconds.
pub const SCHEDULE_AHEAD: f64 = 0.1;

/// Minimum gap between scheduler pumps, in milliseconds. The host tick can
/// run faster than this; the pump gate keeps the drain cadence fixed.
pub const PUMP_INTERVAL_MS: u64 = 25;

/// One row of the pattern display: instrument id plus on/off cells.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternRow {
    pub instrument: String,
    pub cells: Vec<bool>,
    pub rolled: bool,
}

/// Snapshot the tui paints from, rebuilt every frame.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub playing: bool,
    pub active_step: usize,
    pub tempo: u32,
    pub step_count: usize,
    pub book: String,
    pub pattern: String,
    pub rows: Vec<PatternRow>,
    /// Instruments still decoding or stuck in fallback, for the status line.
    pub fallback_instruments: Vec<String>,
}

/// Semantic input events resolved by the tui layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    PlayPress,
    NextPattern,
    PrevPattern,
    NextBook,
    TempoUp,
    TempoDown,
    Quit,
}
