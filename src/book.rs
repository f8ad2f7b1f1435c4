// The pattern data source: a JSON file shaped book -> pattern -> instrument
// -> step list. Step numbers are 1-based within the step count. Entries are
// converted leniently: a non-numeric or out-of-range step is dropped on its
// own, never failing the entry or the file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::shared::ROLL_MARKER;

/// True when the id names a rolled variant ("CHR", "SNR", ...). A bare "R"
/// is a plain instrument, not a roll of nothing.
pub fn is_roll(instrument: &str) -> bool {
    instrument.len() > 1 && instrument.ends_with(ROLL_MARKER)
}

/// Base instrument a rolled id plays: the id with the trailing marker
/// stripped. Plain ids come back unchanged.
pub fn roll_base(instrument: &str) -> &str {
    if is_roll(instrument) {
        &instrument[..instrument.len() - ROLL_MARKER.len_utf8()]
    } else {
        instrument
    }
}

/// One rhythm pattern: instrument id -> set of 1-based step numbers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pattern {
    rows: BTreeMap<String, Vec<u32>>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the steps for one instrument, keeping only numbers in
    /// `[1, step_count]`. Duplicates collapse.
    pub fn set_steps(&mut self, instrument: &str, steps: &[u32], step_count: usize) {
        let mut kept: Vec<u32> = steps
            .iter()
            .copied()
            .filter(|&s| s >= 1 && s as usize <= step_count)
            .collect();
        kept.sort_unstable();
        kept.dedup();
        self.rows.insert(instrument.to_string(), kept);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|steps| steps.is_empty())
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn steps(&self, instrument: &str) -> &[u32] {
        self.rows.get(instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, instrument: &str, step_number: u32) -> bool {
        self.steps(instrument).contains(&step_number)
    }

    /// Instruments that hit on the given 1-based step number.
    pub fn instruments_at(&self, step_number: u32) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(move |(_, steps)| steps.contains(&step_number))
            .map(|(inst, _)| inst.as_str())
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct RawPattern(BTreeMap<String, Vec<serde_json::Value>>);

#[derive(Deserialize)]
#[serde(transparent)]
struct RawBookFile(BTreeMap<String, BTreeMap<String, RawPattern>>);

impl RawPattern {
    fn sanitize(self, step_count: usize) -> Pattern {
        let mut pattern = Pattern::new();
        for (instrument, raw_steps) in self.0 {
            let steps: Vec<u32> = raw_steps
                .iter()
                .filter_map(|v| v.as_u64())
                .filter_map(|n| u32::try_from(n).ok())
                .collect();
            pattern.set_steps(&instrument, &steps, step_count);
        }
        pattern
    }
}

/// A named collection of patterns ("book" in the source material).
#[derive(Clone, Debug)]
pub struct Book {
    pub name: String,
    pub patterns: Vec<(String, Pattern)>,
}

/// All books from one JSON file.
#[derive(Clone, Debug, Default)]
pub struct PatternBook {
    pub books: Vec<Book>,
}

impl PatternBook {
    pub fn from_json(json: &str, step_count: usize) -> anyhow::Result<Self> {
        let raw: RawBookFile = serde_json::from_str(json)?;
        let books = raw
            .0
            .into_iter()
            .map(|(name, patterns)| Book {
                name,
                patterns: patterns
                    .into_iter()
                    .map(|(pname, raw)| (pname, raw.sanitize(step_count)))
                    .collect(),
            })
            .collect();
        Ok(Self { books })
    }

    pub fn load(path: &Path, step_count: usize) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading pattern book {}", path.display()))?;
        Self::from_json(&json, step_count)
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
