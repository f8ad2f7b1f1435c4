use std::path::PathBuf;
use std::time::Duration;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use beatbook::bank::index_samples_dir;
use beatbook::book::PatternBook;
use beatbook::machine::BeatMachine;
use beatbook::shared::{InputEvent, STEP_COUNT};
use beatbook::tui;

const TEMPO_NUDGE: u32 = 5;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    init_logging();

    let book_path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("patterns.json"));
    let samples_dir: PathBuf = std::env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("samples"));

    let book = PatternBook::load(&book_path, STEP_COUNT)?;
    anyhow::ensure!(!book.is_empty(), "{} holds no books", book_path.display());

    let sources = index_samples_dir(&samples_dir).unwrap_or_else(|e| {
        log::warn!(
            "no samples indexed from {} ({e}); everything will play fallback tones",
            samples_dir.display()
        );
        Default::default()
    });
    log::info!("{} instrument samples indexed", sources.len());

    let mut machine = BeatMachine::new(sources);
    let mut cursor = BookCursor::default();
    cursor.apply(&book, &mut machine);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    loop {
        machine.tick();

        let ds = machine.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        if let Some(event) = tui::input::poll_input(tick_rate)? {
            match event {
                InputEvent::Quit => {
                    machine.stop();
                    drop(term);
                    return Ok(());
                }
                InputEvent::PlayPress => machine.toggle(),
                InputEvent::NextPattern => {
                    cursor.next_pattern(&book);
                    cursor.apply(&book, &mut machine);
                }
                InputEvent::PrevPattern => {
                    cursor.prev_pattern(&book);
                    cursor.apply(&book, &mut machine);
                }
                InputEvent::NextBook => {
                    cursor.next_book(&book);
                    cursor.apply(&book, &mut machine);
                }
                InputEvent::TempoUp => machine.set_tempo(machine.tempo() + TEMPO_NUDGE),
                InputEvent::TempoDown => {
                    machine.set_tempo(machine.tempo().saturating_sub(TEMPO_NUDGE).max(1))
                }
            }
        }
    }
}

/// Which book/pattern the tui is showing. Switching mid-playback is fine:
/// the machine swaps the pattern wholesale and the scheduler picks it up
/// on the next drain.
#[derive(Default)]
struct BookCursor {
    book: usize,
    pattern: usize,
}

impl BookCursor {
    fn next_pattern(&mut self, book: &PatternBook) {
        let n = book.books[self.book].patterns.len();
        self.pattern = (self.pattern + 1) % n.max(1);
    }

    fn prev_pattern(&mut self, book: &PatternBook) {
        let n = book.books[self.book].patterns.len().max(1);
        self.pattern = (self.pattern + n - 1) % n;
    }

    fn next_book(&mut self, book: &PatternBook) {
        self.book = (self.book + 1) % book.books.len();
        self.pattern = 0;
    }

    fn apply(&self, book: &PatternBook, machine: &mut BeatMachine) {
        let b = &book.books[self.book];
        if let Some((name, pattern)) = b.patterns.get(self.pattern) {
            machine.select(&b.name, name, pattern.clone());
        }
    }
}

fn init_logging() {
    // log to a file so the tui owns the terminal
    if let Ok(file) = std::fs::File::create("beatbook.log") {
        let _ = simplelog::WriteLogger::init(
            simplelog::LevelFilter::Info,
            simplelog::Config::default(),
            file,
        );
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
