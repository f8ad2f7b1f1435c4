// Offline batch conversion: every pattern in the book becomes one .mid
// file in the output directory. Prints a JSON map of book -> pattern ->
// file stem, handy for wiring the files into a page or playlist.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;

use beatbook::book::PatternBook;
use beatbook::midi::{safe_id, write_pattern};
use beatbook::shared::STEP_COUNT;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );

    let book_path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("patterns.json"));
    let out_dir: PathBuf = std::env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("mid"));

    let book = PatternBook::load(&book_path, STEP_COUNT)?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut info: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for b in &book.books {
        for (name, pattern) in &b.patterns {
            let stem = format!("{}-{}", safe_id(&b.name), safe_id(name));
            let path = out_dir.join(format!("{stem}.mid"));
            write_pattern(pattern, &path)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
            info.entry(b.name.clone())
                .or_default()
                .insert(name.clone(), stem);
        }
    }

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
