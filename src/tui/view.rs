// Paints a DisplayState snapshot: transport row with the moving step mark,
// one on/off row per instrument, status line. The snapshot model is what
// keeps visuals off the audio path; whatever the machine last booked is
// simply what the next frame shows.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::shared::{DisplayState, PatternRow};

const CELL: &str = " ▊ ";
const ROLL_CELL: &str = " ▚ ";
const EMPTY_CELL: &str = " · ";

pub fn render(frame: &mut Frame, area: Rect, ds: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let mut lines: Vec<Line> = vec![transport_line(ds), Line::default()];
    for row in &ds.rows {
        lines.push(pattern_line(ds, row));
    }
    frame.render_widget(Paragraph::new(lines), sections[0]);
    frame.render_widget(Paragraph::new(status_line(ds)), sections[1]);
}

fn transport_line(ds: &DisplayState) -> Line<'static> {
    let glyph = if ds.playing { " ⏸  " } else { " ▶  " };
    let mut spans = vec![Span::styled(
        glyph.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for step in 0..ds.step_count {
        let label = format!("{:^3}", step + 1);
        let style = if ds.active_step == step && ds.playing {
            Style::default().fg(Color::Black).bg(Color::LightYellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

fn pattern_line(ds: &DisplayState, row: &PatternRow) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{:>3} ", row.instrument),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (step, &on) in row.cells.iter().enumerate() {
        let (text, mut style) = if on {
            let cell = if row.rolled { ROLL_CELL } else { CELL };
            (cell, Style::default().fg(Color::White))
        } else {
            (EMPTY_CELL, Style::default().fg(Color::DarkGray))
        };
        if ds.playing && ds.active_step == step {
            style = style.bg(Color::Rgb(60, 60, 60));
        }
        spans.push(Span::styled(text.to_string(), style));
    }
    Line::from(spans)
}

fn status_line(ds: &DisplayState) -> Line<'static> {
    let mut text = format!(
        " {} / {}  {} bpm  [space] play  [←→] pattern  [tab] book  [↑↓] tempo  [q] quit",
        ds.book, ds.pattern, ds.tempo
    );
    if !ds.fallback_instruments.is_empty() {
        text.push_str(&format!("  (loading: {})", ds.fallback_instruments.join(" ")));
    }
    Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
}
