use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

/// Poll for one semantic event, waiting at most `timeout`. Release and
/// repeat key events are ignored.
pub fn poll_input(timeout: Duration) -> anyhow::Result<Option<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        return Ok(map_key(key.code));
    }
    Ok(None)
}

fn map_key(code: KeyCode) -> Option<InputEvent> {
    match code {
        KeyCode::Char(' ') => Some(InputEvent::PlayPress),
        KeyCode::Right => Some(InputEvent::NextPattern),
        KeyCode::Left => Some(InputEvent::PrevPattern),
        KeyCode::Tab => Some(InputEvent::NextBook),
        KeyCode::Up => Some(InputEvent::TempoUp),
        KeyCode::Down => Some(InputEvent::TempoDown),
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_transport_events() {
        assert_eq!(map_key(KeyCode::Char(' ')), Some(InputEvent::PlayPress));
        assert_eq!(map_key(KeyCode::Esc), Some(InputEvent::Quit));
        assert_eq!(map_key(KeyCode::Char('q')), Some(InputEvent::Quit));
        assert_eq!(map_key(KeyCode::Right), Some(InputEvent::NextPattern));
        assert_eq!(map_key(KeyCode::Up), Some(InputEvent::TempoUp));
        assert_eq!(map_key(KeyCode::Char('x')), None);
    }
}
