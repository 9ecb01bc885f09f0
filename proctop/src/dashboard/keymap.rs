//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key means, before the active view decides whether it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    MoreElements,
    FewerElements,
    SlowerRefresh,
    FasterRefresh,
    Digit(u8),
    Submit,
    Erase,
    Ignore,
}

pub fn decode(key: &KeyEvent) -> Command {
    // Some platforms report releases and repeats as separate events.
    if key.kind == KeyEventKind::Release {
        return Command::Ignore;
    }

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Command::Quit
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        KeyCode::PageDown | KeyCode::Char('+') | KeyCode::Char(']') => Command::MoreElements,
        KeyCode::PageUp | KeyCode::Char('-') | KeyCode::Char('[') => Command::FewerElements,
        KeyCode::Right | KeyCode::Char('>') => Command::SlowerRefresh,
        KeyCode::Left | KeyCode::Char('<') => Command::FasterRefresh,
        KeyCode::Char(c) if c.is_ascii_digit() => Command::Digit(c as u8 - b'0'),
        KeyCode::Enter => Command::Submit,
        KeyCode::Backspace => Command::Erase,
        _ => Command::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(decode(&key(KeyCode::Char('q'))), Command::Quit);
        assert_eq!(decode(&key(KeyCode::Char('Q'))), Command::Quit);
        assert_eq!(decode(&key(KeyCode::Esc)), Command::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(decode(&ctrl_c), Command::Quit);
        assert_eq!(decode(&key(KeyCode::Char('c'))), Command::Ignore);
    }

    #[test]
    fn element_aliases() {
        for code in [KeyCode::PageDown, KeyCode::Char('+'), KeyCode::Char(']')] {
            assert_eq!(decode(&key(code)), Command::MoreElements);
        }
        for code in [KeyCode::PageUp, KeyCode::Char('-'), KeyCode::Char('[')] {
            assert_eq!(decode(&key(code)), Command::FewerElements);
        }
    }

    #[test]
    fn digits_and_enter() {
        assert_eq!(decode(&key(KeyCode::Char('0'))), Command::Digit(0));
        assert_eq!(decode(&key(KeyCode::Char('7'))), Command::Digit(7));
        assert_eq!(decode(&key(KeyCode::Enter)), Command::Submit);
        assert_eq!(decode(&key(KeyCode::Char('x'))), Command::Ignore);
    }

    #[test]
    fn releases_are_ignored() {
        let mut ev = key(KeyCode::Char('q'));
        ev.kind = KeyEventKind::Release;
        assert_eq!(decode(&ev), Command::Ignore);
    }
}
