use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Line editor for the filter field.
///
/// Unlike a command prompt there is no "submit": every edit is reported back
/// immediately so the caller can re-apply the filter on each keystroke.
/// Enter keeps the current text and leaves editing, Esc clears it.
#[derive(Default)]
pub struct FilterLine {
    value: String,
    cursor: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterEdit {
    pub value: String,
    pub cursor: usize,
    /// Editing finished (Enter or Esc).
    pub done: bool,
}

impl FilterLine {
    pub fn read(&mut self, key: KeyEvent) -> FilterEdit {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.snapshot(true),
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.clear();
                self.snapshot(true)
            }
            (KeyCode::Backspace, KeyModifiers::NONE) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_pos();
                    self.value.remove(at);
                }
                self.snapshot(false)
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                self.snapshot(false)
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.value.chars().count() {
                    self.cursor += 1;
                }
                self.snapshot(false)
            }
            (code, _) => {
                if let Some(chr) = code.as_char() {
                    let at = self.byte_pos();
                    self.value.insert(at, chr);
                    self.cursor += 1;
                }
                self.snapshot(false)
            }
        }
    }

    /// Current text and cursor without consuming a key.
    pub fn current(&self) -> FilterEdit {
        self.snapshot(false)
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn snapshot(&self, done: bool) -> FilterEdit {
        FilterEdit {
            value: self.value.clone(),
            cursor: self.cursor,
            done,
        }
    }

    fn byte_pos(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.value.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn every_keystroke_reports_the_new_value() {
        let mut line = FilterLine::default();
        assert_eq!(line.read(key(KeyCode::Char('m'))).value, "m");
        assert_eq!(line.read(key(KeyCode::Char('u'))).value, "mu");
        let edit = line.read(key(KeyCode::Char('g')));
        assert_eq!(edit.value, "mug");
        assert!(!edit.done);
    }

    #[test]
    fn enter_keeps_the_text_and_escape_clears_it() {
        let mut line = FilterLine::default();
        line.read(key(KeyCode::Char('a')));
        let edit = line.read(key(KeyCode::Enter));
        assert!(edit.done);
        assert_eq!(edit.value, "a");

        let edit = line.read(key(KeyCode::Esc));
        assert!(edit.done);
        assert_eq!(edit.value, "");
    }

    #[test]
    fn backspace_removes_before_the_cursor() {
        let mut line = FilterLine::default();
        line.read(key(KeyCode::Char('a')));
        line.read(key(KeyCode::Char('b')));
        line.read(key(KeyCode::Left));
        let edit = line.read(key(KeyCode::Backspace));
        assert_eq!(edit.value, "b");
        assert_eq!(edit.cursor, 0);
    }
}
