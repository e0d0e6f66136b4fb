use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, ShopConfig, ShopError};
use crate::model::Model;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ShopConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, ShopError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(model, key));
                }
                Event::Mouse(mouse) => return Ok(self.handle_mouse(model, mouse)),
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, model: &Model, key: KeyEvent) -> Option<Message> {
        // While the filter line is being edited, every key goes there.
        if model.raw_keyevents() {
            return Some(Message::RawKey(key));
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left => Some(Message::MoveLeft),
            KeyCode::Right => Some(Message::MoveRight),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Home => Some(Message::MoveBeginning),
            KeyCode::End => Some(Message::MoveEnd),
            KeyCode::Char('/') => Some(Message::EnterFilter),
            KeyCode::Char('s') => Some(Message::SortCursorColumn),
            KeyCode::Char('y') => Some(Message::CopyRow),
            KeyCode::Char('h') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, model: &Model, mouse: MouseEvent) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.handle_left_click(model, mouse.column, mouse.row)
            }
            // Right-button events are consumed without any action for the
            // lifetime of the process, so no context action ever fires.
            MouseEventKind::Down(MouseButton::Right) => {
                trace!("Suppressed context click at {}:{}", mouse.column, mouse.row);
                None
            }
            _ => None,
        }
    }

    fn handle_left_click(&self, model: &Model, x: u16, y: u16) -> Option<Message> {
        let layout = &model.get_uidata().layout;
        if y == layout.header_row {
            let message = layout.column_at(x).map(Message::HeaderClick);
            trace!("Header click at {x}:{y} => {message:?}");
            return message;
        }
        None
    }
}
