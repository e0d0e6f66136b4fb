use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use crate::model::{Model, UIData};

pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
pub const COLUMN_SPACER: usize = 1;

const TOAST_MAX_WIDTH: u16 = 44;

pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        TableUI
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let area = frame.area();
        if area.width == 0 || area.height == 0 {
            return;
        }

        if uidata.table.is_empty() {
            frame.render_widget(
                Paragraph::new("No data").centered(),
                Rect::new(0, area.height / 2, area.width, 1),
            );
        } else {
            self.draw_table(uidata, frame, area);
        }
        self.draw_statusline(uidata, frame, area);
        self.draw_toasts(uidata, frame, area);
        if uidata.show_popup {
            self.draw_popup(uidata, frame, area);
        }
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header_row = uidata.layout.header_row;
        for (cidx, (view, &(x, width))) in uidata
            .table
            .iter()
            .zip(uidata.layout.column_spans.iter())
            .enumerate()
        {
            if x >= area.width {
                break;
            }
            let width = width.min(area.width - x);

            let mut header = Span::from(view.name.as_str()).bold().underlined();
            if cidx == uidata.selected_column {
                header = header.yellow();
            }
            frame.render_widget(
                Paragraph::new(Line::from(header)),
                Rect::new(x, header_row, width, 1),
            );

            for (ridx, cell) in view.data.iter().enumerate() {
                let y = header_row + TABLE_HEADER_HEIGHT as u16 + ridx as u16;
                if y + STATUSLINE_HEIGHT as u16 >= area.height {
                    break;
                }
                let mut line = Line::from(cell.as_str());
                if ridx == uidata.selected_row {
                    line = line.reversed();
                }
                frame.render_widget(Paragraph::new(line), Rect::new(x, y, width, 1));
            }
        }
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let y = area.height - 1;
        let left = Rect::new(0, y, area.width / 2, 1);
        let right = Rect::new(area.width / 2, y, area.width - area.width / 2, 1);

        if uidata.filter_active || !uidata.filter.value.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::from("/").bold(),
                    Span::from(uidata.filter.value.as_str()),
                ])),
                left,
            );
            if uidata.filter_active {
                let x = 1 + uidata.filter.cursor as u16;
                frame.set_cursor_position(Position::new(x.min(area.width - 1), y));
            }
        } else {
            frame.render_widget(
                Paragraph::new(format!("{} ({} rows)", uidata.name, uidata.nrows)),
                left,
            );
        }
        frame.render_widget(
            Paragraph::new(uidata.status_message.as_str()).right_aligned(),
            right,
        );
    }

    // Toasts stack below the header at the right edge, newest last.
    fn draw_toasts(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut y = uidata.layout.header_row + TABLE_HEADER_HEIGHT as u16;
        for message in uidata.toasts.iter() {
            let width = ((message.chars().count() + 4) as u16)
                .min(TOAST_MAX_WIDTH)
                .min(area.width);
            if y + 3 > area.height {
                break;
            }
            let rect = Rect::new(area.width - width, y, width, 3);
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(message.as_str()).block(Block::bordered()),
                rect,
            );
            y += 3;
        }
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let lines: Vec<&str> = uidata.popup_message.lines().collect();
        let height = ((lines.len() + 2) as u16).min(area.height);
        let width = (lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as u16
            + 4)
        .min(area.width);
        let rect = Rect::new(
            (area.width - width) / 2,
            (area.height - height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(uidata.popup_message.as_str()).block(Block::bordered()),
            rect,
        );
    }
}
