use arboard::Clipboard;
use polars::prelude::*;
use ratatui::crossterm::event::KeyEvent;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::{HELP_TEXT, Message, ShopConfig, ShopError};
use crate::filter;
use crate::inputter::{FilterEdit, FilterLine};
use crate::sorter::{ColumnSort, SortAction, compare_cells};
use crate::toast::ToastRack;
use crate::ui::{COLUMN_SPACER, COLUMN_WIDTH_MARGIN, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    FILTER,
    POPUP,
}

/// One table column; cells are kept as the display text shown on screen.
pub struct Column {
    name: String,
    max_width: usize,
    render_width: usize,
    data: Vec<String>,
}

impl Column {
    fn new(name: String, data: Vec<String>) -> Self {
        let max_width = data.iter().map(|s| s.len()).max().unwrap_or(0);
        Column {
            name,
            max_width,
            render_width: 0,
            data,
        }
    }
}

/// Viewport slice of one column, ready for rendering.
#[derive(Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
    /// Terminal row of the header line.
    pub header_row: u16,
    /// Horizontal (start, width) span of each rendered column, for
    /// hit-testing header clicks.
    pub column_spans: Vec<(u16, u16)>,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        UILayout {
            width: ui_width,
            height: ui_height,
            table_height: ui_height.saturating_sub(TABLE_HEADER_HEIGHT + STATUSLINE_HEIGHT),
            header_row: 0,
            column_spans: Vec::new(),
        }
    }

    /// Column index under terminal column `x`, if any.
    pub fn column_at(&self, x: u16) -> Option<usize> {
        self.column_spans
            .iter()
            .position(|&(start, width)| x >= start && x < start + width)
    }
}

/// Snapshot handed to the UI for drawing. Rebuilt by the model after every
/// mutation, never read back.
pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub nrows: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub filter: FilterEdit,
    pub filter_active: bool,
    pub toasts: Vec<String>,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            table: Vec::new(),
            nrows: 0,
            selected_row: 0,
            selected_column: 0,
            show_popup: false,
            popup_message: String::new(),
            layout: UILayout::default(),
            filter: FilterEdit::default(),
            filter_active: false,
            toasts: Vec::new(),
            status_message: String::new(),
        }
    }
}

pub struct Model {
    config: ShopConfig,
    pub status: Status,
    name: String,
    columns: Vec<Column>,
    /// Display order as a sequence of row ids. There is exactly one order;
    /// sorting rewrites this sequence in place.
    order: Vec<usize>,
    /// Visibility per row id. Hidden rows keep their place in `order`.
    visible: Vec<bool>,
    /// Sort state per column index. Columns not yet clicked carry no entry
    /// and are treated as `Fresh`.
    sort_states: HashMap<usize, ColumnSort>,
    curser_row: usize,
    curser_column: usize,
    offset_row: usize,
    modus: Modus,
    previous_modus: Modus,
    filter_line: FilterLine,
    last_filter: FilterEdit,
    toasts: ToastRack,
    clipboard: Option<Clipboard>,
    uilayout: UILayout,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn init(config: &ShopConfig, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            name: String::new(),
            columns: Vec::new(),
            order: Vec::new(),
            visible: Vec::new(),
            sort_states: HashMap::new(),
            curser_row: 0,
            curser_column: 0,
            offset_row: 0,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            filter_line: FilterLine::default(),
            last_filter: FilterEdit::default(),
            toasts: ToastRack::new(config.toast_ttl_ms),
            clipboard: None,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            status_message: "Started shoptable!".to_string(),
        };
        model.update_table_data();
        model
    }

    /// Install already-loaded columns. The loader and the tests go through
    /// this; row ids are assigned in load order and never change.
    pub fn set_columns(&mut self, name: String, columns: Vec<(String, Vec<String>)>) {
        let nrows = columns.first().map(|(_, d)| d.len()).unwrap_or(0);
        self.name = name;
        self.columns = columns
            .into_iter()
            .map(|(name, data)| Column::new(name, data))
            .collect();
        self.order = (0..nrows).collect();
        self.visible = vec![true; nrows];
        self.sort_states.clear();
        self.curser_row = 0;
        self.curser_column = 0;
        self.offset_row = 0;
        self.update_table_data();
    }

    pub fn load_file(&mut self, path: PathBuf) -> Result<(), ShopError> {
        let path = Self::check_file(path)?;
        let start_time = Instant::now();
        let frame = LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()?;
        let df = frame.collect()?;

        let columns: Result<Vec<(String, Vec<String>)>, PolarsError> = df
            .get_column_names()
            .iter()
            .map(|name| Ok((name.to_string(), Self::load_column(&df, name)?)))
            .collect();
        let columns = columns?;

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        let nrows = columns.first().map(|(_, d)| d.len()).unwrap_or(0);
        info!(
            "Loaded {} in {}ms ...",
            name,
            start_time.elapsed().as_millis()
        );
        self.set_columns(name, columns);
        self.toasts.show(format!("Loaded {} products", nrows));
        self.update_table_data();
        Ok(())
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let data = series
            .into_iter()
            .map(|value| match value {
                Some(s) => s.to_string().replace("\r\n", " ").replace("\n", " "),
                None => String::new(),
            })
            .collect();
        Ok(data)
    }

    fn check_file(path: PathBuf) -> Result<PathBuf, ShopError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ShopError::FileNotFound,
            ErrorKind::PermissionDenied => ShopError::PermissionDenied,
            _ => ShopError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(ShopError::LoadingFailed("Not a file!".into()));
        }
        match Self::extension(&path).as_deref() {
            Some("CSV") => Ok(path),
            _ => Err(ShopError::UnknownFileType),
        }
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
    }

    /// Queue a startup notice; shown as a toast on launch.
    pub fn add_notice(&mut self, message: impl Into<String>) {
        self.toasts.show(message);
        self.update_uidata();
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::FILTER)
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Periodic housekeeping between events: expire toasts.
    pub fn tick(&mut self) {
        if !self.toasts.is_empty() {
            self.toasts.sweep();
            self.update_uidata();
        }
    }

    pub fn update(&mut self, message: Message) -> Result<(), ShopError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_selection_down(1),
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveLeft => self.move_selection_left(),
                Message::MoveRight => self.move_selection_right(),
                Message::MovePageUp => self.move_selection_up(self.uilayout.table_height.max(1)),
                Message::MovePageDown => {
                    self.move_selection_down(self.uilayout.table_height.max(1))
                }
                Message::MoveBeginning => self.move_selection_beginning(),
                Message::MoveEnd => self.move_selection_end(),
                Message::HeaderClick(column) => self.header_click(column),
                Message::SortCursorColumn => self.header_click(self.curser_column),
                Message::EnterFilter => self.enter_filter_mode(),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::RawKey(_) => (),
            },
            Modus::FILTER => match message {
                Message::RawKey(key) => self.filter_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    // ----------------------- Sorting ----------------------- //

    /// A click on a column's header cell. Each column runs its own
    /// Fresh/Toggling machine; the first click reverses the current order,
    /// every later click toggles the direction and sorts.
    fn header_click(&mut self, column: usize) {
        if column >= self.columns.len() {
            return;
        }
        let state = self.sort_states.entry(column).or_insert(ColumnSort::Fresh);
        let action = state.click();
        trace!("Header click on column {column}: {action:?}");
        match action {
            SortAction::Reverse => self.order.reverse(),
            SortAction::Sort { ascending } => {
                // Stable sort over all rows, hidden ones included. Row
                // visibility is keyed by row id and unaffected by the move.
                let data = &self.columns[column].data;
                self.order
                    .sort_by(|&a, &b| compare_cells(&data[a], &data[b], ascending));
            }
        }
        self.set_status_message(match action {
            SortAction::Reverse => format!("Reversed rows ({})", self.columns[column].name),
            SortAction::Sort { ascending: true } => {
                format!("Sorted by {} (ascending)", self.columns[column].name)
            }
            SortAction::Sort { ascending: false } => {
                format!("Sorted by {} (descending)", self.columns[column].name)
            }
        });
        self.update_table_data();
    }

    // ----------------------- Filtering ----------------------- //

    fn enter_filter_mode(&mut self) {
        trace!("Entering filter mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::FILTER;
        self.last_filter = self.filter_line.current();
        self.update_uidata();
    }

    fn filter_input(&mut self, key: KeyEvent) {
        let edit = self.filter_line.read(key);
        // Applied on every keystroke, recomputed over all rows.
        self.apply_filter(&edit.value);
        if edit.done {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::FILTER;
        }
        self.last_filter = edit;
        self.update_table_data();
    }

    /// Recompute every row's visibility from the current filter text.
    /// Sort state and row order are not consulted and not changed.
    fn apply_filter(&mut self, raw: &str) {
        let needle = filter::needle(raw);
        let columns = &self.columns;
        let nrows = self.nrows();
        self.visible = (0..nrows)
            .into_par_iter()
            .map(|rid| filter::row_matches(&needle, columns.iter().map(|c| c.data[rid].as_str())))
            .collect();
        let shown = self.visible.iter().filter(|&&v| v).count();
        debug!("Filter \"{needle}\" shows {shown}/{nrows} rows");
        self.curser_row = 0;
        self.offset_row = 0;
    }

    fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// Row ids in display order, hidden rows skipped.
    fn visible_order(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&rid| self.visible[rid])
            .collect()
    }

    // ----------------------- Clipboard ----------------------- //

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn copy_row(&mut self) {
        let shown = self.visible_order();
        let Some(&rid) = shown.get(self.offset_row + self.curser_row) else {
            return;
        };
        let content = self
            .columns
            .iter()
            .map(|c| Self::wrap_cell_content(&c.data[rid]))
            .collect::<Vec<String>>()
            .join(",");

        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new()
                .map_err(|e| trace!("No clipboard available: {e:?}"))
                .ok();
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => self.set_status_message("Copied row to clipboard"),
                Err(e) => trace!("Error copying to clipboard: {e:?}"),
            }
            self.update_uidata();
        }
    }

    // ----------------------- Popup / help ----------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn close_popup(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.uidata.show_popup = false;
    }

    // ----------------------- Selection movement ----------------------- //

    fn move_selection_up(&mut self, size: usize) {
        if self.curser_row > 0 {
            self.curser_row = self.curser_row.saturating_sub(size);
        } else {
            self.offset_row = self.offset_row.saturating_sub(size);
        }
        self.update_table_data();
    }

    fn move_selection_down(&mut self, size: usize) {
        let nvisible = self.visible_order().len();
        if nvisible == 0 {
            return;
        }
        if self.curser_row + self.offset_row < nvisible - 1 {
            if self.curser_row + size < self.uilayout.table_height {
                self.curser_row = std::cmp::min(self.curser_row + size, nvisible - 1);
            } else {
                self.offset_row = std::cmp::min(self.offset_row + size, nvisible - 1);
                self.curser_row = std::cmp::min(
                    self.uilayout.table_height.saturating_sub(1),
                    nvisible - self.offset_row - 1,
                );
            }
            self.update_table_data();
        }
    }

    fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
        self.update_table_data();
    }

    fn move_selection_right(&mut self) {
        if self.curser_column + 1 < self.columns.len() {
            self.curser_column += 1;
        }
        self.update_table_data();
    }

    fn move_selection_beginning(&mut self) {
        self.curser_row = 0;
        self.offset_row = 0;
        self.update_table_data();
    }

    fn move_selection_end(&mut self) {
        let nvisible = self.visible_order().len();
        if nvisible <= self.uilayout.table_height {
            self.offset_row = 0;
            self.curser_row = nvisible.saturating_sub(1);
        } else {
            self.offset_row = nvisible - self.uilayout.table_height;
            self.curser_row = self.uilayout.table_height - 1;
        }
        self.update_table_data();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.update_table_data();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // ----------------------- UI snapshot ----------------------- //

    fn update_table_data(&mut self) {
        let shown = self.visible_order();

        // Clamp the viewport against the current number of visible rows.
        if !shown.is_empty() {
            if self.offset_row >= shown.len() {
                self.offset_row = shown.len() - 1;
            }
            let max_curser = std::cmp::min(
                self.uilayout.table_height.saturating_sub(1),
                shown.len() - self.offset_row - 1,
            );
            self.curser_row = std::cmp::min(self.curser_row, max_curser);
        } else {
            self.offset_row = 0;
            self.curser_row = 0;
        }
        if !self.columns.is_empty() {
            self.curser_column = std::cmp::min(self.curser_column, self.columns.len() - 1);
        }

        let rbegin = self.offset_row;
        let rend = std::cmp::min(rbegin + self.uilayout.table_height, shown.len());

        // Fit columns left to right until the width is used up, and record
        // each rendered column's span for header hit-testing.
        let max_column_width = self.config.max_column_width;
        for column in self.columns.iter_mut() {
            column.render_width = std::cmp::min(
                std::cmp::max(column.name.len(), column.max_width) + COLUMN_WIDTH_MARGIN,
                max_column_width,
            );
        }

        let mut spans = Vec::new();
        let mut views = Vec::new();
        let mut x = 0usize;
        for column in self.columns.iter() {
            if x + column.render_width > self.uilayout.width {
                break;
            }
            spans.push((x as u16, column.render_width as u16));
            views.push(ColumnView {
                name: column.name.clone(),
                width: column.render_width,
                data: shown[rbegin..rend]
                    .iter()
                    .map(|&rid| column.data[rid].clone())
                    .collect(),
            });
            x += column.render_width + COLUMN_SPACER;
        }
        self.uilayout.column_spans = spans;

        self.uidata = UIData {
            name: self.name.clone(),
            table: views,
            nrows: shown.len(),
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            show_popup: self.uidata.show_popup,
            popup_message: self.uidata.popup_message.clone(),
            layout: self.uilayout.clone(),
            filter: self.last_filter.clone(),
            filter_active: matches!(self.modus, Modus::FILTER),
            toasts: self.toasts.messages(),
            status_message: self.status_message.clone(),
        };
    }

    fn update_uidata(&mut self) {
        self.uidata.filter = self.last_filter.clone();
        self.uidata.filter_active = matches!(self.modus, Modus::FILTER);
        self.uidata.toasts = self.toasts.messages();
        self.uidata.status_message = self.status_message.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn products() -> Model {
        let mut model = Model::init(&ShopConfig::default(), 120, 30);
        model.set_columns(
            "products.csv".to_string(),
            vec![
                (
                    "title".to_string(),
                    vec!["Mug".to_string(), "Teapot".to_string(), "Spoon".to_string()],
                ),
                (
                    "price".to_string(),
                    vec!["€10".to_string(), "€2".to_string(), "€100".to_string()],
                ),
            ],
        );
        model
    }

    fn click(model: &mut Model, column: usize) {
        model.update(Message::HeaderClick(column)).unwrap();
    }

    fn type_filter(model: &mut Model, text: &str) {
        model.update(Message::EnterFilter).unwrap();
        for c in text.chars() {
            model
                .update(Message::RawKey(KeyEvent::new(
                    KeyCode::Char(c),
                    KeyModifiers::NONE,
                )))
                .unwrap();
        }
        model
            .update(Message::RawKey(KeyEvent::new(
                KeyCode::Enter,
                KeyModifiers::NONE,
            )))
            .unwrap();
    }

    #[test]
    fn filter_shows_matching_rows_only() {
        let mut model = products();
        type_filter(&mut model, "  TEA ");
        assert_eq!(model.visible, vec![false, true, false]);
        assert_eq!(model.visible_order(), vec![1]);
    }

    #[test]
    fn empty_filter_shows_all_rows() {
        let mut model = products();
        type_filter(&mut model, "tea");
        // Esc clears the filter line, which matches every row again.
        model.update(Message::EnterFilter).unwrap();
        model
            .update(Message::RawKey(KeyEvent::new(
                KeyCode::Esc,
                KeyModifiers::NONE,
            )))
            .unwrap();
        assert_eq!(model.visible, vec![true, true, true]);
        assert_eq!(model.visible_order(), vec![0, 1, 2]);
    }

    #[test]
    fn first_click_reverses_row_order() {
        let mut model = products();
        click(&mut model, 0);
        assert_eq!(model.order, vec![2, 1, 0]);
    }

    #[test]
    fn second_click_sorts_ascending_numerically() {
        let mut model = products();
        click(&mut model, 1); // reversal
        click(&mut model, 1); // ascending numeric
        // €2 < €10 < €100, by value rather than by text.
        assert_eq!(model.order, vec![1, 0, 2]);
    }

    #[test]
    fn third_click_sorts_descending() {
        let mut model = products();
        click(&mut model, 1);
        click(&mut model, 1);
        click(&mut model, 1);
        assert_eq!(model.order, vec![2, 0, 1]);
    }

    #[test]
    fn mixed_column_falls_back_to_string_comparison() {
        let mut model = Model::init(&ShopConfig::default(), 120, 30);
        model.set_columns(
            "mixed.csv".to_string(),
            vec![(
                "note".to_string(),
                vec!["abc".to_string(), "€5".to_string(), "xyz".to_string()],
            )],
        );
        click(&mut model, 0);
        click(&mut model, 0);
        // "€5" pairs with non-numeric cells, so every comparison takes the
        // string branch: "abc" < "xyz" < "€5".
        assert_eq!(model.order, vec![0, 2, 1]);
    }

    #[test]
    fn columns_keep_independent_sort_states() {
        let mut model = products();
        click(&mut model, 1);
        click(&mut model, 1);
        // Column 0 was never clicked, so its first click still reverses the
        // current order instead of sorting.
        let before = model.order.clone();
        click(&mut model, 0);
        let reversed: Vec<usize> = before.into_iter().rev().collect();
        assert_eq!(model.order, reversed);
    }

    #[test]
    fn sorting_moves_hidden_rows_and_keeps_them_hidden() {
        let mut model = products();
        type_filter(&mut model, "mug");
        assert_eq!(model.visible, vec![true, false, false]);

        click(&mut model, 1);
        click(&mut model, 1);
        // All three rows were reordered, the two filtered-out rows stayed
        // hidden, and the filter was not re-applied.
        assert_eq!(model.order, vec![1, 0, 2]);
        assert_eq!(model.visible, vec![true, false, false]);
        assert_eq!(model.visible_order(), vec![0]);
    }

    #[test]
    fn filtering_does_not_touch_sort_state() {
        let mut model = products();
        click(&mut model, 1);
        type_filter(&mut model, "tea");
        // The next click continues the toggle cycle instead of reversing.
        click(&mut model, 1);
        assert_eq!(model.order, vec![1, 0, 2]);
    }

    #[test]
    fn header_click_beyond_last_column_is_ignored() {
        let mut model = products();
        click(&mut model, 7);
        assert_eq!(model.order, vec![0, 1, 2]);
    }

    #[test]
    fn uidata_skips_hidden_rows() {
        let mut model = products();
        type_filter(&mut model, "o");
        // "Teapot" and "Spoon" match via the title, "Mug" does not ("€10"
        // contains no "o" either).
        let uidata = model.get_uidata();
        assert_eq!(uidata.nrows, 2);
        assert_eq!(uidata.table[0].data, vec!["Teapot", "Spoon"]);
    }

    #[test]
    fn column_spans_map_back_to_columns() {
        let model = products();
        let layout = &model.get_uidata().layout;
        assert_eq!(layout.column_spans.len(), 2);
        let (start, _) = layout.column_spans[1];
        assert_eq!(layout.column_at(0), Some(0));
        assert_eq!(layout.column_at(start), Some(1));
        assert_eq!(layout.column_at(119), None);
    }
}
