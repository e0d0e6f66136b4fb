use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use std::io::Error;

#[derive(Debug)]
pub enum ShopError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for ShopError {
    fn from(err: Error) -> Self {
        ShopError::IoError(err)
    }
}

impl From<PolarsError> for ShopError {
    fn from(err: PolarsError) -> Self {
        ShopError::PolarsError(err)
    }
}

/// One message per handled terminal event. The controller produces these,
/// the model consumes them.
#[derive(Debug)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    /// Click on the header cell of the given column index.
    HeaderClick(usize),
    /// Keyboard alias for clicking the header of the column under the cursor.
    SortCursorColumn,
    /// Enter filter mode; subsequent keys go to the filter line.
    EnterFilter,
    /// Raw key forwarded to the filter line while filter mode is active.
    RawKey(KeyEvent),
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
}

#[derive(Debug, Clone)]
pub struct ShopConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub toast_ttl_ms: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            event_poll_time: 100,
            max_column_width: 40,
            toast_ttl_ms: 5000,
        }
    }
}

pub const HELP_TEXT: &str = "shoptable - product listing viewer

Filter
  /          edit the filter line (applied on every keystroke)
  Enter      keep the filter and leave the filter line
  Esc        clear the filter and leave the filter line

Sorting
  Click a column header to sort by that column.
  The first click reverses the row order; every further click
  toggles between ascending and descending.
  s          same as clicking the header of the current column

Moving
  Up/Down, PgUp/PgDn, Home/End; Left/Right select a column

Other
  y          copy the selected row to the clipboard
  h          this help (Esc to close)
  q          quit
";
