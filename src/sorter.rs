use std::cmp::Ordering;

/// Per-column sort state machine.
///
/// Every column starts out `Fresh`. The first click on its header reverses
/// the current row order without looking at any cell value and moves the
/// column to `Toggling`; every later click first flips `ascending` and then
/// sorts with the new flag. Columns never consult each other's state.
///
/// The first-click reversal reproduces the page this viewer replaces. It
/// reads like a bug (one would expect an ascending sort) but is kept as
/// observed behavior; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSort {
    Fresh,
    Toggling { ascending: bool },
}

/// What a header click asks the owner of the row order to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAction {
    Reverse,
    Sort { ascending: bool },
}

impl ColumnSort {
    pub fn click(&mut self) -> SortAction {
        match *self {
            ColumnSort::Fresh => {
                *self = ColumnSort::Toggling { ascending: false };
                SortAction::Reverse
            }
            ColumnSort::Toggling { ascending } => {
                let ascending = !ascending;
                *self = ColumnSort::Toggling { ascending };
                SortAction::Sort { ascending }
            }
        }
    }
}

/// Compare two cell texts of the clicked column.
///
/// Both sides are trimmed. If both carry a numeric value after stripping
/// currency formatting, they compare numerically; otherwise both fall back
/// to a string comparison of the trimmed, unstripped text.
pub fn compare_cells(a: &str, b: &str, ascending: bool) -> Ordering {
    let a = a.trim();
    let b = b.trim();

    match (numeric_value(a), numeric_value(b)) {
        (Some(na), Some(nb)) => {
            let ord = na.partial_cmp(&nb).unwrap_or(Ordering::Equal);
            if ascending { ord } else { ord.reverse() }
        }
        _ => {
            if ascending {
                collate(a, b)
            } else {
                collate(b, a)
            }
        }
    }
}

/// Numeric value of a cell as listed on the page: "€1,299.00" is 1299.0.
/// Strips the euro sign, whitespace and thousands-separator commas, then
/// takes the longest leading prefix that parses as a float, so "10kg" is 10
/// and "abc" is none.
pub fn numeric_value(cell: &str) -> Option<f64> {
    let stripped: String = cell
        .chars()
        .filter(|c| *c != '€' && *c != ',' && !c.is_whitespace())
        .collect();
    leading_float(&stripped)
}

fn leading_float(s: &str) -> Option<f64> {
    let mut value = None;
    for (idx, c) in s.char_indices() {
        if let Ok(v) = s[..idx + c.len_utf8()].parse::<f64>()
            && !v.is_nan()
        {
            value = Some(v);
        }
    }
    value
}

// Case-folded stand-in for locale collation: groups "apple" with "Apple"
// before "banana" instead of ordering all uppercase first.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_click_reverses_then_toggles() {
        let mut state = ColumnSort::Fresh;
        assert_eq!(state.click(), SortAction::Reverse);
        assert_eq!(state.click(), SortAction::Sort { ascending: true });
        assert_eq!(state.click(), SortAction::Sort { ascending: false });
        assert_eq!(state.click(), SortAction::Sort { ascending: true });
    }

    #[test]
    fn numeric_value_strips_currency_formatting() {
        assert_eq!(numeric_value("€10"), Some(10.0));
        assert_eq!(numeric_value(" € 1,299.50 "), Some(1299.5));
        assert_eq!(numeric_value("1 234,5"), Some(12345.0));
    }

    #[test]
    fn numeric_value_takes_leading_prefix() {
        assert_eq!(numeric_value("10kg"), Some(10.0));
        assert_eq!(numeric_value("-3.5x"), Some(-3.5));
        assert_eq!(numeric_value("abc"), None);
        assert_eq!(numeric_value(""), None);
        assert_eq!(numeric_value("x10"), None);
    }

    #[test]
    fn numeric_cells_compare_numerically() {
        assert_eq!(compare_cells("€2", "€10", true), Ordering::Less);
        assert_eq!(compare_cells("€2", "€10", false), Ordering::Greater);
        assert_eq!(compare_cells(" €100 ", "€100", true), Ordering::Equal);
    }

    #[test]
    fn mixed_cells_fall_back_to_strings() {
        // "5" parses but "abc" does not, so both compare as text.
        assert_eq!(compare_cells("abc", "5", true), Ordering::Greater);
        assert_eq!(compare_cells("abc", "xyz", true), Ordering::Less);
        assert_eq!(compare_cells("abc", "xyz", false), Ordering::Greater);
    }

    #[test]
    fn string_fallback_groups_by_case_fold() {
        assert_eq!(compare_cells("apple", "Banana", true), Ordering::Less);
        assert_eq!(compare_cells("Apple", "apple", true), Ordering::Less);
    }
}
