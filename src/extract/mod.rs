//! Field identification
//!
//! Classifies the text cells of a grid into person names, dates and times
//! using a handful of compiled patterns. Every list keeps the first
//! occurrence of each value in row-major scan order and stops at
//! [`MAX_MATCHES`] entries.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Grid;

/// Upper bound on every identified list.
pub const MAX_MATCHES: usize = 10;

/// A single capitalised word, e.g. "Maria".
static NAME_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("Invalid regex pattern"));

/// `dd/mm/yy(yy)` style or ISO-like `yyyy-mm-dd`, either separator.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{1,2}[/\-][0-9]{1,2}[/\-][0-9]{2,4}|[0-9]{4}[/\-][0-9]{1,2}[/\-][0-9]{1,2}")
        .expect("Invalid regex pattern")
});

/// `h:mm`, `hh:mm:ss`, with an optional AM/PM suffix.
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?(?:\s*[AP]M)?")
        .expect("Invalid regex pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub names: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
}

/// Run all three classifiers over the grid.
pub fn extract_fields(data: &Grid) -> ExtractedFields {
    ExtractedFields {
        names: identify_names(data),
        dates: identify_dates(data),
        times: identify_times(data),
    }
}

/// Cells made of two or three capitalised words.
pub fn identify_names(data: &Grid) -> Vec<String> {
    collect_unique(data, is_name)
}

pub fn identify_dates(data: &Grid) -> Vec<String> {
    collect_unique(data, |text| DATE_PATTERN.is_match(text))
}

pub fn identify_times(data: &Grid) -> Vec<String> {
    collect_unique(data, |text| TIME_PATTERN.is_match(text))
}

pub fn is_name(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    (2..=3).contains(&words.len()) && words.iter().all(|word| NAME_WORD.is_match(word))
}

fn collect_unique<F>(data: &Grid, matches: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for text in data.iter().flatten().filter_map(|cell| cell.as_text()) {
        if !matches(text) {
            continue;
        }
        let value = text.trim();
        if seen.insert(value.to_string()) {
            found.push(value.to_string());
            if found.len() == MAX_MATCHES {
                break;
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|s| Cell::text(*s)).collect())
            .collect()
    }

    #[test]
    fn test_identify_names() {
        let data = grid(&[
            &["Name", "Joined"],
            &["Maria Lopez", "2023-01-05"],
            &["  Juan Carlos Perez ", "05/01/2023"],
            &["ana lopez", "Ana"],
            &["John Ronald Reuel Tolkien", "McDonald Smith"],
        ]);

        assert_eq!(
            identify_names(&data),
            vec!["Maria Lopez".to_string(), "Juan Carlos Perez".to_string()]
        );
    }

    #[test]
    fn test_identify_dates_keeps_whole_trimmed_cell() {
        let data = grid(&[
            &["Created 2024/3/7 by admin", "12-31-99"],
            &["1/2/3", " 2024-03-07 "],
        ]);

        assert_eq!(
            identify_dates(&data),
            vec![
                "Created 2024/3/7 by admin".to_string(),
                "12-31-99".to_string(),
                "2024-03-07".to_string(),
            ]
        );
    }

    #[test]
    fn test_identify_times() {
        let data = grid(&[&["9:30", "09:30:15", "7:05 pm", "930", "noon"]]);
        assert_eq!(
            identify_times(&data),
            vec!["9:30".to_string(), "09:30:15".to_string(), "7:05 pm".to_string()]
        );
    }

    #[test]
    fn test_only_text_cells_are_considered() {
        let data: Grid = vec![vec![Cell::Number(45000.0), Cell::Bool(true), Cell::Empty]];
        assert_eq!(extract_fields(&data), ExtractedFields::default());
    }

    #[test]
    fn test_deduplicates_and_caps_at_ten() {
        let mut rows: Grid = Vec::new();
        for i in 0..25 {
            let time = format!("{}:00", i % 15);
            rows.push(vec![Cell::text(time.clone()), Cell::text(time)]);
        }

        let times = identify_times(&rows);
        assert_eq!(times.len(), MAX_MATCHES);
        assert_eq!(times[0], "0:00");
        assert_eq!(times[9], "9:00");

        let unique: HashSet<_> = times.iter().collect();
        assert_eq!(unique.len(), times.len());
    }

    #[test]
    fn test_scan_order_is_row_major() {
        let data = grid(&[&["Bob Stone", "Amy Wong"], &["Carl Dean"]]);
        assert_eq!(
            identify_names(&data),
            vec!["Bob Stone".to_string(), "Amy Wong".to_string(), "Carl Dean".to_string()]
        );
    }

    #[test]
    fn test_every_result_matches_its_pattern() {
        let data = grid(&[
            &["Lucia Diaz", "3/4/2021", "10:15 AM", "plain"],
            &["x 2020-1-1 y", "at 23:59", "Pedro"],
        ]);
        let fields = extract_fields(&data);
        assert!(fields.names.iter().all(|n| is_name(n)));
        assert!(fields.dates.iter().all(|d| DATE_PATTERN.is_match(d)));
        assert!(fields.times.iter().all(|t| TIME_PATTERN.is_match(t)));
    }
}
