//! Page-level context printed above the table: quarter and protection category.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::{cleanup_dashes, compact_key};

static QUARTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"квартал(\d{1,3})").expect("hardcoded quarter regex is valid"));
static CATEGORY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Категория\s+защитности\s*:?\s*").expect("hardcoded category regex is valid")
});
static QUARTER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)кв\s*а?\s*р?\s*т?\s*а?\s*л").expect("hardcoded quarter label regex is valid")
});
static SHORT_QUARTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)кв").expect("hardcoded quarter label regex is valid"));

/// Quarter number from windows of one, two and three consecutive lines, so
/// that `Квартал` and its number may sit on separate lines.
pub(crate) fn extract_quarter(lines: &[String]) -> Option<u32> {
    for start in 0..lines.len() {
        let mut window = String::new();
        for line in lines.iter().skip(start).take(3) {
            window.push_str(line);
            window.push(' ');
            if let Some(found) = QUARTER.captures(&compact_key(&window))
                && let Ok(quarter) = found[1].parse()
            {
                return Some(quarter);
            }
        }
    }
    None
}

/// Protection category text between its label and the quarter label.
pub(crate) fn extract_category(lines: &[String]) -> Option<String> {
    for (index, line) in lines.iter().enumerate() {
        let next = lines.get(index + 1).map_or("", String::as_str);
        let combined =
            cleanup_dashes(&format!("{} {}", cleanup_dashes(line), cleanup_dashes(next)));

        let Some(label) = CATEGORY_LABEL.find(&combined) else {
            continue;
        };
        let after = &combined[label.end()..];
        let before_quarter = match SHORT_QUARTER_LABEL.find(after) {
            Some(found) => &after[..found.start()],
            None => after,
        };
        let category = cleanup_dashes(before_quarter);
        if category.chars().count() < 3 || QUARTER_LABEL.is_match(&category) {
            continue;
        }
        return Some(category);
    }
    None
}
