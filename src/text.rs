//! String helpers shared by the line, cell and record stages.

use std::sync::LazyLock;

use regex::Regex;

/// Longest text stored in a single output cell.
pub(crate) const MAX_CELL_TEXT: usize = 32_000;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded whitespace regex is valid"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}]{3,}")
        .expect("hardcoded dash regex is valid")
});
static BAR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|_]{3,}").expect("hardcoded bar regex is valid"));
static BROKEN_WORDS: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (
            Regex::new(r"(?i)итог\s+о").expect("hardcoded broken-word regex is valid"),
            "Итого",
        ),
        (
            Regex::new(r"(?i)кварт\s+алу").expect("hardcoded broken-word regex is valid"),
            "кварталу",
        ),
        (
            Regex::new(r"(?i)составляющим\s+пород\s+ам")
                .expect("hardcoded broken-word regex is valid"),
            "составляющим породам",
        ),
    ]
});
static LOOSE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("hardcoded number regex is valid"));
static STOCKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0\.\d|1\.0|1)$").expect("hardcoded stocking regex is valid"));

/// Composition formula such as `7Б1ОС2Е+ОЛС,Е` with optional spaces between parts.
pub(crate) const COMPOSITION_PATTERN: &str = r"\d{1,2}\s*[А-ЯЁA-Z]{1,6}(?:\s*\d{1,2}\s*[А-ЯЁA-Z]{1,6})*(?:\s*\+\s*[А-ЯЁA-Z]{1,6}(?:\s*,\s*[А-ЯЁA-Z]{1,6})*)*";

static COMPOSITION_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(COMPOSITION_PATTERN).expect("hardcoded composition regex is valid")
});
static COMPOSITION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{COMPOSITION_PATTERN}\b"))
        .expect("hardcoded composition regex is valid")
});
static SHORT_COMPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}[А-ЯЁA-Z]{1,3}(?:\s*\d{1,2}[А-ЯЁA-Z]{1,3})*(?:\s*\+\s*[А-ЯЁA-Z]{1,3})*")
        .expect("hardcoded short composition regex is valid")
});
static NOTE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)подрост|подлесок|болот|дорог|земли|линейного протяжения|просек|реки|ручь|км|тыс\.?\s*шт/га")
        .expect("hardcoded note-word regex is valid")
});
static SPECIES_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[А-ЯЁA-Z]{1,6}$").expect("hardcoded species regex is valid")
});

pub(crate) fn normalize_spaces(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Removes ruler artifacts (runs of dashes, bars or underscores).
pub(crate) fn cleanup_dashes(text: &str) -> String {
    let text = DASH_RUN.replace_all(text, " ");
    let text = BAR_RUN.replace_all(&text, " ");
    normalize_spaces(&text)
}

pub(crate) fn normalize_broken_words(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in BROKEN_WORDS.iter() {
        if pattern.is_match(&out) {
            out = pattern.replace_all(&out, *replacement).into_owned();
        }
    }
    out
}

/// Lowercase, `ё` folded to `е`, only letters and digits kept.
pub(crate) fn compact_key(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == 'ё' { 'е' } else { ch })
        .filter(|ch| ch.is_alphanumeric())
        .collect()
}

pub(crate) fn remove_whitespace(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Parses the whole cell as a number, accepting a decimal comma.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim().replacen(',', ".", 1);
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a cell made of ASCII digits only.
pub(crate) fn parse_int(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub(crate) fn int_in(text: &str, min: u32, max: u32) -> Option<u32> {
    parse_int(text).filter(|value| (min..=max).contains(value))
}

/// First number found anywhere in the text.
pub(crate) fn first_number(text: &str) -> Option<f64> {
    let text = text.replace(',', ".");
    LOOSE_NUMBER
        .find(&text)
        .and_then(|found| found.as_str().parse().ok())
}

/// Every number in the text, in order. A trailing dot (`1041.`) is ignored.
pub(crate) fn numbers_in(text: &str) -> Vec<f64> {
    let text = text.replace(',', ".");
    LOOSE_NUMBER
        .find_iter(&text)
        .filter_map(|found| found.as_str().parse().ok())
        .collect()
}

/// Number tokens as they appear in the text, comma decimals rewritten.
pub(crate) fn number_tokens(text: &str) -> Vec<String> {
    let text = text.replace(',', ".");
    LOOSE_NUMBER
        .find_iter(&text)
        .map(|found| found.as_str().to_string())
        .collect()
}

pub(crate) fn is_stocking(text: &str) -> bool {
    let text = text.trim();
    STOCKING.is_match(text) && parse_number(text).is_some_and(|value| value > 0.0 && value <= 1.0)
}

/// Site class is `1`..`5` or the special `5А`.
pub(crate) fn normalize_site_class(text: &str) -> Option<String> {
    let text = text.trim();
    match text {
        "1" | "2" | "3" | "4" | "5" => Some(text.to_string()),
        "5а" | "5А" | "5a" | "5A" => Some("5А".to_string()),
        _ => None,
    }
}

pub(crate) fn is_merch_class(text: &str) -> bool {
    int_in(text, 1, 4).is_some()
}

pub(crate) fn is_species_code(text: &str) -> bool {
    SPECIES_CODE.is_match(text.trim())
}

/// Formats a number the way it is written back into a cell: integers
/// without a fractional part.
pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

/// First composition formula found anywhere in the text, spaces removed.
pub(crate) fn composition_anywhere(text: &str) -> Option<String> {
    let upper = normalize_broken_words(text).to_uppercase();
    COMPOSITION_ANYWHERE
        .find(&upper)
        .map(|found| remove_whitespace(found.as_str()))
}

/// First word-bounded composition formula in the text, spaces removed.
pub(crate) fn composition_token(text: &str) -> Option<String> {
    let upper = normalize_spaces(text).to_uppercase();
    COMPOSITION_WORD
        .find(&upper)
        .map(|found| remove_whitespace(found.as_str()))
}

/// Returns the compacted formula when the line holds nothing but a composition.
pub(crate) fn pure_composition(text: &str) -> Option<String> {
    let upper = normalize_spaces(text).to_uppercase();
    let found = COMPOSITION_WORD.find(&upper)?;
    let mut rest = String::with_capacity(upper.len());
    rest.push_str(&upper[..found.start()]);
    rest.push(' ');
    rest.push_str(&upper[found.end()..]);
    let rest = rest.replace(['.', ',', ';', ':', '(', ')'], " ");
    if normalize_spaces(&rest).is_empty() {
        Some(remove_whitespace(found.as_str()))
    } else {
        None
    }
}

/// Short composition at the start of an overflow fragment, e.g. `2Е 1Б+ОС`.
pub(crate) fn starts_with_short_composition(text: &str) -> bool {
    SHORT_COMPOSITION.is_match(&text.trim().to_uppercase())
}

/// Vocabulary typical of annotation lines rather than stand data.
pub(crate) fn looks_like_note_text(text: &str) -> bool {
    NOTE_WORDS.is_match(text)
}

pub(crate) fn clamp_text(text: &str) -> String {
    match text.char_indices().nth(MAX_CELL_TEXT) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
