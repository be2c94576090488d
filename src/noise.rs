use std::sync::LazyLock;

use regex::Regex;

use crate::text::remove_whitespace;

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}$").expect("hardcoded noise regex is valid"));
static DASH_RULER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{5,}$|-{20,}").expect("hardcoded noise regex is valid"));

/// The `1 2 3 ... 24` column numbering printed under the table header.
fn is_column_ruler(text: &str) -> bool {
    let numbers = text
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|token| !token.is_empty())
        .map(str::parse::<usize>)
        .collect::<Result<Vec<_>, _>>();
    numbers.is_ok_and(|numbers| {
        numbers.len() >= 12 && numbers.iter().enumerate().all(|(index, n)| *n == index + 1)
    })
}

/// Page furniture that never becomes a record: page numbers, rulers, the
/// repeated page header and the colon-separated table frame.
pub(crate) fn is_noise(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty()
        || BARE_NUMBER.is_match(text)
        || DASH_RULER.is_match(text)
        || text.starts_with(':')
        || is_column_ruler(text)
    {
        return true;
    }

    let compact = remove_whitespace(text).to_lowercase();
    if compact.contains("категориязащитности") && compact.contains("квартал") {
        return true;
    }
    text.matches(':').count() >= 10
}

#[cfg(test)]
mod tests {
    use super::is_noise;

    #[test]
    fn skips_page_furniture() {
        assert!(is_noise("  "));
        assert!(is_noise("17"));
        assert!(is_noise("-------"));
        assert!(is_noise(": 1 : 2 :"));
        assert!(is_noise("Категория защитности: леса  Квартал 5"));
        assert!(is_noise("a:b:c:d:e:f:g:h:i:j:k"));
        let ruler = (1..=24).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        assert!(is_noise(&ruler));
    }

    #[test]
    fn keeps_table_lines() {
        assert!(!is_noise("6 22.8 Культуры лесные"));
        assert!(!is_noise("12345"));
        assert!(!is_noise("Итого по кварталу"));
        assert!(!is_noise("Подрост: ель 2 тыс.шт/га"));
    }
}
