//! Canonical names for species codes, protection categories, operations,
//! forest types, site conditions and land-feature kinds.
//!
//! Lookups compare compact keys (lowercase, `ё` folded to `е`, letters and
//! digits only), so spacing and punctuation in the source never matter.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;
use crate::text::{compact_key, normalize_spaces};

/// How a free-text lookup is allowed to match a dictionary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The whole text is a key.
    Exact,
    /// The longest key contained anywhere in the text.
    Contained,
}

/// Maps raw table text to canonical names.
///
/// The engine only ever talks to this trait, so a caller can plug in a
/// template-specific vocabulary without touching the parser.
pub trait Canonicalizer {
    /// Canonical species code; unknown codes come back upper-cased.
    fn species(&self, code: &str) -> String;

    /// Canonical protection category; unknown text comes back normalized.
    fn protection_category(&self, text: &str) -> String;

    /// Canonical operation wording; unknown text comes back normalized.
    fn operation(&self, text: &str) -> String;

    fn forest_group(&self, text: &str, lookup: Lookup) -> Option<String>;

    fn site_condition_type(&self, text: &str, lookup: Lookup) -> Option<String>;

    fn object_kind(&self, text: &str, lookup: Lookup) -> Option<String>;

    fn stand_header_kind(&self, text: &str, lookup: Lookup) -> Option<String>;

    /// Splits the forest-type cell into `(forest type, site conditions)`.
    ///
    /// The cell holds a forest group, a site condition code, or both
    /// (`ЧЕР С2`). Exact keys are tried on the whole cell and on its words,
    /// then the longest contained keys. Text that matches nothing is kept as
    /// the forest type, unless it starts with a digit (a bled number).
    fn forest_type_and_site(&self, text: &str) -> (Option<String>, Option<String>) {
        let text = normalize_spaces(text);
        if text.is_empty() {
            return (None, None);
        }
        if let Some(group) = self.forest_group(&text, Lookup::Exact) {
            return (Some(group), None);
        }
        if let Some(site) = self.site_condition_type(&text, Lookup::Exact) {
            return (None, Some(site));
        }

        let words: Vec<&str> = text.split(' ').collect();
        if words.len() >= 2 {
            let head = words[..2].join(" ");
            if let Some(group) = self.forest_group(&head, Lookup::Exact) {
                let rest = words[2..].join(" ");
                return (Some(group), self.site_condition_type(&rest, Lookup::Exact));
            }
            let rest = words[1..].join(" ");
            if let (Some(group), Some(site)) = (
                self.forest_group(words[0], Lookup::Exact),
                self.site_condition_type(&rest, Lookup::Exact),
            ) {
                return (Some(group), Some(site));
            }
        }
        if let [single] = words.as_slice()
            && single.chars().count() <= 3
            && let Some(site) = self.site_condition_type(single, Lookup::Exact)
        {
            return (None, Some(site));
        }

        if text.starts_with(|ch: char| ch.is_ascii_digit()) {
            return (None, None);
        }
        match (
            self.forest_group(&text, Lookup::Contained),
            self.site_condition_type(&text, Lookup::Contained),
        ) {
            (None, None) => (Some(text), None),
            pair => pair,
        }
    }
}

/// Compact key to canonical value.
#[derive(Debug, Clone, Default)]
struct Table {
    entries: BTreeMap<String, String>,
}

impl Table {
    fn from_names(names: &[&str]) -> Self {
        let mut table = Self::default();
        for name in names {
            table.insert(name, name);
        }
        table
    }

    fn with_aliases(mut self, aliases: &[(&str, &str)]) -> Self {
        for (alias, canonical) in aliases {
            self.insert(alias, canonical);
        }
        self
    }

    fn insert(&mut self, key: &str, canonical: &str) {
        let key = compact_key(key);
        if !key.is_empty() {
            self.entries.insert(key, normalize_spaces(canonical));
        }
    }

    fn exact(&self, text: &str) -> Option<&str> {
        self.entries.get(&compact_key(text)).map(String::as_str)
    }

    fn contained(&self, text: &str) -> Option<&str> {
        let haystack = compact_key(text);
        if haystack.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|(key, _)| haystack.contains(key.as_str()))
            .max_by_key(|(key, _)| key.chars().count())
            .map(|(_, value)| value.as_str())
    }

    fn find(&self, text: &str, lookup: Lookup) -> Option<String> {
        match lookup {
            Lookup::Exact => self.exact(text),
            Lookup::Contained => self.contained(text),
        }
        .map(str::to_string)
    }
}

const SPECIES: &[&str] = &[
    "С", "Е", "П", "Л", "К", "Б", "ОС", "ОЛС", "ОЛСА", "ОЛЧ", "ИВ", "ИВК", "ЛП", "Д", "ДН", "КЛ",
    "ВЗ", "ИЛ", "ЯС", "Т", "ЧР", "РЯБ",
];
const SPECIES_ALIASES: &[(&str, &str)] = &[
    ("сосна", "С"),
    ("ель", "Е"),
    ("пихта", "П"),
    ("лиственница", "Л"),
    ("кедр", "К"),
    ("береза", "Б"),
    ("осина", "ОС"),
    ("ольха серая", "ОЛС"),
    ("ольха черная", "ОЛЧ"),
    ("ива", "ИВ"),
    ("липа", "ЛП"),
    ("дуб", "Д"),
    ("клен", "КЛ"),
    ("ясень", "ЯС"),
    ("тополь", "Т"),
    ("рябина", "РЯБ"),
    // latin look-alikes left by some PDF producers
    ("C", "С"),
    ("E", "Е"),
    ("OC", "ОС"),
    ("OЛС", "ОЛС"),
    ("K", "К"),
    ("T", "Т"),
];

const PROTECTION_CATEGORIES: &[&str] = &[
    "Эксплуатационные леса",
    "Резервные леса",
    "Ценные леса",
    "Лесопарковые зоны",
    "Зеленые зоны",
    "Леса, расположенные в водоохранных зонах",
    "Защитные полосы лесов, расположенные вдоль железнодорожных путей общего пользования, федеральных автомобильных дорог общего пользования, автомобильных дорог общего пользования, находящихся в собственности субъектов Российской Федерации",
    "Запретные полосы лесов, расположенные вдоль водных объектов",
    "Нерестоохранные полосы лесов",
    "Противоэрозионные леса",
    "Леса, выполняющие функции защиты природных и иных объектов",
];
const PROTECTION_CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("Эксплуатационные", "Эксплуатационные леса"),
    ("Водоохранные зоны", "Леса, расположенные в водоохранных зонах"),
    ("Нерестоохранные полосы", "Нерестоохранные полосы лесов"),
];

const OPERATIONS: &[&str] = &[
    "Рубка ухода",
    "Осветление",
    "Прочистка",
    "Прореживание",
    "Проходная рубка",
    "Санитарная рубка",
    "Выборочная санитарная рубка",
    "Сплошная санитарная рубка",
    "Уборка захламленности",
    "Рубка обновления",
    "Рубка переформирования",
    "Рубка спелых и перестойных насаждений",
    "Дополнение лесных культур",
    "Агротехнический уход",
    "Содействие естественному возобновлению",
];
const OPERATION_ALIASES: &[(&str, &str)] = &[
    ("Выб сан рубка", "Выборочная санитарная рубка"),
    ("Спл сан рубка", "Сплошная санитарная рубка"),
    ("Уборка захламл", "Уборка захламленности"),
    ("Проходная", "Проходная рубка"),
];

const FOREST_GROUPS: &[&str] = &[
    "ЧЕР", "КИС", "БР", "ДМ", "СФ", "ТР", "ЛИШ", "ПАП", "ОСОК", "ЛБ", "КС", "ЧЕР ВЛ", "ТР БОЛ",
];
const FOREST_GROUP_ALIASES: &[(&str, &str)] = &[
    ("черничник", "ЧЕР"),
    ("кисличник", "КИС"),
    ("брусничник", "БР"),
    ("долгомошник", "ДМ"),
    ("сфагновый", "СФ"),
    ("травяной", "ТР"),
    ("лишайниковый", "ЛИШ"),
    ("папоротниковый", "ПАП"),
];

/// Site condition types `А0`..`Д5`.
fn site_condition_types() -> Table {
    let mut table = Table::default();
    for (cyrillic, latin) in [('А', 'A'), ('В', 'B'), ('С', 'C'), ('Д', 'D')] {
        for moisture in 0..=5 {
            let canonical = format!("{cyrillic}{moisture}");
            table.insert(&canonical, &canonical);
            table.insert(&format!("{latin}{moisture}"), &canonical);
        }
    }
    table
}

const OBJECT_KINDS: &[&str] = &[
    "Болота",
    "Дороги",
    "Ручьи",
    "Реки",
    "Озера",
    "Просеки",
    "Вырубки",
    "Поляны",
    "Гари",
    "Пустыри",
    "Пески",
    "Сенокосы",
    "Пастбища",
    "Усадьбы",
    "Карьеры",
    "Трассы",
    "Линии электропередачи",
    "Прочие земли",
];
const OBJECT_KIND_ALIASES: &[(&str, &str)] = &[
    ("Болото", "Болота"),
    ("Дорога", "Дороги"),
    ("Ручей", "Ручьи"),
    ("Река", "Реки"),
    ("Озеро", "Озера"),
    ("Просека", "Просеки"),
    ("Вырубка", "Вырубки"),
    ("Поляна", "Поляны"),
    ("ЛЭП", "Линии электропередачи"),
];

const STAND_HEADER_KINDS: &[&str] = &[
    "Насаждения",
    "Культуры лесные",
    "Несомкнувшиеся лесные культуры",
    "Насаждения искусственного происхождения",
    "Молодняки",
    "Лесные питомники",
    "Плантации",
];
const STAND_HEADER_KIND_ALIASES: &[(&str, &str)] = &[
    ("Лесные культуры", "Культуры лесные"),
    ("Несомкнувшиеся культуры", "Несомкнувшиеся лесные культуры"),
];

/// User vocabulary file: each section maps raw text to its canonical form.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DictionaryFile {
    species: BTreeMap<String, String>,
    protection_categories: BTreeMap<String, String>,
    operations: BTreeMap<String, String>,
    forest_groups: BTreeMap<String, String>,
    site_conditions: BTreeMap<String, String>,
    object_kinds: BTreeMap<String, String>,
    stand_header_kinds: BTreeMap<String, String>,
}

/// Built-in vocabulary, optionally extended from a JSON file.
#[derive(Debug, Clone)]
pub struct Dictionaries {
    species: Table,
    protection_categories: Table,
    operations: Table,
    forest_groups: Table,
    site_conditions: Table,
    object_kinds: Table,
    stand_header_kinds: Table,
}

impl Default for Dictionaries {
    fn default() -> Self {
        Self {
            species: Table::from_names(SPECIES).with_aliases(SPECIES_ALIASES),
            protection_categories: Table::from_names(PROTECTION_CATEGORIES)
                .with_aliases(PROTECTION_CATEGORY_ALIASES),
            operations: Table::from_names(OPERATIONS).with_aliases(OPERATION_ALIASES),
            forest_groups: Table::from_names(FOREST_GROUPS).with_aliases(FOREST_GROUP_ALIASES),
            site_conditions: site_condition_types(),
            object_kinds: Table::from_names(OBJECT_KINDS).with_aliases(OBJECT_KIND_ALIASES),
            stand_header_kinds: Table::from_names(STAND_HEADER_KINDS)
                .with_aliases(STAND_HEADER_KIND_ALIASES),
        }
    }
}

impl Dictionaries {
    /// Built-ins with the entries of a JSON vocabulary file layered on top.
    pub fn from_json_file(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConvertError> {
        let file: DictionaryFile = serde_json::from_str(text)
            .map_err(|error| ConvertError::Dictionary(error.to_string()))?;
        let mut dictionaries = Self::default();
        for (table, entries) in [
            (&mut dictionaries.species, &file.species),
            (&mut dictionaries.protection_categories, &file.protection_categories),
            (&mut dictionaries.operations, &file.operations),
            (&mut dictionaries.forest_groups, &file.forest_groups),
            (&mut dictionaries.site_conditions, &file.site_conditions),
            (&mut dictionaries.object_kinds, &file.object_kinds),
            (&mut dictionaries.stand_header_kinds, &file.stand_header_kinds),
        ] {
            for (raw, canonical) in entries {
                if canonical.trim().is_empty() {
                    return Err(ConvertError::Dictionary(format!(
                        "entry '{raw}' has an empty canonical value"
                    )));
                }
                table.insert(raw, canonical);
                table.insert(canonical, canonical);
            }
        }
        Ok(dictionaries)
    }
}

impl Canonicalizer for Dictionaries {
    fn species(&self, code: &str) -> String {
        let code = code.trim();
        self.species
            .exact(code)
            .map_or_else(|| code.to_uppercase(), str::to_string)
    }

    fn protection_category(&self, text: &str) -> String {
        self.protection_categories
            .exact(text)
            .map_or_else(|| normalize_spaces(text), str::to_string)
    }

    fn operation(&self, text: &str) -> String {
        self.operations
            .exact(text)
            .map_or_else(|| normalize_spaces(text), str::to_string)
    }

    fn forest_group(&self, text: &str, lookup: Lookup) -> Option<String> {
        self.forest_groups.find(text, lookup)
    }

    fn site_condition_type(&self, text: &str, lookup: Lookup) -> Option<String> {
        self.site_conditions.find(text, lookup)
    }

    fn object_kind(&self, text: &str, lookup: Lookup) -> Option<String> {
        self.object_kinds.find(text, lookup)
    }

    fn stand_header_kind(&self, text: &str, lookup: Lookup) -> Option<String> {
        self.stand_header_kinds.find(text, lookup)
    }
}
