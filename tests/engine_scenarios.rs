use pretty_assertions::assert_eq;
use taxation_to_csv::{
    ConversionReport, ConvertOptions, Dictionaries, Fragment, NoProgress, PageFragments, Record,
    RowKind, WarningCode, parse_pages,
};

const STEP: f32 = 40.0;

fn column_x(column: u16) -> f32 {
    f32::from(column) * STEP
}

fn header(y: f32) -> Vec<Fragment> {
    vec![Fragment::new(
        "Категория защитности: Эксплуатационные леса Квартал 12",
        40.0,
        y,
        8.0,
    )]
}

fn ruler(y: f32) -> Vec<Fragment> {
    (1..=24_u16)
        .map(|column| Fragment::new(column.to_string(), column_x(column), y, 8.0))
        .collect()
}

fn row(y: f32, cells: &[(u16, &str)]) -> Vec<Fragment> {
    cells
        .iter()
        .map(|(column, text)| Fragment::new(*text, column_x(*column), y, 8.0))
        .collect()
}

/// A page with the usual header and column ruler above the given rows.
fn table_page(page_number: u32, rows: Vec<Vec<Fragment>>) -> PageFragments {
    let mut fragments = header(820.0);
    fragments.extend(ruler(800.0));
    fragments.extend(rows.into_iter().flatten());
    PageFragments {
        page_number,
        fragments,
    }
}

fn parse(pages: &[PageFragments]) -> (Vec<Record>, ConversionReport) {
    parse_pages(
        pages,
        &ConvertOptions::default(),
        &Dictionaries::default(),
        &mut NoProgress,
    )
}

fn kinds(records: &[Record]) -> Vec<RowKind> {
    records.iter().map(|record| record.kind).collect()
}

fn stand_header_rows() -> Vec<Vec<Fragment>> {
    vec![
        row(760.0, &[(1, "6"), (2, "22.8"), (3, "Культуры лесные")]),
        row(740.0, &[(3, "5Е5Б")]),
        row(
            720.0,
            &[
                (4, "1"),
                (5, "12"),
                (6, "Е"),
                (7, "25"),
                (8, "10"),
                (9, "12"),
                (10, "3"),
                (11, "2"),
                (12, "1"),
                (13, "ЧЕР"),
                (14, "0.7"),
                (15, "80"),
                (16, "1824"),
                (17, "912"),
            ],
        ),
    ]
}

fn main_row(y: f32) -> Vec<Fragment> {
    row(
        y,
        &[
            (1, "5"),
            (2, "12.4"),
            (3, "7Б1ОС2Е"),
            (4, "1"),
            (5, "22"),
            (6, "Б"),
            (7, "80"),
            (8, "24"),
            (9, "26"),
            (10, "4"),
            (11, "3"),
            (12, "2"),
            (13, "КИС"),
            (14, "0.7"),
            (15, "210"),
            (16, "2604"),
            (17, "1823"),
        ],
    )
}

#[test]
fn subdivision_header_is_emitted_with_page_context() {
    let page = table_page(1, vec![row(760.0, &[(1, "6"), (2, "22.8"), (3, "Культуры лесные")])]);
    let (records, report) = parse(&[page]);

    assert_eq!(kinds(&records), vec![RowKind::VydelHeader]);
    let header = &records[0];
    assert_eq!(header.vydel, Some(6));
    assert_eq!(header.area, Some(22.8));
    assert_eq!(header.description.as_deref(), Some("Культуры лесные"));
    assert_eq!(header.quarter, Some(12));
    assert_eq!(header.category.as_deref(), Some("Эксплуатационные леса"));
    assert_eq!(header.row_no, 1);
    assert!(report.degraded_pages.is_empty());
}

#[test]
fn composition_line_becomes_description_of_the_stand() {
    let (records, _) = parse(&[table_page(1, stand_header_rows())]);

    assert_eq!(kinds(&records), vec![RowKind::VydelHeader, RowKind::Main]);
    let main = &records[1];
    assert_eq!(main.vydel, Some(6));
    assert_eq!(main.description.as_deref(), Some("5Е5Б"));
    assert_eq!(main.area, None);
    assert_eq!(main.layer, Some(1));
    assert_eq!(main.species.as_deref(), Some("Е"));
    assert_eq!(main.age, Some(25));
    assert_eq!(main.stocking, Some(0.7));
    assert_eq!(main.row_no, 3);
}

#[test]
fn lonely_species_lines_extend_the_formula_once() {
    let page = table_page(
        1,
        vec![main_row(760.0), row(740.0, &[(6, "ОС")]), row(720.0, &[(6, "ИВ")])],
    );
    let (records, _) = parse(&[page]);

    assert_eq!(kinds(&records), vec![RowKind::Main]);
    let main = &records[0];
    assert_eq!(main.description.as_deref(), Some("7Б1ОС2Е+ИВ"));
    let raw = main.raw.as_deref().unwrap_or_default();
    assert!(raw.contains("| skip-el:ОС"), "raw: {raw}");
    assert!(raw.contains("| +el:ИВ"), "raw: {raw}");
}

#[test]
fn age_only_line_updates_previous_species_row() {
    let page = table_page(
        1,
        vec![
            main_row(760.0),
            row(740.0, &[(6, "Е"), (7, "20"), (8, "24"), (9, "28")]),
            row(720.0, &[(6, "Е"), (7, "140")]),
        ],
    );
    let (records, _) = parse(&[page]);

    assert_eq!(kinds(&records), vec![RowKind::Main, RowKind::Species]);
    let species = &records[1];
    assert_eq!(species.vydel, Some(5));
    assert_eq!(species.species.as_deref(), Some("Е"));
    assert_eq!(species.age, Some(140));
    assert_eq!(species.height, Some(24));
    assert_eq!(species.diameter, Some(28));
    assert!(species.raw.as_deref().unwrap_or_default().contains("| +age:140"));
}

#[test]
fn spaced_composition_line_is_compacted_into_the_description() {
    let mut rows = stand_header_rows();
    rows[1] = row(740.0, &[(3, "5Е 5Б")]);
    let (records, _) = parse(&[table_page(1, rows)]);

    assert_eq!(kinds(&records), vec![RowKind::VydelHeader, RowKind::Main]);
    assert_eq!(records[1].description.as_deref(), Some("5Е5Б"));
}

#[test]
fn plausible_age_leaves_species_line_to_classification() {
    let page = table_page(
        1,
        vec![
            main_row(760.0),
            row(740.0, &[(6, "Е"), (7, "120"), (8, "24"), (9, "28")]),
            row(720.0, &[(6, "Е"), (7, "140")]),
        ],
    );
    let (records, _) = parse(&[page]);

    assert_eq!(
        kinds(&records),
        vec![RowKind::Main, RowKind::Species, RowKind::Species]
    );
    assert_eq!(records[1].age, Some(120));
    assert!(!records[1].raw.as_deref().unwrap_or_default().contains("+age"));
    assert_eq!(records[2].species.as_deref(), Some("Е"));
    assert_eq!(records[2].age, Some(140));
    assert_eq!(records[2].vydel, Some(5));
}

#[test]
fn pending_totals_give_way_to_an_age_only_line() {
    let page = table_page(
        1,
        vec![
            main_row(760.0),
            row(740.0, &[(6, "Е"), (7, "20"), (8, "24"), (9, "28")]),
            row(720.0, &[(3, "Итого по кварталу")]),
            row(700.0, &[(6, "Е"), (7, "140")]),
        ],
    );
    let (records, _) = parse(&[page]);

    assert_eq!(
        kinds(&records),
        vec![RowKind::Main, RowKind::Species, RowKind::TotalQuarter]
    );
    assert_eq!(records[1].age, Some(140));
    let totals = &records[2];
    assert_eq!(totals.area, None);
    assert!(!totals.raw.as_deref().unwrap_or_default().contains("| nums:"));
}

#[test]
fn lonely_species_without_formula_keeps_plus_for_first_addition() {
    let mut rows = vec![row(
        760.0,
        &[
            (1, "5"),
            (2, "12.4"),
            (4, "1"),
            (5, "22"),
            (6, "Б"),
            (7, "80"),
            (8, "24"),
            (9, "26"),
            (14, "0.7"),
        ],
    )];
    rows.push(row(740.0, &[(6, "ОС")]));
    rows.push(row(720.0, &[(3, "+ИВ")]));
    rows.push(row(700.0, &[(6, "Д")]));
    let (records, _) = parse(&[table_page(1, rows)]);

    assert_eq!(kinds(&records), vec![RowKind::Main]);
    assert_eq!(records[0].description.as_deref(), Some("+ИВ+Д"));
    let raw = records[0].raw.as_deref().unwrap_or_default();
    assert!(!raw.contains("+el:ОС"), "raw: {raw}");
    assert!(raw.contains("| +el:Д"), "raw: {raw}");
}

#[test]
fn totals_title_and_numbers_fold_into_one_record() {
    let page = table_page(
        1,
        vec![
            row(760.0, &[(3, "Итого по кварталу")]),
            row(740.0, &[(2, "52.1"), (16, "464.3"), (17, "325")]),
            row(720.0, &[(3, "По составляющим породам")]),
            row(700.0, &[(3, "Е"), (16, "1520")]),
            row(680.0, &[(3, "О С"), (16, "12,5")]),
        ],
    );
    let (records, _) = parse(&[page]);

    assert_eq!(
        kinds(&records),
        vec![
            RowKind::TotalQuarter,
            RowKind::TotalSpeciesHeader,
            RowKind::TotalSpeciesRow,
            RowKind::TotalSpeciesRow,
        ]
    );
    let totals = &records[0];
    assert_eq!(totals.description.as_deref(), Some("Итого по кварталу"));
    assert_eq!(totals.area, Some(52.1));
    assert_eq!(totals.total_volume, Some(464.3));
    assert_eq!(totals.species_volume, Some(325.0));
    assert!(totals.raw.as_deref().unwrap_or_default().contains("| nums:"));

    assert_eq!(records[2].species.as_deref(), Some("Е"));
    assert_eq!(records[2].species_volume, Some(1520.0));
    assert_eq!(records[3].species.as_deref(), Some("ОС"));
    assert_eq!(records[3].species_volume, Some(12.5));
}

#[test]
fn totals_without_grid_read_the_bare_number_sequence() {
    let page = PageFragments {
        page_number: 2,
        fragments: vec![
            Fragment::new("Итого по кварталу", 40.0, 780.0, 90.0),
            Fragment::new("52.1 464.3 12", 40.0, 760.0, 60.0),
        ],
    };
    let (records, report) = parse(&[page]);

    assert_eq!(report.degraded_pages, vec![2]);
    assert_eq!(kinds(&records), vec![RowKind::TotalQuarter]);
    assert_eq!(records[0].area, Some(52.1));
    assert_eq!(records[0].total_volume, Some(464.3));
    assert_eq!(records[0].single_trees, Some(12.0));
}

#[test]
fn page_without_grid_still_yields_a_record_per_line() {
    let page = PageFragments {
        page_number: 4,
        fragments: vec![
            Fragment::new("Лесничество Сосновское", 40.0, 780.0, 110.0),
            Fragment::new("6 22,8 Культуры лесные", 40.0, 760.0, 110.0),
            Fragment::new("Е 90 24", 40.0, 740.0, 35.0),
        ],
    };
    let (records, report) = parse(&[page]);

    assert_eq!(report.degraded_pages, vec![4]);
    assert_eq!(report.warnings[0].code, WarningCode::NoGridDetected);
    assert_eq!(
        kinds(&records),
        vec![RowKind::Text, RowKind::VydelHeader, RowKind::Text]
    );
    assert_eq!(records[0].vydel, None);
    assert_eq!(records[0].note.as_deref(), Some("Лесничество Сосновское"));
    assert_eq!(records[1].vydel, Some(6));
    assert_eq!(records[1].area, Some(22.8));
    assert_eq!(records[2].vydel, Some(6));
    assert_eq!(records[2].note.as_deref(), Some("Е 90 24"));
}

#[test]
fn lines_before_first_subdivision_are_dropped_on_table_pages() {
    let page = table_page(1, vec![row(760.0, &[(3, "Лесничество Сосновское")])]);
    let (records, _) = parse(&[page]);
    assert!(records.is_empty());
}

#[test]
fn state_carries_across_pages() {
    let first = table_page(1, vec![main_row(760.0)]);
    let second = PageFragments {
        page_number: 2,
        fragments: {
            let mut fragments = ruler(800.0);
            fragments.extend(row(760.0, &[(6, "ИВ")]));
            fragments
        },
    };
    let (records, _) = parse(&[first, second]);

    assert_eq!(kinds(&records), vec![RowKind::Main]);
    assert_eq!(records[0].description.as_deref(), Some("7Б1ОС2Е+ИВ"));
    assert_eq!(records[0].quarter, Some(12));
}

#[test]
fn parsing_is_deterministic() {
    let pages = vec![
        table_page(1, stand_header_rows()),
        table_page(2, vec![main_row(760.0), row(740.0, &[(6, "ИВ")])]),
    ];
    let (first, _) = parse(&pages);
    let (second, _) = parse(&pages);
    assert_eq!(first, second);
}

#[test]
fn progress_is_reported_per_page() {
    let pages = vec![table_page(1, vec![]), table_page(2, vec![])];
    let mut seen = Vec::new();
    let mut progress = |current: u32, total: u32| seen.push((current, total));
    let _ = parse_pages(
        &pages,
        &ConvertOptions::default(),
        &Dictionaries::default(),
        &mut progress,
    );
    assert_eq!(seen, vec![(1, 2), (2, 2)]);
}
