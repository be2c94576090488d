mod common;

use std::process::Command;
use std::str::FromStr;

use common::{Placed, cell, create_report_pdf, free_text, ruler};
use pretty_assertions::assert_eq;
use taxation_to_csv::{
    ConvertError, ConvertOptions, OutputFormat, PageSelection, RowKind, WarningCode, convert_pdf,
    convert_pdf_bytes_to_string, read_pdf_fragments,
};
use tempfile::tempdir;

fn report_page() -> Vec<Placed> {
    let mut items = vec![free_text(
        40.0,
        810.0,
        "Категория защитности: Эксплуатационные леса Квартал 12",
    )];
    items.extend(ruler(780.0));
    items.extend([
        cell(1, 750.0, "6"),
        cell(2, 750.0, "22.8"),
        cell(3, 750.0, "Культуры лесные"),
        cell(3, 730.0, "5Е5Б"),
    ]);
    let metrics = [
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
    ];
    items.extend(metrics.iter().map(|(column, text)| cell(*column, 710.0, text)));
    items
}

#[test]
fn reads_positioned_identity_h_text() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("positions.pdf");
    create_report_pdf(&input, &[report_page()]).expect("PDF fixture should be created");

    let pages = read_pdf_fragments(&input, None).expect("fragments should be read");
    assert_eq!(pages.len(), 1);
    let header = pages[0]
        .fragments
        .iter()
        .find(|fragment| fragment.text == "Культуры лесные")
        .expect("description fragment");
    assert!((header.y - 750.0).abs() < 0.01);
    assert!((header.center_x() - 120.0).abs() < 0.5);
}

#[test]
fn converts_report_to_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("report.pdf");
    let output = dir.path().join("report.csv");
    create_report_pdf(&input, &[report_page()]).expect("PDF fixture should be created");

    let report = convert_pdf(&input, &output, &ConvertOptions::default())
        .expect("conversion should succeed");

    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(report.record_count, 2, "unexpected CSV output: {csv:?}");
    assert!(lines[0].starts_with("quarter,row_no,category,vydel,kind,page,area,description"));
    assert!(
        lines[1].starts_with("12,1,Эксплуатационные леса,6,VYDEL_HEADER,1,22.8,Культуры лесные,"),
        "unexpected CSV output: {csv:?}"
    );
    assert!(
        lines[2].starts_with("12,3,Эксплуатационные леса,6,MAIN,1,,5Е5Б,1,12,Е,25,10,12,3,2,1,"),
        "unexpected CSV output: {csv:?}"
    );
    assert!(report.degraded_pages.is_empty());
}

#[test]
fn renders_json_from_memory() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("report.pdf");
    create_report_pdf(&input, &[report_page()]).expect("PDF fixture should be created");
    let bytes = std::fs::read(&input).expect("PDF should be readable");

    let options = ConvertOptions {
        format: OutputFormat::Json,
        ..ConvertOptions::default()
    };
    let (json, report) =
        convert_pdf_bytes_to_string(&bytes, &options).expect("conversion should succeed");

    let value: serde_json::Value = serde_json::from_str(&json).expect("output is JSON");
    let kinds = value
        .as_array()
        .expect("records array")
        .iter()
        .map(|record| record["kind"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![RowKind::VydelHeader.to_string(), RowKind::Main.to_string()]);
    assert_eq!(value[1]["stocking"], 0.7);
    assert_eq!(report.record_count, 2);
}

#[test]
fn page_without_ruler_degrades_instead_of_failing() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("plain.pdf");
    let output = dir.path().join("plain.csv");
    create_report_pdf(
        &input,
        &[vec![
            free_text(40.0, 760.0, "6 22.8 Культуры лесные"),
            free_text(40.0, 740.0, "Е 90 24"),
        ]],
    )
    .expect("PDF fixture should be created");

    let report = convert_pdf(&input, &output, &ConvertOptions::default())
        .expect("conversion should succeed");

    assert_eq!(report.degraded_pages, vec![1]);
    assert_eq!(report.record_count, 2);
    assert!(
        report
            .warnings
            .iter()
            .any(|warning| warning.code == WarningCode::NoGridDetected)
    );
}

#[test]
fn selection_outside_document_is_an_error() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("one-page.pdf");
    let output = dir.path().join("one-page.csv");
    create_report_pdf(&input, &[report_page()]).expect("PDF fixture should be created");

    let options = ConvertOptions {
        pages: Some(PageSelection::from_str("5").expect("selection should parse")),
        ..ConvertOptions::default()
    };
    let error = convert_pdf(&input, &output, &options).expect_err("no page should match");
    assert!(matches!(error, ConvertError::NoPagesSelected));
    assert!(!output.exists());
}

#[test]
fn cli_writes_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli.pdf");
    let output = dir.path().join("cli.csv");
    create_report_pdf(&input, &[report_page()]).expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_tax2csv"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
            "--delimiter",
            ";",
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(0));
    let csv = std::fs::read_to_string(&output).expect("CSV should be readable");
    assert!(csv.contains(";6;MAIN;1;;5Е5Б;"), "unexpected CSV output: {csv:?}");
}

#[test]
fn cli_exits_with_code_2_when_no_records() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("cli-empty.pdf");
    let output = dir.path().join("cli-empty.csv");

    let mut page = vec![free_text(40.0, 810.0, "Категория защитности: Резервные леса Квартал 3")];
    page.extend(ruler(780.0));
    create_report_pdf(&input, &[page]).expect("PDF fixture should be created");

    let status = Command::new(env!("CARGO_BIN_EXE_tax2csv"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_exits_with_code_1_on_unreadable_input() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("broken.pdf");
    let output = dir.path().join("broken.csv");
    std::fs::write(&input, b"not a pdf").expect("file should be written");

    let status = Command::new(env!("CARGO_BIN_EXE_tax2csv"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");

    assert_eq!(status.code(), Some(1));
}
