//! Rebuilds the stand records of forest inventory (taxation) reports from
//! positioned PDF text.
//!
//! Each page goes through line grouping, column grid detection, cell
//! splitting, a repair cascade, row classification and record assembly. The
//! records of all pages are then written as CSV or JSON.

mod assemble;
mod cells;
mod classify;
mod context;
mod csv_out;
mod dictionaries;
mod error;
mod grid;
mod header;
mod json_out;
mod layout;
mod model;
mod noise;
mod options;
mod pdf_reader;
mod progress;
mod repair;
mod row;
mod text;
mod warning;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::assemble::Assembler;
use crate::csv_out::{write_csv, write_csv_to_string};
use crate::grid::detect_grid;
use crate::json_out::{write_json, write_json_to_string};
use crate::layout::group_into_lines;
use crate::pdf_reader::{Extraction, extract_from_bytes, extract_from_path};

pub use dictionaries::{Canonicalizer, Dictionaries, Lookup};
pub use error::ConvertError;
pub use model::{Fragment, PageFragments, RECORD_COLUMNS, Record, RowKind};
pub use options::{ConvertOptions, OutputFormat, PageSelection, Tolerances};
pub use pdf_reader::{read_pdf_fragments, read_pdf_fragments_from_bytes};
pub use progress::{NoProgress, Progress};
pub use warning::{ConvertWarning, WarningCode};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionReport {
    pub page_count: usize,
    pub record_count: usize,
    /// Pages read without a column grid.
    pub degraded_pages: Vec<u32>,
    pub warnings: Vec<ConvertWarning>,
}

fn validate_options(options: &ConvertOptions) -> Result<(), ConvertError> {
    if matches!(options.delimiter, b'"' | b'\n' | b'\r') {
        return Err(ConvertError::InvalidOption(format!(
            "delimiter {:?} cannot be used",
            char::from(options.delimiter)
        )));
    }
    if options.pages.as_ref().is_some_and(PageSelection::is_empty) {
        return Err(ConvertError::InvalidPageSelection(
            "page selection cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn load_dictionaries(options: &ConvertOptions) -> Result<Dictionaries, ConvertError> {
    match &options.dictionaries {
        Some(path) => {
            debug!(path = %path.display(), "loading dictionary file");
            Dictionaries::from_json_file(path)
        }
        None => Ok(Dictionaries::default()),
    }
}

/// Runs the table reconstruction over already extracted pages.
///
/// Pages are read in the given order; state such as the current quarter or
/// an open subdivision carries over from one page to the next.
pub fn parse_pages(
    pages: &[PageFragments],
    options: &ConvertOptions,
    canon: &dyn Canonicalizer,
    progress: &mut dyn Progress,
) -> (Vec<Record>, ConversionReport) {
    let total = u32::try_from(pages.len()).unwrap_or(u32::MAX);
    let mut report = ConversionReport {
        page_count: pages.len(),
        ..ConversionReport::default()
    };
    let mut assembler = Assembler::new(canon, &options.tolerances);

    for (current, page) in (1..=total).zip(pages) {
        let lines = group_into_lines(&page.fragments, &options.tolerances);
        let grid = detect_grid(&lines, &options.tolerances);
        if grid.is_none() && !lines.is_empty() {
            warn!(
                page = page.page_number,
                lines = lines.len(),
                "no column grid, reading lines as text"
            );
            report.degraded_pages.push(page.page_number);
            report.warnings.push(
                ConvertWarning::new(
                    WarningCode::NoGridDetected,
                    "no column grid detected; rows were read from line text",
                )
                .with_page(page.page_number),
            );
        }

        let before = assembler.record_count();
        assembler.feed_page(page.page_number, &lines, grid.as_ref());
        debug!(
            page = page.page_number,
            lines = lines.len(),
            strategy = ?grid.as_ref().map(|grid| grid.strategy),
            records = assembler.record_count() - before,
            "page parsed"
        );
        progress.on_page(current, total);
    }

    let records = assembler.finish();
    report.record_count = records.len();
    info!(
        pages = report.page_count,
        records = report.record_count,
        degraded = report.degraded_pages.len(),
        "conversion finished"
    );
    (records, report)
}

fn convert_extraction(
    extraction: Extraction,
    options: &ConvertOptions,
    progress: &mut dyn Progress,
) -> Result<(Vec<Record>, ConversionReport), ConvertError> {
    let dictionaries = load_dictionaries(options)?;
    let (records, mut report) = parse_pages(&extraction.pages, options, &dictionaries, progress);
    let mut warnings = extraction.warnings;
    warnings.append(&mut report.warnings);
    report.warnings = warnings;
    Ok((records, report))
}

/// Converts a PDF file and writes the records to `output` in the configured format.
///
/// # Errors
///
/// Fails when the options are invalid, the PDF or dictionary file cannot be
/// read, or the output cannot be written. Nothing is written on failure.
pub fn convert_pdf(
    input_pdf: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    convert_pdf_with_progress(input_pdf, output, options, &mut NoProgress)
}

/// [`convert_pdf`] reporting each parsed page to `progress`.
///
/// # Errors
///
/// Same as [`convert_pdf`].
pub fn convert_pdf_with_progress(
    input_pdf: &Path,
    output: &Path,
    options: &ConvertOptions,
    progress: &mut dyn Progress,
) -> Result<ConversionReport, ConvertError> {
    validate_options(options)?;
    let extraction = extract_from_path(input_pdf, options.pages.as_ref())?;
    let (records, report) = convert_extraction(extraction, options, progress)?;
    match options.format {
        OutputFormat::Csv => write_csv(output, &records, options.delimiter)?,
        OutputFormat::Json => write_json(output, &records)?,
    }
    Ok(report)
}

/// Converts an in-memory PDF and returns the rendered output.
///
/// # Errors
///
/// Same as [`convert_pdf`], minus output file errors.
pub fn convert_pdf_bytes_to_string(
    input_pdf: &[u8],
    options: &ConvertOptions,
) -> Result<(String, ConversionReport), ConvertError> {
    validate_options(options)?;
    let extraction = extract_from_bytes(input_pdf, options.pages.as_ref())?;
    let (records, report) = convert_extraction(extraction, options, &mut NoProgress)?;
    let rendered = match options.format {
        OutputFormat::Csv => write_csv_to_string(&records, options.delimiter)?,
        OutputFormat::Json => write_json_to_string(&records)?,
    };
    Ok((rendered, report))
}

#[cfg(test)]
mod tests {
    use super::{ConvertOptions, validate_options};
    use crate::error::ConvertError;

    #[test]
    fn rejects_quote_delimiter() {
        let options = ConvertOptions {
            delimiter: b'"',
            ..ConvertOptions::default()
        };
        assert!(matches!(
            validate_options(&options),
            Err(ConvertError::InvalidOption(_))
        ));
        assert!(validate_options(&ConvertOptions::default()).is_ok());
    }
}
