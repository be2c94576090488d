use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1251};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::warn;

use crate::error::ConvertError;
use crate::model::{Fragment, PageFragments};
use crate::options::PageSelection;
use crate::warning::{ConvertWarning, WarningCode};

/// Average glyph advance as a share of the font size; no font metrics are read.
const GLYPH_WIDTH: f32 = 0.5;
/// `TJ` adjustments beyond this (thousandths of an em) read as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
const FALLBACK_TOP: f32 = 800.0;
const FALLBACK_LEADING: f32 = 12.0;

/// Fragments of the selected pages plus notes about how they were obtained.
#[derive(Debug, Default)]
pub(crate) struct Extraction {
    pub(crate) pages: Vec<PageFragments>,
    pub(crate) warnings: Vec<ConvertWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands
            .iter()
            .take(6)
            .map(get_number)
            .collect::<Option<Vec<_>>>()?;
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Text state of one content stream, as far as positions are concerned.
struct TextState<'a> {
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
    encoding: Option<&'a str>,
}

impl<'a> TextState<'a> {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            encoding: None,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Horizontal advance of `text` in unscaled text space units.
    fn advance(&self, text: &str) -> f32 {
        let glyphs = text.chars().count() as f32;
        let spaces = text.chars().filter(|c| *c == ' ').count() as f32;
        (glyphs * (self.font_size * GLYPH_WIDTH + self.char_spacing) + spaces * self.word_spacing)
            * self.horizontal_scaling
    }

    fn shift(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx, 0.0).then(self.text_matrix);
    }

    /// Emits `text` at the current position and moves past it.
    fn show(&mut self, text: String, advance: f32, out: &mut Vec<Fragment>) {
        let placed = self.text_matrix.then(self.ctm);
        let width = advance * placed.horizontal_scale();
        if !text.trim().is_empty() {
            out.push(Fragment::new(text, placed.e, placed.f, width));
        }
        self.shift(advance);
    }
}

fn get_number(object: &Object) -> Option<f32> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn number_at(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(get_number)
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    // Latin-1 accented letters are what single-byte Cyrillic looks like when
    // decoded with the wrong code page.
    let latin_supplement = text
        .chars()
        .filter(|ch| ('\u{00C0}'..='\u{00FF}').contains(ch))
        .count();

    replacement * 8 > total || control * 5 > total || latin_supplement * 2 > total
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let bytes = if bytes.starts_with(&[0xFE, 0xFF]) {
        &bytes[2..]
    } else {
        bytes
    };
    let (text, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let lower = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    if ["identity-h", "ucs2", "utf16", "unicode"]
        .iter()
        .any(|name| lower.contains(name))
        && let Some(text) = decode_utf16(bytes)
    {
        return text;
    }
    if lower.contains("1251") || lower.contains("cyrillic") {
        let (text, _, _) = WINDOWS_1251.decode(bytes);
        return text.into_owned();
    }

    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF])
        && let Some(text) = decode_utf16(bytes)
    {
        return text;
    }
    if bytes.iter().any(|byte| *byte >= 0xC0) {
        let (text, _, had_errors) = WINDOWS_1251.decode(bytes);
        if !had_errors {
            return text.into_owned();
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Text of a `TJ` array; large negative adjustments become spaces.
fn collect_array(state: &TextState<'_>, items: &[Object]) -> (String, f32) {
    let mut text = String::new();
    let mut advance = 0.0;
    for item in items {
        match item {
            Object::String(bytes, _) => {
                let piece = decode_pdf_bytes(state.encoding, bytes);
                advance += state.advance(&piece);
                text.push_str(&piece);
            }
            other => {
                let Some(adjustment) = get_number(other) else {
                    continue;
                };
                advance -= adjustment / 1000.0 * state.font_size * state.horizontal_scaling;
                if -adjustment > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }
    (text, advance)
}

fn shown_string(state: &TextState<'_>, operands: &[Object]) -> Option<(String, f32)> {
    operands.iter().rev().find_map(|operand| match operand {
        Object::String(bytes, _) => {
            let text = decode_pdf_bytes(state.encoding, bytes);
            let advance = state.advance(&text);
            Some((text, advance))
        }
        _ => None,
    })
}

fn page_fragments(
    document: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<Vec<Fragment>, ConvertError> {
    let extract_error = |error: lopdf::Error| ConvertError::PdfExtract {
        page: page_number,
        message: error.to_string(),
    };
    let raw_content = document.get_page_content(page_id).map_err(extract_error)?;
    let content = Content::decode(&raw_content).map_err(extract_error)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut state = TextState::new();
    let mut fragments = Vec::new();
    for operation in &content.operations {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => state.saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.ctm = matrix.then(state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(name) = operands.first().and_then(|operand| operand.as_name().ok()) {
                    state.encoding = encodings.get(name).copied();
                }
                if let Some(size) = number_at(operands, 1) {
                    state.font_size = size;
                }
            }
            "TL" => state.leading = number_at(operands, 0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number_at(operands, 0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number_at(operands, 0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(scale) = number_at(operands, 0) {
                    state.horizontal_scaling = scale / 100.0;
                }
            }
            "Td" | "TD" => {
                let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) else {
                    continue;
                };
                if operation.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.text_matrix = matrix;
                    state.line_matrix = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                if operation.operator == "\"" {
                    if let Some(spacing) = number_at(operands, 0) {
                        state.word_spacing = spacing;
                    }
                    if let Some(spacing) = number_at(operands, 1) {
                        state.char_spacing = spacing;
                    }
                }
                if operation.operator != "Tj" {
                    state.next_line();
                }
                if let Some((text, advance)) = shown_string(&state, operands) {
                    state.show(text, advance, &mut fragments);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let (text, advance) = collect_array(&state, items);
                    state.show(text, advance, &mut fragments);
                }
            }
            _ => {}
        }
    }
    Ok(fragments)
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

/// One fragment per text line, stacked top down at the left margin.
fn synthesize_fragments(page_text: &str) -> Vec<Fragment> {
    page_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            #[allow(clippy::cast_precision_loss)]
            let y = FALLBACK_TOP - index as f32 * FALLBACK_LEADING;
            #[allow(clippy::cast_precision_loss)]
            let width = line.chars().count() as f32 * 5.0;
            Fragment::new(line, 0.0, y, width)
        })
        .collect()
}

fn read_document(
    document: &Document,
    page_selection: Option<&PageSelection>,
    extract_text: impl FnOnce() -> Option<String>,
) -> Result<Extraction, ConvertError> {
    let pages_map = document.get_pages();
    let mut extract_text = Some(extract_text);
    let mut fallback_pages: Option<Vec<String>> = None;

    let mut extraction = Extraction::default();
    for (index, (page_number, page_id)) in pages_map.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(*page_number)) {
            continue;
        }

        let mut fragments = page_fragments(document, *page_number, *page_id)?;
        if fragments.is_empty() {
            if let Some(extract) = extract_text.take() {
                fallback_pages = extract().map(|text| split_text_into_pages(&text));
            }
            if let Some(text) = fallback_pages.as_ref().and_then(|pages| pages.get(index)) {
                fragments = synthesize_fragments(text);
                if !fragments.is_empty() {
                    warn!(page = page_number, "no positioned text, using plain text extraction");
                    extraction.warnings.push(
                        ConvertWarning::new(
                            WarningCode::TextFallback,
                            "page has no positioned text; read from plain text extraction",
                        )
                        .with_page(*page_number),
                    );
                }
            }
        }

        extraction.pages.push(PageFragments {
            page_number: *page_number,
            fragments,
        });
    }

    if extraction.pages.is_empty() {
        return Err(ConvertError::NoPagesSelected);
    }
    Ok(extraction)
}

pub(crate) fn extract_from_path(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Extraction, ConvertError> {
    let document = Document::load(input_pdf)?;
    read_document(&document, page_selection, || {
        pdf_extract::extract_text(input_pdf).ok()
    })
}

pub(crate) fn extract_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Extraction, ConvertError> {
    let document = Document::load_mem(input_pdf)?;
    read_document(&document, page_selection, || {
        pdf_extract::extract_text_from_mem(input_pdf).ok()
    })
}

/// Positioned text fragments of every selected page, in page order.
///
/// # Errors
///
/// Fails when the document cannot be loaded, a page content stream cannot be
/// decoded, or the selection matches no page.
pub fn read_pdf_fragments(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageFragments>, ConvertError> {
    extract_from_path(input_pdf, page_selection).map(|extraction| extraction.pages)
}

/// In-memory variant of [`read_pdf_fragments`].
///
/// # Errors
///
/// Same as [`read_pdf_fragments`].
pub fn read_pdf_fragments_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageFragments>, ConvertError> {
    extract_from_bytes(input_pdf, page_selection).map(|extraction| extraction.pages)
}
