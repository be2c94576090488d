use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

pub const FONT_SIZE: f32 = 10.0;
/// Column spacing of the synthetic report table.
pub const COLUMN_STEP: f32 = 40.0;

/// A string shown at `(x, y)` in PDF user space.
#[derive(Debug, Clone)]
pub struct Placed {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// Ruler numeral `1..=24`, left aligned on its column anchor.
pub fn ruler(y: f32) -> Vec<Placed> {
    (1..=24_u16)
        .map(|column| Placed {
            x: f32::from(column) * COLUMN_STEP,
            y,
            text: column.to_string(),
        })
        .collect()
}

/// Table cell centered on its column anchor, using the reader's width estimate.
pub fn cell(column: u16, y: f32, text: &str) -> Placed {
    let glyphs = f32::from(u16::try_from(text.chars().count()).expect("short cell text"));
    Placed {
        x: f32::from(column) * COLUMN_STEP - glyphs * FONT_SIZE * 0.25,
        y,
        text: text.to_string(),
    }
}

pub fn free_text(x: f32, y: f32, text: &str) -> Placed {
    Placed {
        x,
        y,
        text: text.to_string(),
    }
}

fn utf16_hex(text: &str) -> Object {
    let bytes = text
        .encode_utf16()
        .flat_map(u16::to_be_bytes)
        .collect::<Vec<u8>>();
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Writes a PDF whose pages show the given strings with an Identity-H font.
pub fn create_report_pdf(
    path: &Path,
    pages: &[Vec<Placed>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "ArialMT",
        "Encoding" => "Identity-H",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for items in pages {
        let mut operations = Vec::new();
        for item in items {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
                Operation::new(
                    "Tm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        item.x.into(),
                        item.y.into(),
                    ],
                ),
                Operation::new("Tj", vec![utf16_hex(&item.text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 1100.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}
