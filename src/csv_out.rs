use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ConvertError;
use crate::model::{RECORD_COLUMNS, Record};

fn write_records<W: Write>(writer: &mut Writer<W>, records: &[Record]) -> Result<(), ConvertError> {
    writer.write_record(RECORD_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn builder(delimiter: u8) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.delimiter(delimiter).has_headers(false);
    builder
}

pub(crate) fn write_csv(
    path: &Path,
    records: &[Record],
    delimiter: u8,
) -> Result<(), ConvertError> {
    let mut writer = builder(delimiter).from_path(path)?;
    write_records(&mut writer, records)
}

pub(crate) fn write_csv_to_string(
    records: &[Record],
    delimiter: u8,
) -> Result<String, ConvertError> {
    let mut writer = builder(delimiter).from_writer(Vec::<u8>::new());
    write_records(&mut writer, records)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ConvertError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ConvertError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
