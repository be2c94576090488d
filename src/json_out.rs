use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ConvertError;
use crate::model::Record;

pub(crate) fn write_json(path: &Path, records: &[Record]) -> Result<(), ConvertError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_json_to_string(records: &[Record]) -> Result<String, ConvertError> {
    Ok(serde_json::to_string_pretty(records)?)
}
