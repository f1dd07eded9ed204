use std::io::{Cursor, Write};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::format::{FileFormat, MIME_ZIP};

const SHEET_NAME: &str = "PhoneNumbers";

/// Rows in one Excel worksheet.
pub const XLSX_MAX_ROWS: usize = 1_048_576;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no phone numbers to export")]
    Empty,
    #[error("split size must be at least 1")]
    InvalidChunkSize,
    #[error("too many rows for a single worksheet")]
    TooManyRows,
    #[error("xlsx: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("zip: {0}")]
    Zip(#[from] ZipError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloadable export: either one plain file or a zip of parts.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub part_count: usize,
}

/// Serialize `numbers` as one file in `format`.
pub fn write(numbers: &[String], format: FileFormat) -> Result<Vec<u8>, ExportError> {
    if numbers.is_empty() {
        return Err(ExportError::Empty);
    }
    match format {
        FileFormat::Csv | FileFormat::Txt => Ok(numbers.join("\n").into_bytes()),
        FileFormat::Xlsx if numbers.len() > XLSX_MAX_ROWS => Err(ExportError::TooManyRows),
        FileFormat::Xlsx => write_xlsx(numbers),
    }
}

/// Split `numbers` into consecutive chunks of at most `chunk_size` and write
/// each as `<base>_part<k>.<ext>` (1-indexed).
pub fn write_split(
    numbers: &[String],
    format: FileFormat,
    chunk_size: usize,
    base_name: &str,
) -> Result<Vec<(String, Vec<u8>)>, ExportError> {
    if numbers.is_empty() {
        return Err(ExportError::Empty);
    }
    if chunk_size == 0 {
        return Err(ExportError::InvalidChunkSize);
    }
    numbers
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| {
            let name = format!("{}_part{}.{}", base_name, i + 1, format.extension());
            Ok((name, write(chunk, format)?))
        })
        .collect()
}

/// Build the artifact for an export request.
///
/// Without a split, or when the split yields a single chunk, the result is a
/// plain `<base>.<ext>` file. Several chunks are bundled into `<base>.zip`.
pub fn build_artifact(
    numbers: &[String],
    format: FileFormat,
    base_name: &str,
    split_size: Option<usize>,
) -> Result<Artifact, ExportError> {
    let single = |body| Artifact {
        file_name: format!("{}.{}", base_name, format.extension()),
        content_type: format.mime_type(),
        body,
        part_count: 1,
    };

    let Some(size) = split_size else {
        return Ok(single(write(numbers, format)?));
    };

    let mut parts = write_split(numbers, format, size, base_name)?;
    if parts.len() == 1 {
        let (_, body) = parts.remove(0);
        return Ok(single(body));
    }

    let part_count = parts.len();
    Ok(Artifact {
        file_name: format!("{}.zip", base_name),
        content_type: MIME_ZIP,
        body: zip_parts(&parts)?,
        part_count,
    })
}

fn write_xlsx(numbers: &[String]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let text = Format::new().set_num_format("@");
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_column_width(0, 14)?;
    for (i, n) in numbers.iter().enumerate() {
        sheet.write_string_with_format(i as u32, 0, n, &text)?;
    }
    Ok(workbook.save_to_buffer()?)
}

fn zip_parts(parts: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(body)?;
    }
    Ok(zip.finish()?.into_inner())
}
