use std::io::Cursor;

use anyhow::Context;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use serde::Serialize;

use super::{format::FileFormat, normalize::normalize};

/// Result of reading a phone list: accepted canonical numbers in file order,
/// and how many non-blank candidates were skipped because they did not
/// normalize.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOutcome {
    pub accepted: Vec<String>,
    pub rejected: usize,
}

impl ReadOutcome {
    fn push_candidate(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        match normalize(raw) {
            Some(n) => self.accepted.push(n),
            None => self.rejected += 1,
        }
    }
}

/// Parse `bytes` as `format` and normalize every candidate.
pub fn read(bytes: &[u8], format: FileFormat) -> anyhow::Result<ReadOutcome> {
    let candidates = match format {
        FileFormat::Txt => read_text_lines(bytes),
        FileFormat::Csv => read_csv_first_column(bytes)?,
        FileFormat::Xlsx => read_spreadsheet_first_column(bytes)?,
    };
    let mut out = ReadOutcome::default();
    for c in &candidates {
        out.push_candidate(c);
    }
    Ok(out)
}

fn read_text_lines(bytes: &[u8]) -> Vec<String> {
    // `lines` splits on both "\n" and "\r\n"
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn read_csv_first_column(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut out = Vec::new();
    for record in rdr.byte_records() {
        let record = record.context("read csv record")?;
        if let Some(field) = record.get(0) {
            out.push(String::from_utf8_lossy(field).into_owned());
        }
    }
    Ok(out)
}

fn read_spreadsheet_first_column(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let cursor = Cursor::new(bytes);

    if let Ok(mut workbook) = Xlsx::new(cursor.clone()) {
        let range = workbook
            .worksheet_range_at(0)
            .context("workbook has no sheets")?
            .context("read first sheet")?;
        return Ok(first_column(&range));
    }

    let mut workbook = Xls::new(cursor).context("not a readable xlsx or xls workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("read first sheet")?;
    Ok(first_column(&range))
}

fn first_column(range: &Range<Data>) -> Vec<String> {
    range
        .rows()
        .filter_map(|row| row.first())
        .map(cell_to_string)
        .filter(|s| !s.is_empty())
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // numeric cells lose the leading zero; the normalizer puts it back
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        _ => String::new(),
    }
}
