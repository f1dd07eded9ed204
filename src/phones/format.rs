use std::path::Path;

use serde::{Deserialize, Serialize};

const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MIME_XLS: &str = "application/vnd.ms-excel";
const MIME_CSV: &str = "text/csv";
const MIME_TXT: &str = "text/plain";
pub const MIME_ZIP: &str = "application/zip";

/// Phone list file formats. `Xlsx` also covers legacy `.xls` on the way in;
/// exports are always written as `.xlsx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Xlsx,
    Csv,
    Txt,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => MIME_XLSX,
            Self::Csv => MIME_CSV,
            Self::Txt => MIME_TXT,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Pick the reader for an upload: the file extension wins, the declared
    /// content type is the fallback.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let by_ext = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .and_then(|e| match e.to_ascii_lowercase().as_str() {
                "xlsx" | "xls" => Some(Self::Xlsx),
                "csv" => Some(Self::Csv),
                "txt" => Some(Self::Txt),
                _ => None,
            });
        by_ext.or_else(|| {
            let ct = content_type?.split(';').next()?.trim();
            match ct {
                MIME_XLSX | MIME_XLS => Some(Self::Xlsx),
                MIME_CSV => Some(Self::Csv),
                MIME_TXT => Some(Self::Txt),
                _ => None,
            }
        })
    }
}
