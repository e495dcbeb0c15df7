//! File ingestion
//!
//! Turns uploaded bytes into a [`Grid`]. The format is chosen from the file
//! name: `.xlsx`/`.xls` go through calamine (first worksheet only), `.csv`
//! through the csv reader without a header row.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Utc;
use csv::ReaderBuilder;
use tracing::{debug, info};
use uuid::Uuid;

use crate::extract::extract_fields;
use crate::models::{Cell, FileData, Grid};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    Csv,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> AppResult<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(FileKind::Spreadsheet)
        } else if lower.ends_with(".csv") {
            Ok(FileKind::Csv)
        } else {
            Err(AppError::UnsupportedFile(file_name.to_string()))
        }
    }
}

/// Parse raw file content into a grid.
pub fn parse_bytes(file_name: &str, content: &[u8]) -> AppResult<Grid> {
    let grid = match FileKind::from_file_name(file_name)? {
        FileKind::Spreadsheet => parse_spreadsheet(content)?,
        FileKind::Csv => parse_csv(content)?,
    };
    debug!(file_name, rows = grid.len(), "Parsed file");
    Ok(grid)
}

/// Build the FileData for an upload: parse, then identify fields.
pub fn process_file(file_name: &str, content: &[u8]) -> AppResult<FileData> {
    let raw_data = parse_bytes(file_name, content)?;
    Ok(build_file_data(file_name, raw_data))
}

/// Same as [`process_file`] but off the async executor.
pub async fn process_file_blocking(file_name: String, content: Vec<u8>) -> AppResult<FileData> {
    tokio::task::spawn_blocking(move || process_file(&file_name, &content))
        .await
        .map_err(|e| AppError::Internal(format!("File processing task failed: {}", e)))?
}

pub fn build_file_data(file_name: &str, raw_data: Grid) -> FileData {
    let fields = extract_fields(&raw_data);
    info!(
        file_name,
        rows = raw_data.len(),
        names = fields.names.len(),
        dates = fields.dates.len(),
        times = fields.times.len(),
        "Identified fields"
    );

    FileData {
        id: Uuid::new_v4(),
        file_name: file_name.to_string(),
        content_type: mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
        uploaded_at: Utc::now(),
        names: fields.names,
        dates: fields.dates,
        times: fields.times,
        raw_data,
        ai_analysis: None,
    }
}

/// Fields that are not valid UTF-8 (e.g. Windows-1252 exports) keep their
/// readable parts, with U+FFFD in place of the bad bytes.
pub fn parse_csv(content: &[u8]) -> AppResult<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut grid = Grid::new();
    for record in rdr.byte_records() {
        let record = record.map_err(|e| AppError::Parse(e.to_string()))?;
        grid.push(
            record
                .iter()
                .map(|field| Cell::Text(String::from_utf8_lossy(field).into_owned()))
                .collect(),
        );
    }
    Ok(grid)
}

pub fn parse_spreadsheet(content: &[u8]) -> AppResult<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))
        .map_err(|e| AppError::Parse(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Parse("Workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::Parse(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        // Excel stores dates as serial day numbers
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
        Data::Empty => Cell::Empty,
    }
}
