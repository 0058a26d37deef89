//! Plain tabular I/O. Workbooks are read with calamine, CSV sources with the
//! csv crate, and every sheet this tool produces is written with
//! rust_xlsxwriter. Styled roster output lives in `roster`.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;

use crate::error::{Result, RosterError};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Text form of the cell. Integral numbers print without a fraction.
    pub fn text(&self) -> String {
        match self {
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => value.to_string(),
            Cell::Empty => String::new(),
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) if value.is_finite() => Some(*value),
            Cell::Text(value) => value.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Float(value) => Cell::Number(*value),
            Data::String(value) => Cell::Text(value.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Reads the named sheet of a workbook, or the whole file for CSV sources.
/// The first row is the header; fully blank rows are dropped.
pub fn read_table(path: &Path, sheet: &str) -> Result<Table> {
    let mut rows = if is_csv(path) {
        read_csv_rows(path)?
    } else {
        read_workbook_rows(path, sheet)?
    };

    if rows.is_empty() {
        return Err(RosterError::EmptySheet(path.to_path_buf()));
    }

    let headers = rows
        .remove(0)
        .iter()
        .map(|cell| cell.text().trim().to_string())
        .collect();
    rows.retain(|row| !row.iter().all(Cell::is_blank));

    Ok(Table { headers, rows })
}

fn read_workbook_rows(path: &Path, sheet: &str) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(RosterError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from_data).collect())
        .collect())
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }
    Ok(rows)
}

pub fn write_table(path: &Path, sheet: &str, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row_num, col as u16, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col as u16, *value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
