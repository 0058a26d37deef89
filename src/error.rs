use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("{} is missing required columns: {}", .path.display(), .fields.join(", "))]
    MissingFields { path: PathBuf, fields: Vec<String> },

    #[error("{} has no sheet named {sheet}", .path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("{} is empty", .0.display())]
    EmptySheet(PathBuf),

    #[error("input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("no input file was parsed successfully")]
    NoValidInput,

    #[error("config file does not exist: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("the activity template requires --score")]
    MissingScore,

    #[error("invalid class pattern: {0}")]
    InvalidClassPattern(#[from] regex::Error),

    #[error("workbook read failed: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON config is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;
