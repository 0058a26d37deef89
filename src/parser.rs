use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ParserConfig;
use crate::error::{Result, RosterError};
use crate::models::{
    blacklist_to_table, records_to_table, BlacklistEntry, Record, REQUIRED_FIELDS,
};
use crate::sheet;

pub const SOURCE_SHEET: &str = "数据源";
pub const ATTENDED_SHEET: &str = "已考勤数据";
pub const BLACKLIST_SHEET: &str = "黑名单";
pub const NO_KEYWORD_REASON: &str = "备注中未找到考勤关键词";

const SOURCE_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "ods", "csv"];

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub attended: Vec<Record>,
    pub unattended: Vec<BlacklistEntry>,
    pub invalid: Vec<Record>,
    pub duplicates: usize,
}

impl ParseOutcome {
    pub fn valid_count(&self) -> usize {
        self.attended.len() + self.unattended.len()
    }

    pub fn total_count(&self) -> usize {
        self.valid_count() + self.invalid.len()
    }

    /// Attended share of valid records, in percent.
    pub fn attendance_rate(&self) -> Option<f64> {
        let valid = self.valid_count();
        if valid == 0 {
            None
        } else {
            Some(self.attended.len() as f64 / valid as f64 * 100.0)
        }
    }
}

pub fn collect_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(RosterError::InputNotFound(input.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SOURCE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if path.is_file() && supported {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// Reads the named sheet into records. Every stage expects the full
/// column set, so a sheet missing any required column is rejected.
pub fn load_records(path: &Path, sheet_name: &str) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(RosterError::InputNotFound(path.to_path_buf()));
    }
    let table = sheet::read_table(path, sheet_name)?;
    let missing = table.missing_columns(&REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(RosterError::MissingFields {
            path: path.to_path_buf(),
            fields: missing,
        });
    }
    Ok(Record::from_table(&table))
}

pub fn load_source(path: &Path) -> Result<Vec<Record>> {
    load_records(path, SOURCE_SHEET)
}

/// Loads every source in order, skipping the ones that fail. Fails only
/// when nothing could be loaded.
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<Record>> {
    let mut combined = Vec::new();
    let mut loaded = 0usize;

    for path in paths {
        match load_source(path) {
            Ok(records) => {
                tracing::info!(path = %path.display(), rows = records.len(), "parsed source");
                combined.extend(records);
                loaded += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping source");
            }
        }
    }

    if loaded == 0 {
        return Err(RosterError::NoValidInput);
    }
    Ok(combined)
}

pub fn split_valid(records: Vec<Record>) -> (Vec<Record>, Vec<Record>) {
    records
        .into_iter()
        .map(Record::normalized)
        .partition(Record::is_valid)
}

/// Keeps the first record per (class, name, activity). Returns the kept
/// records and the number dropped.
pub fn dedupe(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut seen = HashSet::new();
    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(record.dedupe_key()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn contains_any(remarks: &str, keywords: &[String]) -> bool {
    let remarks = remarks.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| remarks.contains(&keyword.to_lowercase()))
}

/// Reason a remark fails attendance, or `None` when it counts as attended.
pub fn unattended_reason(remarks: &str, config: &ParserConfig) -> Option<String> {
    if contains_any(remarks, &config.absence_keywords) {
        return Some(format!("备注中包含缺勤信息：{}", remarks.trim()));
    }
    if contains_any(remarks, &config.keywords) {
        None
    } else {
        Some(NO_KEYWORD_REASON.to_string())
    }
}

pub fn classify(records: Vec<Record>, config: &ParserConfig) -> (Vec<Record>, Vec<BlacklistEntry>) {
    let mut attended = Vec::new();
    let mut unattended = Vec::new();

    for record in records {
        match unattended_reason(&record.remarks, config) {
            None => attended.push(record),
            Some(reason) => unattended.push(BlacklistEntry { record, reason }),
        }
    }

    (attended, unattended)
}

pub fn process(records: Vec<Record>, config: &ParserConfig) -> ParseOutcome {
    let (valid, invalid) = split_valid(records);
    let (unique, duplicates) = dedupe(valid);
    let (attended, unattended) = classify(unique, config);

    ParseOutcome {
        attended,
        unattended,
        invalid,
        duplicates,
    }
}

#[derive(Debug)]
pub struct WrittenOutputs {
    pub parsed: PathBuf,
    pub blacklist: Option<PathBuf>,
}

/// Writes the attended sheet, plus the blacklist when anyone is on it.
pub fn write_outputs(outcome: &ParseOutcome, dir: &Path) -> Result<WrittenOutputs> {
    let parsed = dir.join("parsed_data.xlsx");
    sheet::write_table(&parsed, ATTENDED_SHEET, &records_to_table(&outcome.attended))?;

    let blacklist = if outcome.unattended.is_empty() {
        None
    } else {
        let path = dir.join("blacklist.xlsx");
        sheet::write_table(&path, BLACKLIST_SHEET, &blacklist_to_table(&outcome.unattended))?;
        Some(path)
    };

    Ok(WrittenOutputs { parsed, blacklist })
}
