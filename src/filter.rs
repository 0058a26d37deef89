use std::collections::HashSet;

use regex::Regex;

use crate::config::FilterConfig;
use crate::error::Result;
use crate::models::{Record, HOSTED_MARKER};
use crate::parser;

pub const INPUT_SHEET: &str = parser::ATTENDED_SHEET;
pub const OUTPUT_SHEET: &str = "筛选结果";

enum ClassMatcher {
    Exact(HashSet<String>),
    /// Alternation of the configured patterns, anchored to the whole field.
    Pattern(Regex),
}

impl ClassMatcher {
    fn new(classes: &[String], use_regex: bool) -> Result<Self> {
        if use_regex {
            let pattern = format!("^(?:{})$", classes.join("|"));
            Ok(ClassMatcher::Pattern(Regex::new(&pattern)?))
        } else {
            Ok(ClassMatcher::Exact(classes.iter().cloned().collect()))
        }
    }

    fn matches(&self, class_name: &str) -> bool {
        match self {
            ClassMatcher::Exact(classes) => classes.contains(class_name),
            ClassMatcher::Pattern(regex) => regex.is_match(class_name),
        }
    }
}

pub struct RecordFilter<'a> {
    config: &'a FilterConfig,
    activity_types: Option<HashSet<&'a str>>,
    activity_keyword: Option<String>,
    classes: Option<ClassMatcher>,
}

impl<'a> RecordFilter<'a> {
    pub fn new(config: &'a FilterConfig) -> Result<Self> {
        let activity_types = config
            .activity_types
            .as_ref()
            .filter(|types| !types.is_empty())
            .map(|types| types.iter().map(String::as_str).collect());
        let activity_keyword = config
            .activity_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(str::to_lowercase);
        let classes = match config.classes.as_ref().filter(|c| !c.is_empty()) {
            Some(classes) => Some(ClassMatcher::new(classes, config.use_regex())?),
            None => None,
        };

        Ok(Self {
            config,
            activity_types,
            activity_keyword,
            classes,
        })
    }

    pub fn accepts(&self, record: &Record) -> bool {
        let config = self.config;

        if let Some(semester) = config.semester.as_deref().filter(|s| !s.is_empty()) {
            if record.semester != semester {
                return false;
            }
        }
        if let Some(types) = &self.activity_types {
            if !types.contains(record.activity_type.as_str()) {
                return false;
            }
        }
        if let Some(keyword) = &self.activity_keyword {
            if !record.activity_name.to_lowercase().contains(keyword.as_str()) {
                return false;
            }
        }
        if let Some(score_type) = config.score_type.as_deref().filter(|s| !s.is_empty()) {
            if record.score_type != score_type {
                return false;
            }
        }
        if config.min_score.is_some_and(|min| record.credit_score < min) {
            return false;
        }
        if config.max_score.is_some_and(|max| record.credit_score > max) {
            return false;
        }
        if let Some(classes) = &self.classes {
            if !classes.matches(&record.class_name) {
                return false;
            }
        }
        if config.college_only() && record.hosted_by_college != HOSTED_MARKER {
            return false;
        }
        true
    }
}

pub fn apply(records: &[Record], config: &FilterConfig) -> Result<Vec<Record>> {
    let filter = RecordFilter::new(config)?;
    let mut filtered: Vec<Record> = records
        .iter()
        .filter(|record| filter.accepts(record))
        .cloned()
        .collect();

    if config.sort_by_class() {
        filtered.sort_by(|a, b| {
            a.class_name
                .cmp(&b.class_name)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    Ok(filtered)
}
