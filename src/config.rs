use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RosterError};

pub const DEFAULT_KEYWORDS: [&str; 3] = ["已考勤", "到场", "参与"];

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

/// Attendance settings for the parse stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Remarks containing any of these are unattended even when they also
    /// carry an attendance keyword.
    #[serde(default)]
    pub absence_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            absence_keywords: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Reads the config if the file exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using default keywords");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Declarative record filter. Absent, null, empty or false values impose
/// no constraint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub semester: Option<String>,
    pub activity_types: Option<Vec<String>>,
    pub activity_name: Option<String>,
    pub score_type: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub classes: Option<Vec<String>>,
    pub use_regex: Option<bool>,
    pub include_other_college: Option<bool>,
    pub sort_by_class: Option<bool>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RosterError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn use_regex(&self) -> bool {
        self.use_regex.unwrap_or(false)
    }

    pub fn sort_by_class(&self) -> bool {
        self.sort_by_class.unwrap_or(true)
    }

    pub fn college_only(&self) -> bool {
        self.include_other_college == Some(false)
    }

    /// Conditions worth reporting: truthy values, leaving out the toggles
    /// that only change how other conditions apply.
    pub fn active_conditions(&self) -> Vec<(&'static str, String)> {
        let mut active = Vec::new();
        let mut text = |key: &'static str, value: &Option<String>| {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                active.push((key, value.to_string()));
            }
        };
        text("semester", &self.semester);
        text("activityName", &self.activity_name);
        text("scoreType", &self.score_type);

        let lists = [
            ("activityTypes", &self.activity_types),
            ("classes", &self.classes),
        ];
        for (key, values) in lists {
            if let Some(values) = values.as_ref().filter(|v| !v.is_empty()) {
                active.push((key, values.join(", ")));
            }
        }

        let bounds = [("minScore", self.min_score), ("maxScore", self.max_score)];
        for (key, bound) in bounds {
            if let Some(bound) = bound.filter(|b| *b != 0.0) {
                active.push((key, bound.to_string()));
            }
        }

        if self.include_other_college == Some(true) {
            active.push(("includeOtherCollege", "true".to_string()));
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_config_defaults_missing_keys() {
        let config: ParserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ParserConfig::default());

        let config: ParserConfig =
            serde_json::from_str(r#"{"keywords": ["签到"], "absenceKeywords": ["请假"]}"#).unwrap();
        assert_eq!(config.keywords, vec!["签到".to_string()]);
        assert_eq!(config.absence_keywords, vec!["请假".to_string()]);
    }

    #[test]
    fn missing_parser_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ParserConfig::load_or_default(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.keywords.len(), 3);
    }

    #[test]
    fn missing_filter_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilterConfig::load(&dir.path().join("filter.json")).unwrap_err();
        assert!(matches!(err, RosterError::ConfigNotFound(_)));
    }

    #[test]
    fn filter_config_accepts_nulls_and_camel_case() {
        let config: FilterConfig = serde_json::from_str(
            r#"{"semester": null, "minScore": 2, "maxScore": 5, "classes": ["1班","2班"], "useRegex": false}"#,
        )
        .unwrap();
        assert_eq!(config.semester, None);
        assert_eq!(config.min_score, Some(2.0));
        assert!(!config.use_regex());
        assert!(config.sort_by_class());
        assert!(!config.college_only());
    }

    #[test]
    fn active_conditions_skip_falsy_and_cosmetic_keys() {
        let config = FilterConfig {
            semester: Some(String::new()),
            activity_types: Some(vec!["讲座".to_string()]),
            min_score: Some(0.0),
            max_score: Some(5.0),
            classes: Some(vec!["1班".to_string(), "2班".to_string()]),
            use_regex: Some(true),
            sort_by_class: Some(false),
            ..FilterConfig::default()
        };

        assert_eq!(
            config.active_conditions(),
            vec![
                ("activityTypes", "讲座".to_string()),
                ("classes", "1班, 2班".to_string()),
                ("maxScore", "5".to_string()),
            ]
        );
    }
}
