use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::config::FilterConfig;
use crate::models::Record;
use crate::parser::ParseOutcome;

const RULE_WIDTH: usize = 60;
const TOP_CLASSES: usize = 10;

/// Record counts per class, largest first. Ties fall back to class name.
pub fn summarize_by_class(records: &[Record]) -> Vec<(String, usize)> {
    let mut map: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *map.entry(record.class_name.as_str()).or_insert(0) += 1;
    }

    let mut summaries: Vec<(String, usize)> = map
        .into_iter()
        .map(|(class_name, count)| (class_name.to_string(), count))
        .collect();
    summaries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summaries
}

/// Record counts per activity type, in type order.
pub fn summarize_by_activity_type(records: &[Record]) -> Vec<(String, usize)> {
    let mut map: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *map.entry(record.activity_type.as_str()).or_insert(0) += 1;
    }
    map.into_iter()
        .map(|(activity_type, count)| (activity_type.to_string(), count))
        .collect()
}

fn write_rule(output: &mut String) {
    let _ = writeln!(output, "{}", "=".repeat(RULE_WIDTH));
}

fn write_breakdowns(output: &mut String, records: &[Record], class_heading: &str) {
    let _ = writeln!(output, "{class_heading}");
    for (class_name, count) in summarize_by_class(records).iter().take(TOP_CLASSES) {
        let _ = writeln!(output, "  {class_name}: {count}人");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "活动类型分布:");
    for (activity_type, count) in summarize_by_activity_type(records) {
        let _ = writeln!(output, "  {activity_type}: {count}人");
    }
    let _ = writeln!(output);
}

pub fn build_parse_report(outcome: &ParseOutcome, generated_at: NaiveDateTime) -> String {
    let mut output = String::new();

    write_rule(&mut output);
    let _ = writeln!(output, "数据解析与考勤验证报告");
    write_rule(&mut output);
    let _ = writeln!(output, "生成时间: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(output);

    let _ = writeln!(output, "总数据量: {}", outcome.total_count());
    let _ = writeln!(output, "有效数据: {}", outcome.valid_count());
    let _ = writeln!(output, "无效数据: {}", outcome.invalid.len());
    let _ = writeln!(output, "重复数据（已去除）: {}", outcome.duplicates);
    let _ = writeln!(output, "已考勤（可加分）: {}", outcome.attended.len());
    let _ = writeln!(output, "未考勤（黑名单）: {}", outcome.unattended.len());
    let _ = writeln!(output);

    if !outcome.attended.is_empty() {
        write_breakdowns(&mut output, &outcome.attended, "各班级已考勤人数统计（前10名）:");
    }

    if let Some(rate) = outcome.attendance_rate() {
        let _ = writeln!(output, "考勤率: {rate:.2}%");
    }

    output
}

pub fn build_filter_log(original_count: usize, filtered: &[Record], config: &FilterConfig) -> String {
    let mut output = String::new();

    write_rule(&mut output);
    let _ = writeln!(output, "数据筛选日志");
    write_rule(&mut output);
    let _ = writeln!(output, "原始数据量: {original_count}");
    let _ = writeln!(output, "筛选后数据量: {}", filtered.len());
    let _ = writeln!(output, "筛选条件:");
    for (key, value) in config.active_conditions() {
        let _ = writeln!(output, "  {key}: {value}");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "筛选结果统计:");
    if filtered.is_empty() {
        let _ = writeln!(output, "无符合条件的数据");
    } else {
        write_breakdowns(&mut output, filtered, "各班级人数（前10名）:");
    }

    output
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct terms, activity types and classes, for picking filter values.
pub fn build_facets(records: &[Record]) -> String {
    let mut output = String::new();
    let facets = [
        ("学年学期", distinct(records.iter().map(|r| r.semester.as_str()))),
        ("活动类型", distinct(records.iter().map(|r| r.activity_type.as_str()))),
        ("行政班级", distinct(records.iter().map(|r| r.class_name.as_str()))),
    ];

    for (heading, values) in facets {
        let _ = writeln!(output, "{heading} ({}):", values.len());
        for value in values {
            let _ = writeln!(output, "  {value}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::models::fixtures::record;
    use crate::parser;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    #[test]
    fn class_summary_orders_by_count_then_name() {
        let records = vec![
            record("2班", "甲", "讲座"),
            record("1班", "乙", "讲座"),
            record("3班", "丙", "讲座"),
            record("3班", "丁", "讲座"),
        ];
        assert_eq!(
            summarize_by_class(&records),
            vec![
                ("3班".to_string(), 2),
                ("1班".to_string(), 1),
                ("2班".to_string(), 1),
            ]
        );
    }

    #[test]
    fn class_summary_is_capped_at_ten_in_report() {
        let records: Vec<Record> = (0..12)
            .map(|i| record(&format!("{i:02}班"), "甲", "讲座"))
            .collect();
        let outcome = parser::process(records, &ParserConfig::default());
        let report = build_parse_report(&outcome, timestamp());

        assert!(report.contains("  09班: 1人"));
        assert!(!report.contains("  10班: 1人"));
    }

    #[test]
    fn parse_report_includes_counts_and_rate() {
        let mut absent = record("1班", "李四", "讲座");
        absent.remarks = "无关备注".to_string();
        let outcome = parser::process(
            vec![record("1班", "张三", "讲座"), absent, record("1班", "", "讲座")],
            &ParserConfig::default(),
        );

        let report = build_parse_report(&outcome, timestamp());
        assert!(report.starts_with(&"=".repeat(60)));
        assert!(report.contains("生成时间: 2024-09-01 08:30:00"));
        assert!(report.contains("总数据量: 3"));
        assert!(report.contains("有效数据: 2"));
        assert!(report.contains("无效数据: 1"));
        assert!(report.contains("讲座: 1人"));
        assert!(report.contains("考勤率: 50.00%"));
    }

    #[test]
    fn empty_parse_report_omits_rate() {
        let report = build_parse_report(&ParseOutcome::default(), timestamp());
        assert!(report.contains("总数据量: 0"));
        assert!(!report.contains("考勤率"));
    }

    #[test]
    fn filter_log_lists_active_conditions() {
        let config = FilterConfig {
            classes: Some(vec!["1班".to_string()]),
            use_regex: Some(true),
            ..FilterConfig::default()
        };
        let log = build_filter_log(5, &[record("1班", "张三", "讲座")], &config);

        assert!(log.contains("原始数据量: 5"));
        assert!(log.contains("筛选后数据量: 1"));
        assert!(log.contains("  classes: 1班"));
        assert!(!log.contains("useRegex"));
        assert!(log.contains("  1班: 1人"));
    }

    #[test]
    fn facets_list_distinct_sorted_values() {
        let mut lecture = record("2班", "乙", "讲座");
        lecture.activity_type = String::new();
        let records = vec![record("2班", "甲", "讲座"), record("1班", "丙", "讲座"), lecture];

        let facets = build_facets(&records);
        assert!(facets.contains("学年学期 (1):\n  2024-2025学年第一学期\n"));
        assert!(facets.contains("活动类型 (1):\n  讲座\n"));
        assert!(facets.contains("行政班级 (2):\n  1班\n  2班\n"));
    }
}
