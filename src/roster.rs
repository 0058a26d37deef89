//! Formatted roster documents. Each template fixes the column set, the
//! column widths and the row heights; only the text varies per run.

use std::path::Path;

use clap::ValueEnum;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};

use crate::error::{Result, RosterError};
use crate::filter;
use crate::models::{Record, AWARD, CLASS_NAME, CREDIT_SCORE, NAME, SEQUENCE};
use crate::sheet::Cell;

pub const INPUT_SHEET: &str = filter::OUTPUT_SHEET;
pub const ROSTER_SHEET: &str = "加分名单";
pub const COLLEGE_NAME: &str = "工学院";
const FONT_NAME: &str = "微软雅黑";

/// Award ranks used by `--sort-by-award`, best first.
const AWARD_RANKS: [&str; 5] = ["一等奖", "二等奖", "三等奖", "优秀奖", "参与奖"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    /// Activities and lectures: one flat score for everyone
    Activity,
    /// Competitions: per-row award and score
    Competition,
}

#[derive(Debug)]
pub struct Column {
    pub label: &'static str,
    pub field: &'static str,
    pub width: f64,
}

#[derive(Debug)]
pub struct RowHeights {
    pub title: f64,
    pub note: f64,
    pub header: f64,
    pub body: f64,
}

#[derive(Debug)]
pub struct Template {
    pub columns: &'static [Column],
    pub heights: RowHeights,
}

const STANDARD_HEIGHTS: RowHeights = RowHeights {
    title: 69.0,
    note: 24.5,
    header: 20.0,
    body: 20.0,
};

static ACTIVITY_TEMPLATE: Template = Template {
    columns: &[
        Column { label: "序号", field: SEQUENCE, width: 4.75 },
        Column { label: "班级", field: CLASS_NAME, width: 27.0 },
        Column { label: "姓名", field: NAME, width: 8.25 },
    ],
    heights: STANDARD_HEIGHTS,
};

static COMPETITION_TEMPLATE: Template = Template {
    columns: &[
        Column { label: "序号", field: SEQUENCE, width: 9.25 },
        Column { label: "班级", field: CLASS_NAME, width: 30.0 },
        Column { label: "姓名", field: NAME, width: 17.25 },
        Column { label: "奖项", field: AWARD, width: 16.25 },
        Column { label: "加分数", field: CREDIT_SCORE, width: 7.25 },
    ],
    heights: STANDARD_HEIGHTS,
};

impl TemplateKind {
    pub fn template(self) -> &'static Template {
        match self {
            TemplateKind::Activity => &ACTIVITY_TEMPLATE,
            TemplateKind::Competition => &COMPETITION_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RosterRequest {
    pub kind: TemplateKind,
    pub semester: String,
    pub activity: String,
    pub score_type: String,
    pub score: Option<f64>,
    pub sort_by_award: bool,
}

impl RosterRequest {
    pub fn validate(&self) -> Result<()> {
        if self.kind == TemplateKind::Activity && self.score.is_none() {
            return Err(RosterError::MissingScore);
        }
        Ok(())
    }

    pub fn file_name(&self) -> String {
        format!("{}{}{}加分名单.xlsx", self.semester, COLLEGE_NAME, self.activity)
    }

    fn title(&self) -> String {
        match self.kind {
            TemplateKind::Competition => {
                format!("{}{}{}加分名单", self.semester, COLLEGE_NAME, self.activity)
            }
            TemplateKind::Activity => format!("{}{}加分名单", self.semester, self.activity),
        }
    }

    fn note(&self) -> Result<String> {
        match self.kind {
            TemplateKind::Competition => {
                Ok(format!("注：以下同学加{}，具体分数如下", self.score_type))
            }
            TemplateKind::Activity => {
                let score = self.score.ok_or(RosterError::MissingScore)?;
                Ok(format!("注：以下同学每人加{}{}分", self.score_type, score))
            }
        }
    }
}

#[derive(Debug)]
pub struct Roster {
    pub template: &'static Template,
    pub title: String,
    pub note: String,
    pub body: Vec<Vec<Cell>>,
}

impl Roster {
    pub fn headers(&self) -> Vec<&'static str> {
        self.template.columns.iter().map(|column| column.label).collect()
    }
}

fn award_rank(award: &str) -> usize {
    let award = award.trim();
    AWARD_RANKS
        .iter()
        .position(|rank| award.contains(rank))
        .unwrap_or(AWARD_RANKS.len())
}

fn sort_by_award(records: &mut [&Record]) {
    records.sort_by(|a, b| {
        award_rank(&a.award)
            .cmp(&award_rank(&b.award))
            .then_with(|| a.class_name.cmp(&b.class_name))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Lays the records out under the requested template. The index column is
/// numbered from 1 regardless of any sequence value in the data.
pub fn build(records: &[Record], request: &RosterRequest) -> Result<Roster> {
    request.validate()?;
    let template = request.kind.template();

    let mut ordered: Vec<&Record> = records.iter().collect();
    if request.sort_by_award {
        sort_by_award(&mut ordered);
    }

    let body = ordered
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            template
                .columns
                .iter()
                .map(|column| {
                    if column.field == SEQUENCE {
                        Cell::Number((idx + 1) as f64)
                    } else {
                        record.field(column.field)
                    }
                })
                .collect()
        })
        .collect();

    Ok(Roster {
        template,
        title: request.title(),
        note: request.note()?,
        body,
    })
}

fn centered(size: f64) -> Format {
    Format::new()
        .set_font_name(FONT_NAME)
        .set_font_size(size)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

pub fn render(roster: &Roster, path: &Path) -> Result<()> {
    let template = roster.template;
    let heights = &template.heights;
    let last_col = (template.columns.len() - 1) as u16;

    let title_format = centered(18.0).set_bold();
    let note_format = centered(12.0);
    let header_format = centered(11.0).set_bold();
    let body_format = centered(11.0);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(ROSTER_SHEET)?;

    worksheet.merge_range(0, 0, 0, last_col, &roster.title, &title_format)?;
    worksheet.set_row_height(0, heights.title)?;

    worksheet.merge_range(1, 0, 1, last_col, &roster.note, &note_format)?;
    worksheet.set_row_height(1, heights.note)?;

    for (col, label) in roster.headers().iter().enumerate() {
        worksheet.write_string_with_format(2, col as u16, *label, &header_format)?;
    }
    worksheet.set_row_height(2, heights.header)?;

    for (idx, row) in roster.body.iter().enumerate() {
        let row_num = idx as u32 + 3;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string_with_format(row_num, col, value, &body_format)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number_with_format(row_num, col, *value, &body_format)?;
                }
                Cell::Empty => {
                    worksheet.write_blank(row_num, col, &body_format)?;
                }
            }
        }
        worksheet.set_row_height(row_num, heights.body)?;
    }

    for (col, column) in template.columns.iter().enumerate() {
        worksheet.set_column_width(col as u16, column.width)?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use crate::sheet::read_table;

    fn request(kind: TemplateKind, score: Option<f64>) -> RosterRequest {
        RosterRequest {
            kind,
            semester: "2024-2025学年第一学期".to_string(),
            activity: "安全讲座".to_string(),
            score_type: "品德分".to_string(),
            score,
            sort_by_award: false,
        }
    }

    #[test]
    fn activity_roster_has_three_columns_and_flat_score_note() {
        let mut row = record("1班", "张三", "安全讲座");
        row.sequence = Some(42);
        let roster = build(&[row], &request(TemplateKind::Activity, Some(2.0))).unwrap();

        assert_eq!(roster.headers(), vec!["序号", "班级", "姓名"]);
        assert_eq!(roster.title, "2024-2025学年第一学期安全讲座加分名单");
        assert_eq!(roster.note, "注：以下同学每人加品德分2分");
        assert_eq!(
            roster.body,
            vec![vec![
                Cell::Number(1.0),
                Cell::Text("1班".to_string()),
                Cell::Text("张三".to_string()),
            ]]
        );
    }

    #[test]
    fn competition_roster_reads_award_and_score_per_row() {
        let mut winner = record("2班", "李四", "编程赛");
        winner.award = "一等奖".to_string();
        winner.credit_score = 4.0;
        let plain = record("1班", "张三", "编程赛");

        let roster = build(&[plain, winner], &request(TemplateKind::Competition, None)).unwrap();

        assert_eq!(roster.title, "2024-2025学年第一学期工学院安全讲座加分名单");
        assert_eq!(roster.note, "注：以下同学加品德分，具体分数如下");
        assert_eq!(roster.body.len(), 2);
        assert_eq!(roster.body[0][3], Cell::Empty);
        assert_eq!(roster.body[1][0], Cell::Number(2.0));
        assert_eq!(roster.body[1][4], Cell::Number(4.0));
    }

    #[test]
    fn activity_without_score_is_rejected() {
        let req = request(TemplateKind::Activity, None);
        assert!(matches!(req.validate(), Err(RosterError::MissingScore)));
        assert!(matches!(
            build(&[record("1班", "张三", "讲座")], &req),
            Err(RosterError::MissingScore)
        ));
        assert!(request(TemplateKind::Competition, None).validate().is_ok());
    }

    #[test]
    fn award_sort_ranks_then_class_then_name() {
        let award = |class_name: &str, name: &str, award: &str| {
            let mut r = record(class_name, name, "编程赛");
            r.award = award.to_string();
            r
        };
        let rows = vec![
            award("1班", "甲", "优秀奖"),
            award("2班", "乙", "校级一等奖"),
            award("1班", "丙", "其他"),
            award("1班", "丁", "一等奖"),
        ];
        let mut req = request(TemplateKind::Competition, None);
        req.sort_by_award = true;

        let roster = build(&rows, &req).unwrap();
        let names: Vec<String> = roster.body.iter().map(|row| row[2].text()).collect();
        assert_eq!(names, vec!["丁", "乙", "甲", "丙"]);
    }

    #[test]
    fn file_name_includes_college() {
        assert_eq!(
            request(TemplateKind::Activity, Some(1.0)).file_name(),
            "2024-2025学年第一学期工学院安全讲座加分名单.xlsx"
        );
    }

    #[test]
    fn rendered_workbook_has_title_note_header_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(TemplateKind::Activity, Some(0.5));
        let path = dir.path().join(req.file_name());
        let roster = build(&[record("1班", "张三", "安全讲座")], &req).unwrap();

        render(&roster, &path).unwrap();
        let table = read_table(&path, ROSTER_SHEET).unwrap();

        assert_eq!(table.headers[0], roster.title);
        assert_eq!(table.rows[0][0].text(), "注：以下同学每人加品德分0.5分");
        let labels: Vec<String> = table.rows[1].iter().map(Cell::text).collect();
        assert_eq!(labels, vec!["序号", "班级", "姓名"]);
        assert_eq!(table.rows[2][0].number(), Some(1.0));
        assert_eq!(table.rows[2][2].text(), "张三");
    }
}
