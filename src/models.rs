use crate::sheet::{Cell, Table};

pub const SEQUENCE: &str = "序号";
pub const SEMESTER: &str = "学年学期";
pub const HOSTED_BY_COLLEGE: &str = "是否为工学院举办";
pub const CLASS_NAME: &str = "行政班级";
pub const STUDENT_ID: &str = "学号";
pub const NAME: &str = "姓名";
pub const ACTIVITY_TYPE: &str = "活动类型";
pub const ACTIVITY_NAME: &str = "活动名称";
pub const SCORE_TYPE: &str = "加分类型";
pub const CREDIT_SCORE: &str = "加分分数";
pub const AWARD: &str = "奖项";
pub const DEPARTMENT: &str = "部门";
pub const OWNER: &str = "负责人";
pub const CONTACT_PHONE: &str = "联系电话";
pub const REMARKS: &str = "备注";
pub const UNATTENDED_REASON: &str = "未考勤原因";

/// Columns every source sheet must carry, in output order.
pub const REQUIRED_FIELDS: [&str; 15] = [
    SEQUENCE,
    SEMESTER,
    HOSTED_BY_COLLEGE,
    CLASS_NAME,
    STUDENT_ID,
    NAME,
    ACTIVITY_TYPE,
    ACTIVITY_NAME,
    SCORE_TYPE,
    CREDIT_SCORE,
    AWARD,
    DEPARTMENT,
    OWNER,
    CONTACT_PHONE,
    REMARKS,
];

/// Marker in the hosted flag for activities run by the college itself.
pub const HOSTED_MARKER: &str = "是";

/// Text pandas produces for absent values; treated the same as blank.
pub const MISSING_PLACEHOLDER: &str = "nan";

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub sequence: Option<i64>,
    pub semester: String,
    pub hosted_by_college: String,
    pub class_name: String,
    pub student_id: String,
    pub name: String,
    pub activity_type: String,
    pub activity_name: String,
    pub score_type: String,
    pub credit_score: f64,
    pub award: String,
    pub department: String,
    pub owner: String,
    pub contact_phone: String,
    pub remarks: String,
}

impl Record {
    /// Builds a record from one row of a table that carries every
    /// required column. Missing columns read as blank.
    pub fn from_row(table: &Table, row: &[Cell]) -> Self {
        let cell = |field: &str| {
            table
                .column_index(field)
                .and_then(|idx| row.get(idx))
                .cloned()
                .unwrap_or(Cell::Empty)
        };
        let text = |field: &str| cell(field).text();

        Record {
            sequence: cell(SEQUENCE).number().map(|value| value as i64),
            semester: text(SEMESTER),
            hosted_by_college: text(HOSTED_BY_COLLEGE),
            class_name: text(CLASS_NAME),
            student_id: text(STUDENT_ID),
            name: text(NAME),
            activity_type: text(ACTIVITY_TYPE),
            activity_name: text(ACTIVITY_NAME),
            score_type: text(SCORE_TYPE),
            credit_score: cell(CREDIT_SCORE).number().unwrap_or(0.0),
            award: text(AWARD),
            department: text(DEPARTMENT),
            owner: text(OWNER),
            contact_phone: text(CONTACT_PHONE),
            remarks: text(REMARKS),
        }
    }

    pub fn from_table(table: &Table) -> Vec<Self> {
        table
            .rows
            .iter()
            .map(|row| Record::from_row(table, row))
            .collect()
    }

    /// Trims the identity fields used for validity checks and deduplication.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.activity_name = self.activity_name.trim().to_string();
        self.class_name = self.class_name.trim().to_string();
        self.student_id = self.student_id.trim().to_string();
        self
    }

    pub fn is_valid(&self) -> bool {
        let present = |value: &str| !value.is_empty() && value != MISSING_PLACEHOLDER;
        present(&self.name) && present(&self.activity_name)
    }

    pub fn dedupe_key(&self) -> (String, String, String) {
        (
            self.class_name.clone(),
            self.name.clone(),
            self.activity_name.clone(),
        )
    }

    /// Looks a value up by its column header. Unknown columns are blank.
    pub fn field(&self, column: &str) -> Cell {
        let text = |value: &str| {
            if value.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(value.to_string())
            }
        };

        match column {
            SEQUENCE => self
                .sequence
                .map(|value| Cell::Number(value as f64))
                .unwrap_or(Cell::Empty),
            SEMESTER => text(&self.semester),
            HOSTED_BY_COLLEGE => text(&self.hosted_by_college),
            CLASS_NAME => text(&self.class_name),
            STUDENT_ID => text(&self.student_id),
            NAME => text(&self.name),
            ACTIVITY_TYPE => text(&self.activity_type),
            ACTIVITY_NAME => text(&self.activity_name),
            SCORE_TYPE => text(&self.score_type),
            CREDIT_SCORE => Cell::Number(self.credit_score),
            AWARD => text(&self.award),
            DEPARTMENT => text(&self.department),
            OWNER => text(&self.owner),
            CONTACT_PHONE => text(&self.contact_phone),
            REMARKS => text(&self.remarks),
            _ => Cell::Empty,
        }
    }
}

pub fn records_to_table(records: &[Record]) -> Table {
    Table {
        headers: REQUIRED_FIELDS.iter().map(|field| field.to_string()).collect(),
        rows: records
            .iter()
            .map(|record| REQUIRED_FIELDS.iter().map(|field| record.field(field)).collect())
            .collect(),
    }
}

/// A valid record that carried no attendance evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct BlacklistEntry {
    pub record: Record,
    pub reason: String,
}

pub fn blacklist_to_table(entries: &[BlacklistEntry]) -> Table {
    let text = |value: &str| Cell::Text(value.to_string());

    Table {
        headers: [CLASS_NAME, NAME, STUDENT_ID, UNATTENDED_REASON]
            .iter()
            .map(|field| field.to_string())
            .collect(),
        rows: entries
            .iter()
            .map(|entry| {
                vec![
                    text(&entry.record.class_name),
                    text(&entry.record.name),
                    text(&entry.record.student_id),
                    text(&entry.reason),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Record;

    pub fn record(class_name: &str, name: &str, activity_name: &str) -> Record {
        Record {
            sequence: Some(1),
            semester: "2024-2025学年第一学期".to_string(),
            hosted_by_college: "是".to_string(),
            class_name: class_name.to_string(),
            student_id: "2021001".to_string(),
            name: name.to_string(),
            activity_type: "讲座".to_string(),
            activity_name: activity_name.to_string(),
            score_type: "学业分".to_string(),
            credit_score: 1.0,
            award: String::new(),
            department: "学生会".to_string(),
            owner: "王老师".to_string(),
            contact_phone: "13800000000".to_string(),
            remarks: "已考勤".to_string(),
        }
    }
}
