use serde::Serialize;
use sqlx::FromRow;

/// Student record in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Student {
    pub school_id: String,
    pub name: String,
    pub section: String,
    pub badge_code: Option<String>, // set once at badge registration
}

/// Student data shown on the kiosk after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentInfo {
    pub school_id: String,
    pub name: String,
    pub section: String,
}

impl From<Student> for StudentInfo {
    fn from(s: Student) -> Self {
        Self {
            school_id: s.school_id,
            name: s.name,
            section: s.section,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub school_id: String,
    pub name: String,
    pub section: String,
}
