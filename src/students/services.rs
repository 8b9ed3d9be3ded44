use tracing::info;

use super::dto::CreateStudentRequest;
use crate::{
    error::{require, Result},
    state::AppState,
    students::repo_types::{NewStudent, Student},
};

pub async fn create_student(st: &AppState, req: CreateStudentRequest) -> Result<Student> {
    require("schoolId", &req.school_id)?;
    require("name", &req.name)?;
    require("section", &req.section)?;

    let new = NewStudent {
        school_id: req.school_id.trim().to_string(),
        name: req.name.trim().to_string(),
        section: req.section.trim().to_string(),
    };
    let student = st.store.create_student(&new).await?;
    info!(student_id = %student.school_id, "student added");
    Ok(student)
}

pub async fn register_badge(st: &AppState, school_id: &str, badge_code: &str) -> Result<Student> {
    require("badgeCode", badge_code)?;
    let student = st
        .store
        .register_badge(school_id.trim(), badge_code.trim())
        .await?;
    info!(student_id = %student.school_id, "badge registered");
    Ok(student)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, test_support::state_at};
    use time::macros::datetime;

    fn req(id: &str, name: &str, section: &str) -> CreateStudentRequest {
        CreateStudentRequest {
            school_id: id.into(),
            name: name.into(),
            section: section.into(),
        }
    }

    #[tokio::test]
    async fn create_trims_and_validates() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        let s = create_student(&st, req(" S1 ", " Cruz, Ana ", "10-A")).await.unwrap();
        assert_eq!(s.school_id, "S1");
        assert_eq!(s.name, "Cruz, Ana");
        assert!(s.badge_code.is_none());

        assert!(matches!(
            create_student(&st, req("S2", "", "10-A")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn badge_is_trimmed_and_required() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        create_student(&st, req("S1", "Cruz", "10-A")).await.unwrap();

        assert!(matches!(
            register_badge(&st, "S1", "  ").await,
            Err(AppError::Validation(_))
        ));
        let s = register_badge(&st, "S1", " 0012345678 ").await.unwrap();
        assert_eq!(s.badge_code.as_deref(), Some("0012345678"));
    }
}
