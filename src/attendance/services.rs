use bytes::Bytes;
use serde::Serialize;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

use crate::{
    attendance::repo_types::{AttendanceStatus, Period},
    config::CutoffDate,
    error::{AppError, Result},
    sessions::repo_types::Session,
    signatures,
    state::AppState,
    students::repo_types::{Student, StudentInfo},
};

/// Result of a scan or signature submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    NotFound,
    SignatureRequired {
        student: StudentInfo,
    },
    AlreadyMarked {
        student: StudentInfo,
        status: AttendanceStatus,
    },
    Recorded {
        student: StudentInfo,
        status: AttendanceStatus,
    },
}

/// `Late` when `now` is strictly past the period's late cutoff, at whole-second
/// resolution. The cutoff is placed on today's date or on the session's
/// publish date depending on `cutoff_date`.
pub fn classify(
    now: OffsetDateTime,
    session: &Session,
    period: Period,
    cutoff_date: CutoffDate,
) -> AttendanceStatus {
    let now = now - Duration::nanoseconds(i64::from(now.nanosecond()));
    let date = match cutoff_date {
        CutoffDate::Today => now.date(),
        CutoffDate::Session => session.publish_date,
    };
    let cutoff = PrimitiveDateTime::new(date, session.window(period).late_cutoff)
        .assume_offset(now.offset());

    if now > cutoff {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

pub async fn classify_and_record(
    st: &AppState,
    badge_or_manual_id: &str,
    session_id: &str,
    period: Period,
) -> Result<ScanOutcome> {
    let badge = badge_or_manual_id.trim();
    if badge.is_empty() {
        return Err(AppError::validation("badge or id is required"));
    }

    let Some(student) = st.store.find_by_badge(badge).await? else {
        info!(%session_id, %period, "scan: badge not registered");
        return Ok(ScanOutcome::NotFound);
    };

    if !signatures::has_signature(st, &student.school_id).await? {
        info!(student_id = %student.school_id, %session_id, %period, "scan: signature required");
        return Ok(ScanOutcome::SignatureRequired {
            student: student.into(),
        });
    }

    mark_attendance(st, student, session_id, period).await
}

/// Uploads the signature, then continues the interrupted scan. The upload and
/// the status write are independent: a failed write leaves the signature in
/// place and a re-scan completes the flow.
pub async fn record_signature_and_attend(
    st: &AppState,
    student_id: &str,
    session_id: &str,
    period: Period,
    image: Bytes,
) -> Result<ScanOutcome> {
    let Some(student) = st.store.find_student(student_id.trim()).await? else {
        info!(%student_id, %session_id, %period, "signature: unknown student");
        return Ok(ScanOutcome::NotFound);
    };

    signatures::store_signature(st, &student.school_id, image).await?;
    debug!(student_id = %student.school_id, "signature stored");

    mark_attendance(st, student, session_id, period).await
}

async fn mark_attendance(
    st: &AppState,
    student: Student,
    session_id: &str,
    period: Period,
) -> Result<ScanOutcome> {
    let Some(record) = st.store.find_record(session_id, &student.school_id).await? else {
        info!(student_id = %student.school_id, %session_id, %period, "scan: no attendance record");
        return Ok(ScanOutcome::NotFound);
    };

    let current = record.statuses.get(period);
    if current.is_marked() {
        info!(student_id = %student.school_id, %session_id, %period, status = current.as_str(), "scan: already marked");
        return Ok(ScanOutcome::AlreadyMarked {
            student: student.into(),
            status: current,
        });
    }

    let Some(session) = st.store.get_session(session_id).await? else {
        return Ok(ScanOutcome::NotFound);
    };

    let status = classify(
        st.clock.now(),
        &session,
        period,
        st.config.attendance.cutoff_date,
    );

    let written = st
        .store
        .mark_period(session_id, &student.school_id, period, status)
        .await?;

    if !written {
        // Another scan marked this period between our read and write.
        let stored = st
            .store
            .find_record(session_id, &student.school_id)
            .await?
            .map(|r| r.statuses.get(period))
            .unwrap_or(status);
        info!(student_id = %student.school_id, %session_id, %period, status = stored.as_str(), "scan: marked concurrently");
        return Ok(ScanOutcome::AlreadyMarked {
            student: student.into(),
            status: stored,
        });
    }

    info!(student_id = %student.school_id, %session_id, %period, status = status.as_str(), "attendance recorded");
    Ok(ScanOutcome::Recorded {
        student: student.into(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CutoffDate,
        test_support::{new_student, sample_session, state_at, state_with},
    };
    use time::macros::datetime;

    async fn seed(st: &AppState) {
        st.store
            .create_student(&new_student("S1", "Cruz"))
            .await
            .unwrap();
        st.store.register_badge("S1", "RF-1").await.unwrap();
        st.store
            .create_student(&new_student("S2", "Abad"))
            .await
            .unwrap();
        st.store.create_session(&sample_session("W1")).await.unwrap();
    }

    async fn sign(st: &AppState, id: &str) {
        signatures::store_signature(st, id, Bytes::from_static(b"png"))
            .await
            .unwrap();
    }

    #[test]
    fn cutoff_boundary_is_strict() {
        let s = sample_session("W1");
        assert_eq!(
            classify(datetime!(2025-06-02 08:30:00 UTC), &s, Period::Morning, CutoffDate::Today),
            AttendanceStatus::Present
        );
        assert_eq!(
            classify(datetime!(2025-06-02 08:30:01 UTC), &s, Period::Morning, CutoffDate::Today),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn sub_second_past_cutoff_is_still_present() {
        let s = sample_session("W1");
        assert_eq!(
            classify(
                datetime!(2025-06-02 08:30:00.900 UTC),
                &s,
                Period::Morning,
                CutoffDate::Today
            ),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn today_mode_ignores_session_date() {
        let s = sample_session("W1");
        // Three days after publish, before the time-of-day cutoff.
        assert_eq!(
            classify(datetime!(2025-06-05 08:10 UTC), &s, Period::Morning, CutoffDate::Today),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn session_mode_uses_publish_date() {
        let s = sample_session("W1");
        assert_eq!(
            classify(datetime!(2025-06-05 08:10 UTC), &s, Period::Morning, CutoffDate::Session),
            AttendanceStatus::Late
        );
        assert_eq!(
            classify(datetime!(2025-06-02 08:10 UTC), &s, Period::Morning, CutoffDate::Session),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn each_period_uses_its_own_cutoff() {
        let s = sample_session("W1");
        let at = datetime!(2025-06-02 13:15 UTC);
        assert_eq!(classify(at, &s, Period::Exam, CutoffDate::Today), AttendanceStatus::Late);
        assert_eq!(
            classify(at, &s, Period::Afternoon, CutoffDate::Today),
            AttendanceStatus::Present
        );
    }

    #[tokio::test]
    async fn unknown_badge_is_not_found() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        seed(&st).await;
        for period in Period::ALL {
            let out = classify_and_record(&st, "RF-404", "W1", period).await.unwrap();
            assert_eq!(out, ScanOutcome::NotFound);
        }
    }

    #[tokio::test]
    async fn student_without_badge_cannot_be_scanned_by_id() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        seed(&st).await;
        sign(&st, "S2").await;
        let out = classify_and_record(&st, "S2", "W1", Period::Morning).await.unwrap();
        assert_eq!(out, ScanOutcome::NotFound);
    }

    #[tokio::test]
    async fn blank_badge_is_rejected() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        assert!(matches!(
            classify_and_record(&st, "   ", "W1", Period::Exam).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_signature_blocks_without_mutation() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        seed(&st).await;

        let out = classify_and_record(&st, "RF-1", "W1", Period::Morning).await.unwrap();
        match out {
            ScanOutcome::SignatureRequired { student } => assert_eq!(student.school_id, "S1"),
            other => panic!("unexpected outcome {other:?}"),
        }
        let record = st.store.find_record("W1", "S1").await.unwrap().unwrap();
        assert!(record.statuses.iter().all(|(_, s)| s == AttendanceStatus::Absent));
    }

    #[tokio::test]
    async fn records_present_then_already_marked() {
        let st = state_at(datetime!(2025-06-02 08:15 UTC));
        seed(&st).await;
        sign(&st, "S1").await;

        let first = classify_and_record(&st, "RF-1", "W1", Period::Morning).await.unwrap();
        assert!(matches!(
            first,
            ScanOutcome::Recorded { status: AttendanceStatus::Present, .. }
        ));

        let second = classify_and_record(&st, "RF-1", "W1", Period::Morning).await.unwrap();
        assert!(matches!(
            second,
            ScanOutcome::AlreadyMarked { status: AttendanceStatus::Present, .. }
        ));

        let record = st.store.find_record("W1", "S1").await.unwrap().unwrap();
        assert_eq!(record.statuses.get(Period::Morning), AttendanceStatus::Present);
        assert_eq!(record.statuses.get(Period::Afternoon), AttendanceStatus::Absent);
    }

    #[tokio::test]
    async fn late_scan_is_late() {
        let st = state_at(datetime!(2025-06-02 09:45 UTC));
        seed(&st).await;
        sign(&st, "S1").await;

        let out = classify_and_record(&st, " RF-1 ", "W1", Period::Morning).await.unwrap();
        assert!(matches!(
            out,
            ScanOutcome::Recorded { status: AttendanceStatus::Late, .. }
        ));
    }

    #[tokio::test]
    async fn no_record_for_session_is_not_found() {
        let st = state_at(datetime!(2025-06-02 08:00 UTC));
        seed(&st).await;
        sign(&st, "S1").await;
        let out = classify_and_record(&st, "RF-1", "NOPE", Period::Exam).await.unwrap();
        assert_eq!(out, ScanOutcome::NotFound);
    }

    #[tokio::test]
    async fn signature_submission_continues_the_scan() {
        let st = state_at(datetime!(2025-06-02 07:10 UTC));
        seed(&st).await;

        let blocked = classify_and_record(&st, "RF-1", "W1", Period::Exam).await.unwrap();
        assert!(matches!(blocked, ScanOutcome::SignatureRequired { .. }));

        let out = record_signature_and_attend(
            &st,
            "S1",
            "W1",
            Period::Exam,
            Bytes::from_static(b"png"),
        )
        .await
        .unwrap();
        assert!(matches!(
            out,
            ScanOutcome::Recorded { status: AttendanceStatus::Present, .. }
        ));
        assert!(signatures::has_signature(&st, "S1").await.unwrap());

        // The signature is required once per student, not per session.
        st.store.create_session(&sample_session("W2")).await.unwrap();
        let next = classify_and_record(&st, "RF-1", "W2", Period::Exam).await.unwrap();
        assert!(matches!(next, ScanOutcome::Recorded { .. }));
    }

    #[tokio::test]
    async fn signature_for_marked_period_reports_already_marked() {
        let st = state_at(datetime!(2025-06-02 07:10 UTC));
        seed(&st).await;
        sign(&st, "S1").await;
        classify_and_record(&st, "RF-1", "W1", Period::Exam).await.unwrap();

        let out = record_signature_and_attend(&st, "S1", "W1", Period::Exam, Bytes::from_static(b"v2"))
            .await
            .unwrap();
        assert!(matches!(out, ScanOutcome::AlreadyMarked { .. }));
    }

    #[tokio::test]
    async fn signature_for_unknown_student_uploads_nothing() {
        let st = state_at(datetime!(2025-06-02 07:10 UTC));
        seed(&st).await;
        let out = record_signature_and_attend(&st, "S404", "W1", Period::Exam, Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(out, ScanOutcome::NotFound);
        assert!(!signatures::has_signature(&st, "S404").await.unwrap());
    }

    #[tokio::test]
    async fn session_cutoff_mode_flows_through_state() {
        let st = state_with(datetime!(2025-06-03 07:05 UTC), CutoffDate::Session);
        seed(&st).await;
        sign(&st, "S1").await;
        let out = classify_and_record(&st, "RF-1", "W1", Period::Exam).await.unwrap();
        assert!(matches!(
            out,
            ScanOutcome::Recorded { status: AttendanceStatus::Late, .. }
        ));
    }

    #[test]
    fn outcome_wire_shape() {
        let student = StudentInfo {
            school_id: "S1".into(),
            name: "Cruz".into(),
            section: "A".into(),
        };
        let json = serde_json::to_value(ScanOutcome::Recorded {
            student,
            status: AttendanceStatus::Late,
        })
        .unwrap();
        assert_eq!(json["outcome"], "recorded");
        assert_eq!(json["status"], "Late");
        assert_eq!(json["student"]["school_id"], "S1");

        let json = serde_json::to_value(ScanOutcome::NotFound).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "not_found"}));
    }
}

#[cfg(test)]
mod race_tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::{
        attendance::{
            repo::AttendanceRepo,
            repo_types::{AttendanceRecord, PeriodStatuses, ReportLine},
        },
        memory::MemoryStore,
        sessions::repo::SessionRepo,
        students::{repo::StudentRepo, repo_types::NewStudent},
        test_support::{new_student, sample_session, state_at},
    };

    /// Answers the first record read with all periods `Absent`, as if a
    /// concurrent scan landed between this scan's read and its write.
    struct StaleFirstRead {
        inner: MemoryStore,
        stale: AtomicBool,
    }

    #[async_trait]
    impl StudentRepo for StaleFirstRead {
        async fn list_students(&self, limit: i64, offset: i64) -> Result<Vec<Student>> {
            self.inner.list_students(limit, offset).await
        }
        async fn find_by_badge(&self, badge_code: &str) -> Result<Option<Student>> {
            self.inner.find_by_badge(badge_code).await
        }
        async fn find_student(&self, school_id: &str) -> Result<Option<Student>> {
            self.inner.find_student(school_id).await
        }
        async fn create_student(&self, new: &NewStudent) -> Result<Student> {
            self.inner.create_student(new).await
        }
        async fn register_badge(&self, school_id: &str, badge_code: &str) -> Result<Student> {
            self.inner.register_badge(school_id, badge_code).await
        }
    }

    #[async_trait]
    impl SessionRepo for StaleFirstRead {
        async fn create_session(&self, session: &Session) -> Result<u64> {
            self.inner.create_session(session).await
        }
        async fn list_sessions(&self) -> Result<Vec<Session>> {
            self.inner.list_sessions().await
        }
        async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
            self.inner.get_session(session_id).await
        }
        async fn update_session(&self, session: &Session) -> Result<Option<Session>> {
            self.inner.update_session(session).await
        }
        async fn delete_session(&self, session_id: &str) -> Result<bool> {
            self.inner.delete_session(session_id).await
        }
    }

    #[async_trait]
    impl AttendanceRepo for StaleFirstRead {
        async fn find_record(
            &self,
            session_id: &str,
            student_id: &str,
        ) -> Result<Option<AttendanceRecord>> {
            let record = self.inner.find_record(session_id, student_id).await?;
            if self.stale.swap(false, Ordering::SeqCst) {
                return Ok(record.map(|r| AttendanceRecord {
                    statuses: PeriodStatuses::default(),
                    ..r
                }));
            }
            Ok(record)
        }
        async fn mark_period(
            &self,
            session_id: &str,
            student_id: &str,
            period: Period,
            status: AttendanceStatus,
        ) -> Result<bool> {
            self.inner
                .mark_period(session_id, student_id, period, status)
                .await
        }
        async fn session_report(&self, session_id: &str) -> Result<Vec<ReportLine>> {
            self.inner.session_report(session_id).await
        }
    }

    #[tokio::test]
    async fn losing_the_write_reports_the_stored_status() {
        let inner = MemoryStore::default();
        inner.create_student(&new_student("S1", "Cruz")).await.unwrap();
        inner.register_badge("S1", "RF-1").await.unwrap();
        inner.create_session(&sample_session("W1")).await.unwrap();
        // The concurrent scan was on time.
        assert!(inner
            .mark_period("W1", "S1", Period::Morning, AttendanceStatus::Present)
            .await
            .unwrap());

        // This scan is past the cutoff and would write Late.
        let base = state_at(datetime!(2025-06-02 08:45 UTC));
        let st = AppState {
            store: Arc::new(StaleFirstRead {
                inner,
                stale: AtomicBool::new(true),
            }),
            ..base
        };
        signatures::store_signature(&st, "S1", Bytes::from_static(b"png"))
            .await
            .unwrap();

        let out = classify_and_record(&st, "RF-1", "W1", Period::Morning).await.unwrap();
        match out {
            ScanOutcome::AlreadyMarked { student, status } => {
                assert_eq!(student.school_id, "S1");
                assert_eq!(status, AttendanceStatus::Present);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let record = st.store.find_record("W1", "S1").await.unwrap().unwrap();
        assert_eq!(record.statuses.get(Period::Morning), AttendanceStatus::Present);
    }
}
