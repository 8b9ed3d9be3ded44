use tracing::info;

use crate::{
    attendance::repo_types::Period,
    error::{AppError, Result},
    sessions::repo_types::Session,
    state::AppState,
};

/// Inserts the session and fans out one record per rostered student.
pub async fn create_session(st: &AppState, session: Session) -> Result<(Session, u64)> {
    let records = st.store.create_session(&session).await?;
    info!(session_id = %session.session_id, records, "session created");
    Ok((session, records))
}

pub async fn get_session(st: &AppState, session_id: &str) -> Result<Session> {
    st.store
        .get_session(session_id)
        .await?
        .ok_or_else(|| AppError::not_found("session"))
}

pub async fn update_session(st: &AppState, session: Session) -> Result<Session> {
    let updated = st
        .store
        .update_session(&session)
        .await?
        .ok_or_else(|| AppError::not_found("session"))?;
    info!(session_id = %updated.session_id, "session updated");
    Ok(updated)
}

pub async fn delete_session(st: &AppState, session_id: &str) -> Result<()> {
    if !st.store.delete_session(session_id).await? {
        return Err(AppError::not_found("session"));
    }
    info!(%session_id, "session deleted");
    Ok(())
}

/// Period whose window contains the current wall-clock time.
pub async fn current_period(st: &AppState, session_id: &str) -> Result<Option<Period>> {
    let session = get_session(st, session_id).await?;
    Ok(session.period_at(st.clock.now().time()))
}
