use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{AppError, Result},
    state::AppState,
};

const CONTENT_TYPE: &str = "image/png";
const PRESIGN_TTL_SECS: u64 = 10 * 60;

/// One object per student, independent of sessions.
pub fn signature_key(school_id: &str) -> String {
    format!("signatures/{}.png", school_id)
}

/// Decodes base64 canvas output, with or without a `data:image/...;base64,` header.
pub fn decode_signature(raw: &str) -> Result<Bytes> {
    lazy_static! {
        static ref DATA_URL_RE: Regex = Regex::new(r"^data:image/\w+;base64,").unwrap();
    }
    let payload = DATA_URL_RE.replace(raw.trim(), "");
    if payload.is_empty() {
        return Err(AppError::validation("signature is empty"));
    }
    let bytes = Base64::decode_vec(&payload)
        .map_err(|_| AppError::validation("signature is not valid base64"))?;
    if bytes.is_empty() {
        return Err(AppError::validation("signature is empty"));
    }
    Ok(Bytes::from(bytes))
}

pub async fn has_signature(st: &AppState, school_id: &str) -> Result<bool> {
    let key = signature_key(school_id);
    let exists = st
        .storage
        .exists(&key)
        .await
        .with_context(|| format!("head {}", key))?;
    Ok(exists)
}

/// Last write wins; there is no versioning.
pub async fn store_signature(st: &AppState, school_id: &str, image: Bytes) -> Result<()> {
    let key = signature_key(school_id);
    st.storage
        .put_object(&key, image, CONTENT_TYPE)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(())
}

pub async fn presign_signature(st: &AppState, school_id: &str) -> Result<String> {
    if !has_signature(st, school_id).await? {
        return Err(AppError::not_found("signature"));
    }
    let key = signature_key(school_id);
    let url = st
        .storage
        .presign_get(&key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {}", key))?;
    Ok(url)
}
