use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[serde(alias = "school_id")]
    pub school_id: String,
    pub name: String,
    pub section: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBadgeRequest {
    #[serde(alias = "rfidCode", alias = "rfid_code")]
    pub badge_code: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_page() -> i64 { 1 }
fn default_limit() -> i64 { 200 }

const MAX_LIMIT: i64 = 1000;

impl Pagination {
    /// (limit, offset) with page clamped to >= 1 and limit to 1..=1000. The
    /// offset saturates instead of overflowing on huge pages.
    pub fn limit_offset(&self) -> (i64, i64) {
        let limit = self.limit.clamp(1, MAX_LIMIT);
        let page = self.page.max(1);
        (limit, (page - 1).saturating_mul(limit))
    }
}
