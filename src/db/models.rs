use chrono::{DateTime, Utc};
use serde::Serialize;

/// A published submission. These are the only fields the API exposes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub story: String,
    pub feeling: String,
    pub created_at: DateTime<Utc>,
}

/// Anonymous request metadata stored alongside a post. Deliberately
/// not Serialize: nothing in here may ever reach a response body.
#[derive(Debug, Clone, Default)]
pub struct PostMeta {
    pub raw_ip: String,
    pub ip_hash: String,
    pub user_agent: String,
    pub accept_lang: String,
    pub referer: String,
    pub client_tz: String,
    pub client_lang: String,
    pub screen: String,
    pub platform: String,
}
