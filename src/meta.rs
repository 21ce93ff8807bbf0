use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName};
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::config::DEV_PEPPER;
use crate::state::AppState;

/// Hex characters kept from the digest (~48 bits), enough to correlate
/// submissions from one address without storing a reversible value.
const IP_HASH_LEN: usize = 12;

/// Server-observed request metadata. Best-effort: absent headers and
/// an unknown remote address yield empty strings, never an error.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub raw_ip: String,
    pub ip_hash: String,
    pub user_agent: String,
    pub accept_lang: String,
    pub referer: String,
}

impl FromRequestParts<AppState> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);

        let raw_ip = client_ip(&parts.headers, remote);
        let ip_hash = hash_ip(&raw_ip, state.config.ip_hash_pepper());

        Ok(RequestMeta {
            raw_ip,
            ip_hash,
            user_agent: trimmed_header(&parts.headers, header::USER_AGENT),
            accept_lang: trimmed_header(&parts.headers, header::ACCEPT_LANGUAGE),
            referer: trimmed_header(&parts.headers, header::REFERER),
        })
    }
}

/// Best-effort client IP. A non-empty X-Forwarded-For wins (first
/// entry, trusting upstream proxies), otherwise the socket address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        let first = forwarded.split(',').next().map(str::trim).unwrap_or("");
        if !first.is_empty() {
            return first.to_string();
        }
    }

    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

/// One-way fingerprint of an IP: SHA-256 over `ip|pepper`, hex-encoded
/// and truncated. An empty IP hashes to the empty string.
pub fn hash_ip(ip: &str, pepper: &str) -> String {
    let ip = ip.trim();
    if ip.is_empty() {
        return String::new();
    }
    let pepper = if pepper.trim().is_empty() {
        DEV_PEPPER
    } else {
        pepper
    };

    let digest = Sha256::digest(format!("{ip}|{pepper}").as_bytes());
    hex::encode(digest)[..IP_HASH_LEN].to_string()
}

fn trimmed_header(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string()
}
