//! TC3-HMAC-SHA256 request signing for Tencent Cloud API 3.0.
//!
//! Every request is a `POST /` with a JSON body. The signature covers the
//! content type, the host and the action header, plus a hash of the body.

use crate::utils::error::{RenewError, Result};
use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .finish()
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| RenewError::SigningError {
        message: e.to_string(),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `YYYY-MM-DD` in UTC, as used in the credential scope.
pub fn utc_date(timestamp: i64) -> Result<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .ok_or_else(|| RenewError::SigningError {
            message: format!("timestamp {} out of range", timestamp),
        })
}

pub fn canonical_request(host: &str, action: &str, payload: &str) -> String {
    format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\nx-tc-action:{}\n\n{}\n{}",
        CONTENT_TYPE,
        host,
        action.to_lowercase(),
        SIGNED_HEADERS,
        sha256_hex(payload.as_bytes())
    )
}

pub fn credential_scope(date: &str, service: &str) -> String {
    format!("{}/{}/tc3_request", date, service)
}

pub fn string_to_sign(timestamp: i64, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        sha256_hex(canonical_request.as_bytes())
    )
}

/// Value of the `Authorization` header for one request.
pub fn authorization(
    credential: &Credential,
    service: &str,
    host: &str,
    action: &str,
    payload: &str,
    timestamp: i64,
) -> Result<String> {
    let date = utc_date(timestamp)?;
    let scope = credential_scope(&date, service);
    let to_sign = string_to_sign(timestamp, &scope, &canonical_request(host, action, payload));

    let secret_date = hmac_sha256(
        format!("TC3{}", credential.secret_key).as_bytes(),
        date.as_bytes(),
    )?;
    let secret_service = hmac_sha256(&secret_date, service.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, to_sign.as_bytes())?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.secret_id, scope, SIGNED_HEADERS, signature
    ))
}
