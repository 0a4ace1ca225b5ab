use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header pair authenticating one outbound request. The signature binds to
/// the timestamp, so a fresh pair is produced per call and never reused.
#[derive(Debug, Clone)]
pub struct SignedRequestHeaders {
    pub date: String,
    pub authorization: String,
}

/// Signs with the current clock. `scope_id` selects the Authorization
/// variant: `Some` yields `FS {scopeId}:{publicKey}:{signature}` for
/// resource-scoped endpoints, `None` yields `FS {publicKey}:{signature}`
/// for account-scoped ones.
pub fn sign_request(
    method: &str,
    path_with_query: &str,
    public_key: &str,
    secret_key: &str,
    scope_id: Option<&str>,
) -> Result<SignedRequestHeaders, String> {
    let date = http_date(Utc::now());
    sign_request_at(method, path_with_query, public_key, secret_key, scope_id, &date)
}

pub fn sign_request_at(
    method: &str,
    path_with_query: &str,
    public_key: &str,
    secret_key: &str,
    scope_id: Option<&str>,
    date: &str,
) -> Result<SignedRequestHeaders, String> {
    let canonical = canonical_string(method, date, path_with_query);

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| format!("hmac init failed: {e}"))?;
    mac.update(canonical.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let authorization = match scope_id {
        Some(scope) => format!("FS {scope}:{public_key}:{signature}"),
        None => format!("FS {public_key}:{signature}"),
    };

    Ok(SignedRequestHeaders {
        date: date.to_string(),
        authorization,
    })
}

/// `VERB\nContent-MD5\nContent-Type\nDate\nRequest-URI`. The MD5 and
/// content-type slots stay empty: only bodyless GETs are ever signed, but
/// the upstream protocol fixes their positions in the string.
pub fn canonical_string(method: &str, date: &str, path_with_query: &str) -> String {
    format!("{method}\n\n\n{date}\n{path_with_query}")
}

/// RFC 7231 date, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
