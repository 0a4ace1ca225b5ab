use crate::config::environment::{AppConfig, AuthScope, EndpointFamily, LookupMode};
use crate::service::signing_service;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Upstream license record, read-only to this system. Unknown fields are
/// ignored; missing booleans default to false.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseRecord {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub plan_title: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LicenseListResponse {
    #[serde(default)]
    licenses: Vec<LicenseRecord>,
}

/// Credentials required before any upstream call is attempted. Missing
/// pieces are a deployment error, not a retryable condition.
#[derive(Debug, Clone)]
pub struct FreemiusKeys {
    pub product_id: String,
    pub public_key: String,
    pub secret_key: String,
    pub api_key: Option<String>,
}

impl FreemiusKeys {
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let keys = Self {
            product_id: config
                .product_id
                .clone()
                .ok_or_else(|| "missing PRODUCT_ID".to_string())?,
            public_key: config
                .freemius_public_key
                .clone()
                .ok_or_else(|| "missing FREEMIUS_PUBLIC_KEY".to_string())?,
            secret_key: config
                .freemius_secret_key
                .clone()
                .ok_or_else(|| "missing FREEMIUS_SECRET_KEY".to_string())?,
            api_key: config.freemius_api_key.clone(),
        };
        if config.freemius_lookup_mode == LookupMode::ApiKey && keys.api_key.is_none() {
            return Err("missing FREEMIUS_API_KEY for api_key lookup mode".to_string());
        }
        Ok(keys)
    }
}

/// Filter-by-key query against the upstream license listing, capped to one
/// result.
pub fn license_lookup_path(
    family: EndpointFamily,
    product_id: &str,
    license_key: &str,
) -> String {
    format!(
        "/v1/{}/{}/licenses.json?filter=key={}&count=1",
        family.as_str(),
        product_id,
        license_key
    )
}

/// Looks up a license by key through the configured upstream path: a signed
/// GET in `hmac` mode, a bearer-token GET in `api_key` mode. Returns the raw
/// record list; an empty list means the key is unknown upstream.
pub async fn lookup_licenses(
    config: &AppConfig,
    keys: &FreemiusKeys,
    license_key: &str,
) -> Result<Vec<LicenseRecord>, String> {
    let path = license_lookup_path(config.freemius_endpoint_family, &keys.product_id, license_key);
    let url = format!(
        "{}{}",
        config.freemius_api_base_url.trim_end_matches('/'),
        path
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_seconds.max(1) as u64))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;

    let request = match config.freemius_lookup_mode {
        LookupMode::Hmac => {
            let scope_id = match config.freemius_auth_scope {
                AuthScope::Product => Some(keys.product_id.as_str()),
                AuthScope::Account => None,
            };
            let headers = signing_service::sign_request(
                "GET",
                &path,
                &keys.public_key,
                &keys.secret_key,
                scope_id,
            )?;
            client
                .get(url)
                .header("Date", headers.date)
                .header("Authorization", headers.authorization)
        }
        LookupMode::ApiKey => {
            let token = keys
                .api_key
                .as_deref()
                .ok_or_else(|| "missing FREEMIUS_API_KEY for api_key lookup mode".to_string())?;
            client
                .get(url)
                .header("Authorization", format!("Bearer {token}"))
        }
    };

    let resp = request
        .send()
        .await
        .map_err(|e| format!("freemius request failed: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!(
            "freemius returned non-success status: {}",
            resp.status()
        ));
    }

    let payload = resp
        .json::<LicenseListResponse>()
        .await
        .map_err(|e| format!("failed to parse freemius payload: {e}"))?;

    Ok(payload.licenses)
}
