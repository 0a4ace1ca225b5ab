use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    Plugins,
    Products,
}

impl EndpointFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugins => "plugins",
            Self::Products => "products",
        }
    }
}

/// Which Authorization variant outbound requests carry. The upstream API
/// accepts `FS {scopeId}:{publicKey}:{signature}` on resource-scoped
/// endpoints and `FS {publicKey}:{signature}` on account-scoped ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    Product,
    Account,
}

impl AuthScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Account => "account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Hmac,
    ApiKey,
}

impl LookupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hmac => "hmac",
            Self::ApiKey => "api_key",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rust_env: String,
    pub api_host: String,
    pub api_port: u16,
    pub product_id: Option<String>,
    pub freemius_public_key: Option<String>,
    pub freemius_secret_key: Option<String>,
    pub freemius_api_key: Option<String>,
    pub freemius_api_base_url: String,
    pub freemius_endpoint_family: EndpointFamily,
    pub freemius_auth_scope: AuthScope,
    pub freemius_lookup_mode: LookupMode,
    pub upstream_timeout_seconds: i64,
    pub debug_errors: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        load_dotenv_layers();
        Ok(Self {
            rust_env: read_var("RUST_ENV")?,
            api_host: read_var("API_HOST")?,
            api_port: read_var("API_PORT")?
                .parse::<u16>()
                .map_err(|e| format!("invalid API_PORT: {e}"))?,
            product_id: env::var("PRODUCT_ID").ok(),
            freemius_public_key: env::var("FREEMIUS_PUBLIC_KEY").ok(),
            freemius_secret_key: env::var("FREEMIUS_SECRET_KEY").ok(),
            freemius_api_key: env::var("FREEMIUS_API_KEY").ok(),
            freemius_api_base_url: read_optional_string(
                "FREEMIUS_API_BASE_URL",
                "https://api.freemius.com",
            ),
            freemius_endpoint_family: read_endpoint_family("FREEMIUS_ENDPOINT_FAMILY")?,
            freemius_auth_scope: read_auth_scope("FREEMIUS_AUTH_SCOPE")?,
            freemius_lookup_mode: read_lookup_mode("FREEMIUS_LOOKUP_MODE")?,
            upstream_timeout_seconds: read_optional_i64("UPSTREAM_TIMEOUT_SECONDS", 10)?,
            debug_errors: read_optional_bool("DEBUG_ERRORS", false),
        })
    }
}

fn read_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("missing required env var: {key}"))
}

fn read_optional_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(v) => v.parse::<i64>().map_err(|e| format!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

fn read_optional_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        Err(_) => default,
    }
}

fn read_optional_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_endpoint_family(key: &str) -> Result<EndpointFamily, String> {
    match env::var(key) {
        Ok(v) => match v.as_str() {
            "plugins" => Ok(EndpointFamily::Plugins),
            "products" => Ok(EndpointFamily::Products),
            other => Err(format!("invalid {key}: {other} (expected plugins|products)")),
        },
        Err(_) => Ok(EndpointFamily::Plugins),
    }
}

fn read_auth_scope(key: &str) -> Result<AuthScope, String> {
    match env::var(key) {
        Ok(v) => match v.as_str() {
            "product" => Ok(AuthScope::Product),
            "account" => Ok(AuthScope::Account),
            other => Err(format!("invalid {key}: {other} (expected product|account)")),
        },
        Err(_) => Ok(AuthScope::Product),
    }
}

fn read_lookup_mode(key: &str) -> Result<LookupMode, String> {
    match env::var(key) {
        Ok(v) => match v.as_str() {
            "hmac" => Ok(LookupMode::Hmac),
            "api_key" => Ok(LookupMode::ApiKey),
            other => Err(format!("invalid {key}: {other} (expected hmac|api_key)")),
        },
        Err(_) => Ok(LookupMode::Hmac),
    }
}

fn load_dotenv_layers() {
    for path in [".env", "../.env", "../../.env"] {
        let _ = dotenvy::from_path_override(path);
    }
}
