use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLicenseRequest {
    #[serde(default, alias = "licenseKey")]
    pub license_key: Option<String>,
}

/// The caller-facing verdict. The envelope is uniform: all four fields are
/// always present, and `expiry` serializes as null when absent, so clients
/// branch on `valid`/`reason` rather than on shape or HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub valid: bool,
    pub plan: String,
    pub expiry: Option<String>,
    pub reason: String,
}

impl VerificationVerdict {
    pub fn invalid(reason: &str) -> Self {
        Self {
            valid: false,
            plan: String::new(),
            expiry: None,
            reason: reason.to_string(),
        }
    }
}
