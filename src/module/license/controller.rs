use super::error::AppError;
use super::schema::{VerificationVerdict, VerifyLicenseRequest};
use crate::app::AppState;
use crate::service::freemius_service::{self, FreemiusKeys};
use crate::service::verdict_service;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

pub async fn health() -> impl IntoResponse {
    "CloudSlash License Server Online"
}

pub async fn verify_license(
    State(state): State<AppState>,
    Json(req): Json<VerifyLicenseRequest>,
) -> Response {
    let Some(license_key) = req.license_key.filter(|k| !k.is_empty()) else {
        return error_response(AppError::bad_request(
            "MISSING_LICENSE_KEY",
            "Missing licenseKey",
        ));
    };

    let keys = match FreemiusKeys::from_config(&state.config) {
        Ok(k) => k,
        Err(e) => {
            error!(error_code = "CONFIG_MISSING_KEYS", reason = %e, "missing upstream credentials");
            return error_response(AppError::internal(
                "CONFIG_MISSING_KEYS",
                "Server Misconfiguration: Missing Freemius Keys",
            ));
        }
    };

    let licenses = match freemius_service::lookup_licenses(&state.config, &keys, &license_key).await
    {
        Ok(licenses) => licenses,
        Err(e) => {
            // Surfaced to the caller as a verdict, not a transport error;
            // the log keeps the upstream outage distinguishable from a
            // missing license.
            error!(error_code = "UPSTREAM_UNAVAILABLE", reason = %e, "license lookup failed");
            return verdict_response(VerificationVerdict::invalid("Verification Server Error"));
        }
    };

    let Some(record) = licenses.first() else {
        info!(error_code = "LICENSE_NOT_FOUND", "license key unknown upstream");
        return verdict_response(VerificationVerdict::invalid("License Not Found"));
    };

    let verdict = verdict_service::derive_verdict(record);
    info!(
        valid = verdict.valid,
        plan = %verdict.plan,
        reason = %verdict.reason,
        "license verified"
    );
    verdict_response(verdict)
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn verdict_response(verdict: VerificationVerdict) -> Response {
    (StatusCode::OK, Json(verdict)).into_response()
}

fn error_response(err: AppError) -> Response {
    error!(error_code = err.code, reason = %err.message, "license verification rejected");
    (err.status, err.message).into_response()
}
