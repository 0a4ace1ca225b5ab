use crate::module::license::schema::VerificationVerdict;
use crate::service::freemius_service::LicenseRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;

/// Reduces an upstream record to the caller-facing verdict. Shared by every
/// lookup path so the mapping exists exactly once.
pub fn derive_verdict(record: &LicenseRecord) -> VerificationVerdict {
    let valid = !(record.is_cancelled || record.is_expired);
    let reason = if valid {
        String::new()
    } else if record.is_cancelled {
        // Cancellation wins when both flags are set.
        "License Cancelled".to_string()
    } else {
        "License Expired".to_string()
    };

    let expiry = record.expiration.as_deref().and_then(|raw| {
        let parsed = parse_expiration(raw);
        if parsed.is_none() {
            warn!(expiration = %raw, "unparseable upstream expiration, rendering null expiry");
        }
        parsed.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    });

    VerificationVerdict {
        valid,
        plan: record
            .plan_title
            .clone()
            .unwrap_or_else(|| "Pro".to_string()),
        expiry,
        reason,
    }
}

/// Upstream expirations arrive as RFC 3339, as MySQL-style
/// `YYYY-MM-DD HH:MM:SS`, or as a bare date; all are taken as UTC.
fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
