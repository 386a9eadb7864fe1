use crate::error::{FamcalError, FamcalResult};

const BEGIN_MARKER: &str = "BEGIN:VCALENDAR";
const END_MARKER: &str = "END:VCALENDAR";

/// Signatures of HTML error pages and login walls served in place of a feed.
const ERROR_PAGE_SIGNATURES: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "404 not found",
    "403 forbidden",
    "access denied",
    "internal server error",
    "sign in",
];

/// How far into the payload error-page signatures are searched.
const SIGNATURE_SCAN_LEN: usize = 2048;

/// Reject payloads that are not an iCalendar document.
pub fn validate_ics_payload(content: &str) -> FamcalResult<()> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();

    if trimmed.is_empty() {
        return Err(FamcalError::Validation("iCal payload is empty".into()));
    }

    if !trimmed.starts_with(BEGIN_MARKER) {
        let head: String = trimmed.chars().take(SIGNATURE_SCAN_LEN).collect();
        let head = head.to_lowercase();
        if let Some(signature) = ERROR_PAGE_SIGNATURES.iter().find(|s| head.contains(*s)) {
            return Err(FamcalError::Validation(format!(
                "Received an error page instead of an iCal feed (matched '{}')",
                signature
            )));
        }
    }

    if !trimmed.contains(BEGIN_MARKER) {
        return Err(FamcalError::Validation(format!(
            "Not an iCal feed: missing {}",
            BEGIN_MARKER
        )));
    }

    if !trimmed.contains(END_MARKER) {
        return Err(FamcalError::Validation(format!(
            "Truncated iCal feed: missing {}",
            END_MARKER
        )));
    }

    Ok(())
}
