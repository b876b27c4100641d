//! Human-readable messages from error response bodies
//!
//! Server error pages embed the useful part in a
//! `<div id="errorDetails">` block. Extraction is a best-effort display
//! heuristic: when the marker is absent the whole body is used.

use payrun_domain::constants::{ERROR_DETAILS_MARKER, MAX_ERROR_FRAGMENT_CHARS};

/// Statuses whose bodies go through fragment extraction.
const EXTRACTED_STATUSES: [u16; 2] = [400, 500];

/// Message to report for a non-success response.
pub fn rejection_message(status: u16, body: &str) -> String {
    if EXTRACTED_STATUSES.contains(&status) && !body.is_empty() {
        extract_error_details(body)
    } else {
        body.to_string()
    }
}

/// Text from the error-details marker to the end of the body, bounded in
/// length, or the full body when the marker is missing.
pub fn extract_error_details(body: &str) -> String {
    match body.find(ERROR_DETAILS_MARKER) {
        Some(start) => body[start..].chars().take(MAX_ERROR_FRAGMENT_CHARS).collect(),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_fragment_starts_at_marker() {
        let body = concat!(
            r#"<html><body><h1>Error</h1>"#,
            r#"<div id="errorDetails">Employer key already exists</div></body></html>"#
        );
        assert_eq!(
            rejection_message(400, body),
            r#"<div id="errorDetails">Employer key already exists</div></body></html>"#
        );
    }

    #[test]
    fn exact_fragment_is_returned_unchanged() {
        let body = r#"<div id="errorDetails">boom</div>"#;
        assert_eq!(rejection_message(400, body), body);
        assert_eq!(rejection_message(500, body), body);
    }

    #[test]
    fn missing_marker_falls_back_to_full_body() {
        assert_eq!(rejection_message(500, "Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn other_statuses_keep_raw_body() {
        let body = r#"<p>nope</p><div id="errorDetails">hidden</div>"#;
        assert_eq!(rejection_message(404, body), body);
        assert_eq!(rejection_message(401, ""), "");
    }

    #[test]
    fn fragment_is_bounded() {
        let body = format!("{ERROR_DETAILS_MARKER}{}", "é".repeat(10_000));
        let fragment = rejection_message(400, &body);
        assert_eq!(fragment.chars().count(), MAX_ERROR_FRAGMENT_CHARS);
        assert!(fragment.starts_with(ERROR_DETAILS_MARKER));
    }
}
