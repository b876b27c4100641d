//! Protocol constants shared by the request pipeline

use std::time::Duration;

/// Canonical XML media type.
pub const CONTENT_TYPE_XML: &str = "application/xml";

/// Canonical JSON media type.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Header carrying the optional API version token.
pub const API_VERSION_HEADER: &str = "Api-Version";

/// Fixed per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default transport attempt ceiling (initial attempt included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default first backoff interval after a refused connection.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default cap on the backoff interval.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(3_200);

/// Marker that opens the human-readable part of a server error page.
pub const ERROR_DETAILS_MARKER: &str = "<div id=\"errorDetails\">";

/// Upper bound (in characters) on an extracted error fragment.
pub const MAX_ERROR_FRAGMENT_CHARS: usize = 4_096;

/// Date format of revision path segments.
pub const REVISION_DATE_FORMAT: &str = "%Y-%m-%d";
