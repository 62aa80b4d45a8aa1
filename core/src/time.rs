//! Time related utils.

use chrono::SecondsFormat;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %T GMT").to_string()
}

/// Format time into RFC3339 with second precision: `2022-03-13T07:20:04Z`
///
/// This is the only timestamp shape storage signatures accept.
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
