use chrono::{
    format::ParseResult,
    naive::NaiveDateTime,
    offset::Utc,
    DateTime,
};

/// RFC 850 date format, obsoleted by RFC 7231 but still accepted.
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";

/// ANSI C `asctime()` format.
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parsing for the three date formats HTTP/1.1 recipients must accept (RFC 7231 section 7.1.1.1).
pub(crate) trait ParseHttpDate<T> {
    fn parse_from_http_date(s: &str) -> ParseResult<T>;
}

impl ParseHttpDate<DateTime<Utc>> for DateTime<Utc> {
    fn parse_from_http_date(s: &str) -> ParseResult<DateTime<Utc>> {
        let s = s.trim();

        // IMF-fixdate is a subset of RFC 2822 and covers nearly all real traffic.
        let rfc2822_err = match DateTime::parse_from_rfc2822(s) {
            Ok(dt) => return Ok(dt.with_timezone(&Utc)),
            Err(e) => e,
        };

        for format in [RFC850_FORMAT, ASCTIME_FORMAT] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(naive.and_utc());
            }
        }

        Err(rfc2822_err)
    }
}
