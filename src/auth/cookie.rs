//! Set-Cookie parsing
//!
//! Pulls the session token and its `Expires` attribute out of a raw
//! `Set-Cookie` header value. Only the first `Set-Cookie` header of a response
//! is inspected; if an intermediate layer merged several cookies into one
//! value, the first segment naming the session cookie wins.

use super::types::SessionRecord;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, SET_COOKIE};

/// Date layouts seen in `Expires` besides RFC 1123 (handled by the RFC 2822 parser)
const LEGACY_DATE_FORMATS: &[&str] = &[
    "%a, %d-%b-%Y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a %b %e %H:%M:%S %Y",
];

/// Extract the session record from a response's headers
pub fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionRecord> {
    let value = headers.get(SET_COOKIE)?.to_str().ok()?;
    parse_set_cookie(value, cookie_name)
}

/// Parse a raw `Set-Cookie` value for the named cookie
///
/// Returns `None` when the cookie is absent or its value is empty. A cookie
/// without a usable `Expires` attribute is returned already expired.
pub fn parse_set_cookie(header: &str, cookie_name: &str) -> Option<SessionRecord> {
    let mut parts = header.split(';').map(str::trim);

    let token = parts.by_ref().find_map(|part| {
        let (name, value) = part.split_once('=')?;
        (name.trim() == cookie_name).then(|| value.trim())
    })?;

    if token.is_empty() {
        return None;
    }

    let expires_at = parts
        .find_map(|attr| {
            let (name, value) = attr.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("expires")
                .then(|| value.trim())
        })
        .and_then(parse_cookie_date)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    Some(SessionRecord::new(token, expires_at))
}

/// Parse a cookie `Expires` date into an absolute UTC timestamp
pub fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    LEGACY_DATE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    const COUCH_COOKIE: &str = "AuthSession=YWRtaW46NjU; Version=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Max-Age=600; Path=/; HttpOnly";

    #[test]
    fn test_parses_couch_cookie() {
        let record = parse_set_cookie(COUCH_COOKIE, "AuthSession").unwrap();
        assert_eq!(record.token, "YWRtaW46NjU");
        assert_eq!(
            record.expires_at,
            Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()
        );
    }

    #[test_case("othercookie=whatever" ; "different cookie name")]
    #[test_case("AuthSession=; Expires=Wed, 21 Oct 2015 07:28:00 GMT" ; "empty token")]
    #[test_case("" ; "empty header")]
    #[test_case("AuthSessionX=abc; Path=/" ; "name with shared prefix")]
    #[test_case("Path=/; HttpOnly" ; "attributes only")]
    fn test_no_session(header: &str) {
        assert_eq!(parse_set_cookie(header, "AuthSession"), None);
    }

    #[test]
    fn test_missing_expires_fails_closed() {
        let record = parse_set_cookie("AuthSession=abc; Path=/", "AuthSession").unwrap();
        assert_eq!(record.token, "abc");
        assert!(!record.is_valid());
    }

    #[test]
    fn test_garbage_expires_fails_closed() {
        let record =
            parse_set_cookie("AuthSession=abc; Expires=soon-ish", "AuthSession").unwrap();
        assert!(!record.is_valid());
    }

    #[test]
    fn test_expires_attribute_case_insensitive() {
        let record = parse_set_cookie(
            "AuthSession=abc; expires=Wed, 21 Oct 2015 07:28:00 GMT",
            "AuthSession",
        )
        .unwrap();
        assert_eq!(
            record.expires_at,
            Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()
        );
    }

    #[test]
    fn test_cookie_not_first_segment() {
        let record = parse_set_cookie(
            "lang=en; AuthSession=tok; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
            "AuthSession",
        )
        .unwrap();
        assert_eq!(record.token, "tok");
    }

    #[test]
    fn test_first_match_wins() {
        let record = parse_set_cookie("AuthSession=first; AuthSession=second", "AuthSession")
            .unwrap();
        assert_eq!(record.token, "first");
    }

    #[test_case("Wed, 21 Oct 2015 07:28:00 GMT" ; "rfc 1123")]
    #[test_case("Wed, 21-Oct-2015 07:28:00 GMT" ; "netscape dashes")]
    #[test_case("Wednesday, 21-Oct-15 07:28:00 GMT" ; "rfc 850")]
    #[test_case("Wed Oct 21 07:28:00 2015" ; "asctime")]
    fn test_cookie_date_formats(value: &str) {
        assert_eq!(
            parse_cookie_date(value),
            Some(Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap())
        );
    }

    #[test]
    fn test_session_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_from_headers(&headers, "AuthSession"), None);

        headers.insert(SET_COOKIE, HeaderValue::from_static(COUCH_COOKIE));
        let record = session_from_headers(&headers, "AuthSession").unwrap();
        assert_eq!(record.token, "YWRtaW46NjU");
    }

    #[test]
    fn test_only_first_set_cookie_header_inspected() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("lang=en; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static(COUCH_COOKIE));
        assert_eq!(session_from_headers(&headers, "AuthSession"), None);
    }
}
