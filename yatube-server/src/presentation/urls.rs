use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub(crate) const LOGIN: &str = "/auth/login/";

// Path separators stay readable in `?next=`.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// One path segment: everything outside the username charset is escaped.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'@')
    .remove(b'+');

pub(crate) fn login(next: &str) -> String {
    format!("{LOGIN}?next={}", utf8_percent_encode(next, NEXT_ENCODE_SET))
}

pub(crate) fn profile(username: &str) -> String {
    format!(
        "/profile/{}/",
        utf8_percent_encode(username, SEGMENT_ENCODE_SET)
    )
}

pub(crate) fn post_detail(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

/// Where to send the user after login: only local absolute paths are honoured.
pub(crate) fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && !next.contains('\\')
                && !next.chars().any(char::is_control) =>
        {
            next
        }
        _ => "/",
    }
}
