use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Token prefixes of common API keys that may leak into backend error bodies.
/// Only matched at the start of a token.
const PREFIX_PATTERNS: [&str; 8] = [
    "sk-", "ghp_", "github_pat_", "xoxb-", "xoxp-", "AIza", "AKIA", "eyJ",
];

/// Markers followed by a secret value.
const MARKER_PATTERNS: [&str; 8] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "api_key=",
    "access_token=",
    "password=",
    "\"api_key\":\"",
    "\"access_token\":\"",
    "\"password\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

fn starts_token(input: &str, at: usize) -> bool {
    input[..at].chars().next_back().is_none_or(|c| !is_secret_char(c))
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str, token_start_only: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        if token_start_only && !starts_token(scrubbed, start) {
            search_from = start + marker.len();
            continue;
        }
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // bare marker, nothing to redact
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact secret-looking tokens before text leaves the process or hits a log.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for pattern in PREFIX_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern, true);
    }
    for pattern in MARKER_PATTERNS {
        scrub_after_marker(&mut scrubbed, pattern, false);
    }
    if scrubbed == input {
        return Cow::Borrowed(input);
    }
    Cow::Owned(scrubbed)
}

/// Sanitize backend error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    crate::utils::text::truncate_with_ellipsis(scrubbed.as_ref(), MAX_API_ERROR_CHARS)
}
