/// Number of Unicode scalar values, which is what every length bound in this
/// crate is expressed in.
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Count sentences in `s`.
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or the end
/// of the text, so decimals ("2.5 hours") and abbreviations glued to the next
/// word do not split. Trailing text without a terminator counts as a sentence.
#[must_use]
pub fn count_sentences(s: &str) -> usize {
    let mut count = 0;
    let mut has_content = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?') {
                    chars.next();
                } else {
                    break;
                }
            }
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if at_boundary && has_content {
                count += 1;
                has_content = false;
            }
        } else if !c.is_whitespace() {
            has_content = true;
        }
    }

    if has_content {
        count += 1;
    }
    count
}

#[must_use]
pub fn count_words(s: &str) -> usize {
    s.split_whitespace().count()
}
