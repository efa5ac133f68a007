use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse a timestamp as stored by task sources.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS`
/// (read as UTC) and bare dates, which resolve to the start of the day.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_with_date_policy(raw, NaiveTime::MIN)
}

/// Like [`parse_timestamp`], but a bare date means the *end* of that day.
/// A deadline of "2024-03-01" is still open on the afternoon of March 1st.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
    parse_with_date_policy(raw, end_of_day)
}

fn parse_with_date_policy(raw: &str, date_only_time: NaiveTime) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(date_only_time)))
}
