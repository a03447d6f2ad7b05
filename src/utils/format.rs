use chrono::{DateTime, TimeZone, Utc};

/// Format an integer with comma separators: 12345 -> "12,345"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// "1 person", "2,450 people", or "No data" when the feed has no count
pub fn format_people_affected(n: u32) -> String {
    if n == 0 {
        return "No data".to_string();
    }
    format_people_count(u64::from(n))
}

/// Plain pluralized count for aggregates, where zero is a real value
pub fn format_people_count(n: u64) -> String {
    match n {
        1 => "1 person".to_string(),
        n => format!("{} people", format_number(n)),
    }
}

/// Render an epoch-milliseconds timestamp, "Unknown" if absent or invalid
pub fn format_timestamp(millis: Option<i64>) -> String {
    match millis.and_then(parse_millis) {
        Some(dt) => dt.format("%b %d, %l:%M %p").to_string(),
        None => "Unknown".to_string(),
    }
}

/// How long an outage has been running, as a relative phrase.
/// Falls back to the absolute timestamp past a week.
pub fn format_duration(start_millis: Option<i64>) -> String {
    let Some(start) = start_millis.and_then(parse_millis) else {
        return "Unknown".to_string();
    };

    let minutes = (Utc::now() - start).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{} min{} ago", minutes, plural(minutes));
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} hour{} ago", hours, plural(hours));
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{} day{} ago", days, plural(days));
    }
    format_timestamp(start_millis)
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn parse_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
