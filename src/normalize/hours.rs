//! Operating-hours canonicalization
//!
//! The site renders hours as free text ("Monday - Friday: 8:00am - 4:00pm,
//! Saturday: 8am - 12pm"). Chunks that match the common day-range/time-range
//! shapes are rebuilt into a canonical "Mon-Fri 08:00-16:00" form; text that
//! doesn't match is kept as-is (whitespace-cleaned) rather than inventing a
//! schedule.

use once_cell::sync::Lazy;
use regex::Regex;

/// One parsed schedule entry: a day or day range with an open/close time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoursSpan {
    /// Canonical day label, e.g. "Mon-Fri" or "Sat".
    pub days: String,
    /// 24-hour opening time, e.g. "08:00".
    pub open: String,
    /// 24-hour closing time, e.g. "16:00".
    pub close: String,
}

impl std::fmt::Display for HoursSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}-{}", self.days, self.open, self.close)
    }
}

static DAYS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(mon|tue|tues|wed|wednes|thu|thur|thurs|fri|sat|satur|sun)(?:day)?s?\b(?:\s*(?:-|–|to)\s*\b(mon|tue|tues|wed|wednes|thu|thur|thurs|fri|sat|satur|sun)(?:day)?s?\b)?",
    )
    .expect("days regex")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b").expect("time regex")
});

/// Canonicalizes hours text. Returns `None` only for empty input.
pub fn canonicalize(raw: &str) -> Option<String> {
    let cleaned = squeeze(raw);
    if cleaned.is_empty() {
        return None;
    }

    let spans = parse_spans(&cleaned);
    if spans.is_empty() {
        return Some(cleaned);
    }

    Some(
        spans
            .iter()
            .map(|span| span.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Parses as many schedule entries as the text yields.
pub fn parse_spans(text: &str) -> Vec<HoursSpan> {
    let mut spans = Vec::new();

    for chunk in text.split([';', ',', '\n']) {
        if let Some(span) = parse_chunk(chunk) {
            spans.push(span);
        }
    }

    spans
}

/// One chunk → one span, when it holds a day (or day range) and two times.
fn parse_chunk(chunk: &str) -> Option<HoursSpan> {
    let day_match = DAYS_RE.captures(chunk)?;

    let first_day = canonical_day(&day_match[1])?;
    let days = match day_match.get(2) {
        Some(second) => format!("{}-{}", first_day, canonical_day(second.as_str())?),
        None => first_day.to_string(),
    };

    // Times must come after the day text; "2" in "Gate 2 Saturday" is not
    // an opening time.
    let tail = &chunk[day_match.get(0)?.end()..];
    let mut times = TIME_RE.captures_iter(tail).filter_map(|caps| {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))?;
        let meridiem = caps.get(3).map(|m| m.as_str().to_lowercase());
        to_24h(hour, minute, meridiem.as_deref())
    });

    let open = times.next()?;
    let close = times.next()?;

    Some(HoursSpan { days, open, close })
}

fn canonical_day(token: &str) -> Option<&'static str> {
    let token = token.to_lowercase();
    let day = match token.as_str() {
        "mon" => "Mon",
        "tue" | "tues" => "Tue",
        "wed" | "wednes" => "Wed",
        "thu" | "thur" | "thurs" => "Thu",
        "fri" => "Fri",
        "sat" | "satur" => "Sat",
        "sun" => "Sun",
        _ => return None,
    };
    Some(day)
}

fn to_24h(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<String> {
    if minute > 59 {
        return None;
    }
    let hour = match meridiem {
        Some("am") => {
            if hour == 12 {
                0
            } else {
                hour
            }
        }
        Some("pm") => {
            if hour == 12 {
                12
            } else {
                hour + 12
            }
        }
        _ => hour,
    };
    if hour > 23 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

fn squeeze(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
