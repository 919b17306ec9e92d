//! Per-slot validators.
//!
//! Pure functions from a candidate value to a normalized value or a
//! human-readable rejection. The runtime surfaces rejection messages
//! verbatim as re-prompts; validators never touch conversation state.
//!
//! Relative-date semantics: `next <weekday>` is the coming occurrence
//! strictly after today; `this <weekday>` is the occurrence in the
//! current Monday-starting week, with today counting. On a Monday,
//! "this monday" is today and "next monday" is a week out.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use std::sync::LazyLock;

use frontdesk_config::{BookingTaskConfig, BusinessHours};
use frontdesk_core::BookingId;

/// A rejected candidate with its user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Re-prompt message shown to the user.
    pub message: String,
}

impl ValidationFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result type for validators.
pub type ValidationResult<T> = Result<T, ValidationFailure>;

static TIME_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\s*(\d{1,2})(?:[:.](\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?\s*$")
        .unwrap_or_else(|e| panic!("bad time regex: {e}"))
});

static EMAIL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$")
        .unwrap_or_else(|e| panic!("bad email regex: {e}"))
});

static ORDINAL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(\d+)(st|nd|rd|th)\b").unwrap_or_else(|e| panic!("bad ordinal regex: {e}"))
});

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Resolve a natural-language or formatted date. Returns `None` for
/// anything unparseable; range checks are the caller's concern.
#[must_use]
pub fn parse_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    match lower.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        "next week" => return add_days(today, 7),
        _ => {},
    }

    let today_num = i64::from(today.weekday().num_days_from_monday());
    if let Some(name) = lower.strip_prefix("next ") {
        if let Some(target) = weekday_from_name(name.trim()) {
            let mut ahead =
                (i64::from(target.num_days_from_monday()) - today_num).rem_euclid(7);
            if ahead == 0 {
                ahead = 7;
            }
            return add_days(today, ahead);
        }
    }
    if let Some(name) = lower.strip_prefix("this ") {
        if let Some(target) = weekday_from_name(name.trim()) {
            let offset = i64::from(target.num_days_from_monday()) - today_num;
            return add_days(today, offset);
        }
    }
    if let Some(target) = weekday_from_name(lower.as_str()) {
        let ahead = (i64::from(target.num_days_from_monday()) - today_num).rem_euclid(7);
        return add_days(today, ahead);
    }

    // Formatted dates. Ordinal suffixes and commas are noise.
    let cleaned = ORDINAL_RE.replace_all(&lower, "$1").replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for format in ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }
    for format in ["%B %d %Y", "%b %d %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }
    // Month and day without a year roll forward to the next occurrence.
    for format in ["%B %d %Y", "%b %d %Y", "%d %B %Y", "%d %b %Y"] {
        let with_year = format!("{cleaned} {}", today.year());
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            if date < today {
                return date.with_year(today.year().saturating_add(1));
            }
            return Some(date);
        }
    }

    None
}

/// Validate a booking date against the window and blocked-date rules.
///
/// Accepts iff the date parses, is not in the past, is within
/// `booking_window_days` of today, and is not blocked.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] with a human-friendly reason.
pub fn validate_booking_date(
    input: &str,
    today: NaiveDate,
    booking_window_days: i64,
    blocked_dates: &[NaiveDate],
) -> ValidationResult<NaiveDate> {
    let Some(date) = parse_date(input, today) else {
        return Err(ValidationFailure::new(
            "I couldn't understand that date. Try something like \"tomorrow\", \"next Friday\", or \"2025-06-01\".",
        ));
    };

    if date < today {
        return Err(ValidationFailure::new(
            "That date has already passed. Please pick a date from today onward.",
        ));
    }

    if let Some(limit) = add_days(today, booking_window_days) {
        if date > limit {
            return Err(ValidationFailure::new(format!(
                "We can only take bookings up to {booking_window_days} days ahead. Please pick an earlier date.",
            )));
        }
    }

    if blocked_dates.contains(&date) {
        return Err(ValidationFailure::new(format!(
            "Sorry, we're not available on {}. Please choose another date.",
            date.format("%B %-d, %Y"),
        )));
    }

    Ok(date)
}

// ---------------------------------------------------------------------------
// Times
// ---------------------------------------------------------------------------

/// Parse a time of day: 24-hour `HH:MM`, `2pm`, `2:30 pm`, `14.30`.
#[must_use]
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let lower = input.trim().to_lowercase();
    let captures = TIME_RE.captures(&lower)?;

    let hour: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minute: u32 = captures
        .get(2)
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    let meridiem = captures.get(3).map(|m| m.as_str().trim_matches('.').replace('.', ""));

    let hour = match meridiem.as_deref() {
        Some(m) if m.starts_with('p') => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if hour == 12 { 12 } else { hour.checked_add(12)? }
        },
        Some(_) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if hour == 12 { 0 } else { hour }
        },
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Validate a booking time against the task's business hours
/// (half-open: opening time accepted, closing time not).
///
/// # Errors
///
/// Returns a [`ValidationFailure`] citing the interval.
pub fn validate_booking_time(
    input: &str,
    hours: &BusinessHours,
) -> ValidationResult<NaiveTime> {
    let Some(time) = parse_time(input) else {
        return Err(ValidationFailure::new(
            "I couldn't understand that time. Try something like \"14:00\" or \"2pm\".",
        ));
    };

    if hours.contains(time) {
        Ok(time)
    } else {
        Err(ValidationFailure::new(format!(
            "That time is outside our hours ({hours}). Please pick a time between {} and {}.",
            hours.start.format("%H:%M"),
            hours.end.format("%H:%M"),
        )))
    }
}

/// Meeting window: `[09:00, 17:00)` local.
#[must_use]
fn meeting_hours() -> BusinessHours {
    BusinessHours {
        start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
    }
}

/// Validate a meeting time against the fixed meeting window.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] citing the interval.
pub fn validate_meeting_time(input: &str) -> ValidationResult<NaiveTime> {
    validate_booking_time(input, &meeting_hours())
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Canonical meeting durations.
pub const MEETING_DURATIONS: [&str; 3] = ["15 minutes", "30 minutes", "1 hour"];

/// Normalize a meeting duration ("30", "half hour", "an hour").
///
/// # Errors
///
/// Returns a [`ValidationFailure`] enumerating the options.
pub fn validate_meeting_duration(input: &str) -> ValidationResult<String> {
    let lower = input.trim().to_lowercase();
    let digits: String = lower.chars().filter(char::is_ascii_digit).collect();

    let normalized = match digits.as_str() {
        "15" => Some("15 minutes"),
        "30" => Some("30 minutes"),
        "60" => Some("1 hour"),
        "1" if lower.contains("hour") => Some("1 hour"),
        "" => {
            if lower.contains("half") {
                Some("30 minutes")
            } else if lower.contains("quarter") {
                Some("15 minutes")
            } else if lower.contains("hour") {
                Some("1 hour")
            } else {
                None
            }
        },
        _ => None,
    };

    normalized.map(ToString::to_string).ok_or_else(|| {
        ValidationFailure::new(format!(
            "Please choose a duration: {}.",
            MEETING_DURATIONS.join(", "),
        ))
    })
}

// ---------------------------------------------------------------------------
// Contact details
// ---------------------------------------------------------------------------

/// Validate and normalize an email address (trimmed, lowercased).
///
/// # Errors
///
/// Returns a [`ValidationFailure`] when the candidate fails the check.
pub fn validate_email(input: &str) -> ValidationResult<String> {
    let normalized = input.trim().to_lowercase();
    if EMAIL_RE.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ValidationFailure::new(
            "That doesn't look like a valid email address. Could you re-enter it?",
        ))
    }
}

/// Validate and normalize a phone number.
///
/// Ten digits format US-style; eleven with a leading 1 get the +1 prefix;
/// any other 7-15 digit number is kept as bare digits.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] when the digit count is out of range.
pub fn validate_phone(input: &str) -> ValidationResult<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    if !(7..=15).contains(&digits.len()) {
        return Err(ValidationFailure::new(
            "That doesn't look like a valid phone number. Please include your area code.",
        ));
    }

    if digits.len() == 10 {
        Ok(format!(
            "({}) {}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..],
        ))
    } else if digits.len() == 11 && digits.starts_with('1') {
        Ok(format!(
            "+1 ({}) {}-{}",
            &digits[1..4],
            &digits[4..7],
            &digits[7..],
        ))
    } else {
        Ok(digits)
    }
}

/// Validate a customer name: at least two non-whitespace characters.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] asking for a full name.
pub fn validate_name(input: &str) -> ValidationResult<String> {
    let trimmed = input.trim();
    let significant = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    if significant >= 2 {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationFailure::new("Please provide your full name."))
    }
}

/// Validate a booking reference, normalizing to `BK-DDDD-DDDD`.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] with a format hint.
pub fn validate_booking_id(input: &str) -> ValidationResult<BookingId> {
    BookingId::parse(input).map_err(|_| {
        ValidationFailure::new(
            "Booking references look like BK-1234-5678. Could you double-check yours?",
        )
    })
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Match a service against the enabled catalog (case-insensitive,
/// substring both ways against id and display name). Returns the
/// canonical display name.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] listing the enabled services.
pub fn validate_service(input: &str, config: &BookingTaskConfig) -> ValidationResult<String> {
    let needle = input.trim().to_lowercase();
    let enabled = config.enabled_services();

    if !needle.is_empty() {
        for service in &enabled {
            let id = service.id.to_lowercase();
            let name = service.name.to_lowercase();
            if needle == id
                || needle == name
                || name.contains(&needle)
                || needle.contains(&name)
                || id.contains(&needle)
            {
                return Ok(service.name.clone());
            }
        }
    }

    let names: Vec<&str> = enabled.iter().map(|s| s.name.as_str()).collect();
    Err(ValidationFailure::new(format!(
        "We currently offer: {}. Which would you like?",
        names.join(", "),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // A Wednesday.
    fn wednesday() -> NaiveDate {
        let d = date(2025, 6, 4);
        assert_eq!(d.weekday(), Weekday::Wed);
        d
    }

    // A Monday.
    fn monday() -> NaiveDate {
        let d = date(2025, 6, 2);
        assert_eq!(d.weekday(), Weekday::Mon);
        d
    }

    #[test]
    fn test_simple_relative_dates() {
        let today = wednesday();
        assert_eq!(parse_date("today", today), Some(today));
        assert_eq!(parse_date("Tomorrow", today), Some(date(2025, 6, 5)));
        assert_eq!(parse_date("yesterday", today), Some(date(2025, 6, 3)));
        assert_eq!(parse_date("next week", today), Some(date(2025, 6, 11)));
    }

    #[test]
    fn test_next_weekday_on_wednesday() {
        // Next Monday from a Wednesday is five days out.
        assert_eq!(
            parse_date("next monday", wednesday()),
            Some(date(2025, 6, 9))
        );
    }

    #[test]
    fn test_next_weekday_on_same_day() {
        // Next Monday on a Monday is a full week out.
        assert_eq!(parse_date("next monday", monday()), Some(date(2025, 6, 9)));
    }

    #[test]
    fn test_this_weekday_semantics() {
        // This Monday on a Monday is today.
        assert_eq!(parse_date("this monday", monday()), Some(monday()));
        // This Monday on a Wednesday is earlier the same week.
        assert_eq!(parse_date("this monday", wednesday()), Some(date(2025, 6, 2)));
        // This Friday on a Wednesday is later the same week.
        assert_eq!(parse_date("this friday", wednesday()), Some(date(2025, 6, 6)));
    }

    #[test]
    fn test_formatted_dates() {
        let today = wednesday();
        assert_eq!(parse_date("2025-12-25", today), Some(date(2025, 12, 25)));
        assert_eq!(parse_date("12/25/2025", today), Some(date(2025, 12, 25)));
        assert_eq!(parse_date("June 10, 2025", today), Some(date(2025, 6, 10)));
        assert_eq!(parse_date("june 10th 2025", today), Some(date(2025, 6, 10)));
        assert_eq!(parse_date("10 June 2025", today), Some(date(2025, 6, 10)));
    }

    #[test]
    fn test_month_day_rolls_forward() {
        let today = wednesday();
        // A month/day earlier in the year resolves to next year.
        assert_eq!(parse_date("January 15", today), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("June 20", today), Some(date(2025, 6, 20)));
    }

    #[test]
    fn test_unparseable_dates() {
        let today = wednesday();
        assert_eq!(parse_date("whenever", today), None);
        assert_eq!(parse_date("", today), None);
        assert_eq!(parse_date("next blursday", today), None);
    }

    #[test]
    fn test_validate_booking_date_rules() {
        let today = wednesday();
        let blocked = vec![date(2025, 12, 25)];

        assert!(validate_booking_date("tomorrow", today, 90, &blocked).is_ok());

        let past = validate_booking_date("yesterday", today, 90, &blocked).unwrap_err();
        assert!(past.message.contains("passed"));

        let far = validate_booking_date("2025-12-01", today, 90, &blocked).unwrap_err();
        assert!(far.message.contains("90 days"));

        let hit = validate_booking_date("2025-12-25", today, 365, &blocked).unwrap_err();
        assert!(hit.message.contains("December 25, 2025"));
    }

    #[test]
    fn test_booking_date_boundary_is_inclusive() {
        let today = wednesday();
        // Exactly window days out is allowed, today itself is allowed.
        assert!(validate_booking_date("2025-09-02", today, 90, &[]).is_ok());
        assert!(validate_booking_date("today", today, 90, &[]).is_ok());
        assert!(validate_booking_date("2025-09-03", today, 90, &[]).is_err());
    }

    #[test]
    fn test_parse_time_forms() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(parse_time("14:00"), Some(t(14, 0)));
        assert_eq!(parse_time("2pm"), Some(t(14, 0)));
        assert_eq!(parse_time("2 PM"), Some(t(14, 0)));
        assert_eq!(parse_time("2:30 pm"), Some(t(14, 30)));
        assert_eq!(parse_time("12 am"), Some(t(0, 0)));
        assert_eq!(parse_time("12pm"), Some(t(12, 0)));
        assert_eq!(parse_time("9.15am"), Some(t(9, 15)));
        assert_eq!(parse_time("08:30"), Some(t(8, 30)));
        assert_eq!(parse_time("nonsense"), None);
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("13pm"), None);
    }

    #[test]
    fn test_booking_time_half_open_interval() {
        let hours = BusinessHours::parse("09:00", "18:00").unwrap();
        assert!(validate_booking_time("09:00", &hours).is_ok());
        assert!(validate_booking_time("17:59", &hours).is_ok());

        let at_close = validate_booking_time("18:00", &hours).unwrap_err();
        assert!(at_close.message.contains("09:00"));
        assert!(at_close.message.contains("18:00"));

        let early = validate_booking_time("08:30", &hours).unwrap_err();
        assert!(early.message.contains("09:00-18:00"));
    }

    #[test]
    fn test_meeting_time_window() {
        assert!(validate_meeting_time("09:00").is_ok());
        assert!(validate_meeting_time("4:30 pm").is_ok());
        assert!(validate_meeting_time("17:00").is_err());
        assert!(validate_meeting_time("8am").is_err());
    }

    #[test]
    fn test_meeting_durations() {
        assert_eq!(validate_meeting_duration("15").unwrap(), "15 minutes");
        assert_eq!(validate_meeting_duration("30 min").unwrap(), "30 minutes");
        assert_eq!(validate_meeting_duration("half hour").unwrap(), "30 minutes");
        assert_eq!(validate_meeting_duration("an hour").unwrap(), "1 hour");
        assert_eq!(validate_meeting_duration("60").unwrap(), "1 hour");
        assert_eq!(validate_meeting_duration("1 hour").unwrap(), "1 hour");

        let err = validate_meeting_duration("45 minutes").unwrap_err();
        assert!(err.message.contains("15 minutes, 30 minutes, 1 hour"));
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(
            validate_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
        // Normalized output is a fixed point.
        let once = validate_email(" MIXED@Case.Org ").unwrap();
        assert_eq!(validate_email(&once).unwrap(), once);

        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(validate_phone("555-123-4567").unwrap(), "(555) 123-4567");
        assert_eq!(validate_phone("5551234567").unwrap(), "(555) 123-4567");
        assert_eq!(
            validate_phone("1-555-123-4567").unwrap(),
            "+1 (555) 123-4567"
        );
        assert_eq!(validate_phone("+44 20 7946 0958").unwrap(), "442079460958");
        assert_eq!(validate_phone("123-4567").unwrap(), "1234567");

        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("no digits here").is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_name("  Jane Doe  ").unwrap(), "Jane Doe");
        assert!(validate_name("J").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_booking_ids() {
        assert_eq!(
            validate_booking_id("bk-123-456").unwrap_err().message,
            "Booking references look like BK-1234-5678. Could you double-check yours?",
        );
        assert_eq!(
            validate_booking_id("bk-1234-5678").unwrap().as_str(),
            "BK-1234-5678"
        );
        assert_eq!(
            validate_booking_id("12345678").unwrap().as_str(),
            "BK-1234-5678"
        );
    }

    #[test]
    fn test_service_matching() {
        let config = BookingTaskConfig::default();
        assert_eq!(validate_service("consultation", &config).unwrap(), "Consultation");
        assert_eq!(validate_service("CONSULT", &config).unwrap(), "Consultation");
        assert_eq!(validate_service("demo", &config).unwrap(), "Demo");

        let err = validate_service("haircut", &config).unwrap_err();
        assert!(err.message.contains("Consultation"));
        assert!(err.message.contains("Demo"));
        assert!(err.message.contains("Support"));
    }

    #[test]
    fn test_disabled_service_not_matched() {
        let mut config = BookingTaskConfig::default();
        if let Some(service) = config.services.iter_mut().find(|s| s.id == "demo") {
            service.enabled = false;
        }
        let err = validate_service("demo", &config).unwrap_err();
        assert!(!err.message.contains("Demo"));
    }
}
