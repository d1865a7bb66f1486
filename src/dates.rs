use time::{Date, OffsetDateTime, UtcOffset};

// `YYYY-MM-DD`, the format every date field uses on the wire.
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Current wall-clock time for a user `offset_hours` away from UTC.
pub fn now_local(offset_hours: i8) -> OffsetDateTime {
    let offset = UtcOffset::from_hms(offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}

pub fn today(offset_hours: i8) -> Date {
    now_local(offset_hours).date()
}

/// `HH:MM` rendering used for `Meal::time`.
pub fn clock_time(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

pub fn is_valid_clock_time(s: &str) -> bool {
    let Some((h, m)) = s.split_once(':') else {
        return false;
    };
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(h) || !two_digits(m) {
        return false;
    }
    matches!((h.parse::<u8>(), m.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}
