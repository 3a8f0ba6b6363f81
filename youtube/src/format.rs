//! Display helpers for relative dates and large counts.

use jiff::Timestamp;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;

/// How long before `now` the timestamp `then` was, in words ("3 days ago", "yesterday").
///
/// Months are 30 days and years are 12 such months. Timestamps in the future read as "now".
pub fn format_time_ago(then: Timestamp, now: Timestamp) -> String {
    let seconds = now.as_second().saturating_sub(then.as_second()).max(0);

    let (amount, unit) = if seconds < MINUTE {
        (seconds, "second")
    } else if seconds < HOUR {
        (seconds / MINUTE, "minute")
    } else if seconds < DAY {
        (seconds / HOUR, "hour")
    } else if seconds < MONTH {
        (seconds / DAY, "day")
    } else if seconds < YEAR {
        (seconds / MONTH, "month")
    } else {
        (seconds / YEAR, "year")
    };

    match (amount, unit) {
        (0, _) => "now".to_string(),
        (1, "day") => "yesterday".to_string(),
        (1, "month") => "last month".to_string(),
        (1, "year") => "last year".to_string(),
        (1, unit) => format!("1 {unit} ago"),
        (n, unit) => format!("{n} {unit}s ago"),
    }
}

/// Groups the digits of an integer count with commas. Anything else is returned unchanged.
pub fn format_number(count: &str) -> String {
    let trimmed = count.trim();
    let Ok(n) = trimmed.parse::<i128>() else {
        return count.to_string();
    };

    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn ago(seconds: i64) -> String {
        let now: Timestamp = "2025-06-15T12:00:00Z".parse().unwrap();
        format_time_ago(now - SignedDuration::from_secs(seconds), now)
    }

    #[test]
    fn relative_times() {
        assert_eq!(ago(0), "now");
        assert_eq!(ago(-30), "now");
        assert_eq!(ago(1), "1 second ago");
        assert_eq!(ago(45), "45 seconds ago");
        assert_eq!(ago(MINUTE), "1 minute ago");
        assert_eq!(ago(59 * MINUTE), "59 minutes ago");
        assert_eq!(ago(3 * HOUR + 59), "3 hours ago");
        assert_eq!(ago(DAY), "yesterday");
        assert_eq!(ago(3 * DAY), "3 days ago");
        assert_eq!(ago(29 * DAY), "29 days ago");
        assert_eq!(ago(MONTH), "last month");
        assert_eq!(ago(11 * MONTH), "11 months ago");
        assert_eq!(ago(YEAR), "last year");
        assert_eq!(ago(5 * YEAR + DAY), "5 years ago");
    }

    #[test]
    fn grouped_numbers() {
        assert_eq!(format_number("0"), "0");
        assert_eq!(format_number("999"), "999");
        assert_eq!(format_number("1000"), "1,000");
        assert_eq!(format_number("1234567"), "1,234,567");
        assert_eq!(format_number(" 100000 "), "100,000");
        assert_eq!(format_number("-12345"), "-12,345");
        assert_eq!(format_number("n/a"), "n/a");
        assert_eq!(format_number(""), "");
    }
}
