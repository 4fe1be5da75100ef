// Date utilities.

use chrono::{Datelike, NaiveDate, Utc};

/// Whole years between `birthdate` and `today`, adjusted down by one when
/// the birthday hasn't occurred yet this year.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

/// Age as of the current UTC date.
pub fn age_now(birthdate: NaiveDate) -> i32 {
    age_on(birthdate, Utc::now().date_naive())
}

/// Whether `date` lies strictly after `today`.
pub fn is_future(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_age_on_birthday() {
        // Today is the 13th birthday exactly.
        assert_eq!(age_on(d(2012, 6, 15), d(2025, 6, 15)), 13);
    }

    #[test]
    fn test_age_day_before_birthday() {
        // 12 years and 364 days.
        assert_eq!(age_on(d(2012, 6, 15), d(2025, 6, 14)), 12);
    }

    #[test]
    fn test_age_day_after_birthday() {
        assert_eq!(age_on(d(2012, 6, 15), d(2025, 6, 16)), 13);
    }

    #[test]
    fn test_age_earlier_month() {
        assert_eq!(age_on(d(2012, 12, 1), d(2025, 6, 15)), 12);
    }

    #[test]
    fn test_age_leap_day_birthdate() {
        // Feb 29 birthdate: age ticks over on Mar 1 in non-leap years.
        assert_eq!(age_on(d(2012, 2, 29), d(2025, 2, 28)), 12);
        assert_eq!(age_on(d(2012, 2, 29), d(2025, 3, 1)), 13);
    }

    #[test]
    fn test_is_future() {
        assert!(is_future(d(2030, 1, 1), d(2025, 6, 15)));
        assert!(!is_future(d(2025, 6, 15), d(2025, 6, 15)));
        assert!(!is_future(d(2020, 1, 1), d(2025, 6, 15)));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2012-06-15"), Some(d(2012, 6, 15)));
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2012-13-40"), None);
    }
}
