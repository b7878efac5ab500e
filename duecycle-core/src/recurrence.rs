//! Recurrence rules: next theoretical occurrence of a repeating task.
//!
//! Pure calendar arithmetic on dates. Time of day is the caller's concern.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::task::Repeat;

/// Next occurrence after `base` under `rule`.
///
/// `Repeat::None` returns `base` unchanged, so callers must not loop on it.
/// If the result would leave chrono's supported range, `base` is returned.
pub fn next_occurrence(base: NaiveDate, rule: Repeat) -> NaiveDate {
    let next = match rule {
        Repeat::None => Some(base),
        Repeat::Daily => base.checked_add_days(Days::new(1)),
        Repeat::Weekdays => next_weekday(base),
        Repeat::Weekly => base.checked_add_days(Days::new(7)),
        Repeat::BiWeekly => base.checked_add_days(Days::new(14)),
        // chrono clamps to the last day of a shorter month.
        Repeat::Monthly => base.checked_add_months(Months::new(1)),
        Repeat::Custom(n) => base.checked_add_days(Days::new(u64::from(n.get()))),
    };
    next.unwrap_or(base)
}

fn next_weekday(base: NaiveDate) -> Option<NaiveDate> {
    let mut d = base.checked_add_days(Days::new(1))?;
    while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
        d = d.checked_add_days(Days::new(1))?;
    }
    Some(d)
}

/// Same day-of-month `months` later, clamped to the target month's length.
pub fn add_months_clamped(base: NaiveDate, months: u32) -> NaiveDate {
    base.checked_add_months(Months::new(months)).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(next_occurrence(d(2024, 1, 31), Repeat::Monthly), d(2024, 2, 29));
        assert_eq!(next_occurrence(d(2023, 1, 31), Repeat::Monthly), d(2023, 2, 28));
        assert_eq!(next_occurrence(d(1900, 1, 31), Repeat::Monthly), d(1900, 2, 28));
        assert_eq!(next_occurrence(d(2000, 1, 30), Repeat::Monthly), d(2000, 2, 29));
        assert_eq!(next_occurrence(d(2024, 12, 15), Repeat::Monthly), d(2025, 1, 15));
    }

    #[test]
    fn weekdays_skip_weekend() {
        // 2024-03-08 is a Friday.
        assert_eq!(next_occurrence(d(2024, 3, 8), Repeat::Weekdays), d(2024, 3, 11));
        // Saturday base lands on Monday.
        assert_eq!(next_occurrence(d(2024, 3, 9), Repeat::Weekdays), d(2024, 3, 11));
        assert_eq!(next_occurrence(d(2024, 3, 11), Repeat::Weekdays), d(2024, 3, 12));
    }

    #[test]
    fn fixed_day_rules() {
        let base = d(2024, 2, 27);
        assert_eq!(next_occurrence(base, Repeat::Daily), d(2024, 2, 28));
        assert_eq!(next_occurrence(base, Repeat::Weekly), d(2024, 3, 5));
        assert_eq!(next_occurrence(base, Repeat::BiWeekly), d(2024, 3, 12));
        let every_ten = Repeat::Custom(NonZeroU32::new(10).unwrap());
        assert_eq!(next_occurrence(base, every_ten), d(2024, 3, 8));
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(next_occurrence(d(2024, 5, 1), Repeat::None), d(2024, 5, 1));
    }

    #[test]
    fn overflow_returns_base() {
        assert_eq!(next_occurrence(NaiveDate::MAX, Repeat::Daily), NaiveDate::MAX);
    }
}
