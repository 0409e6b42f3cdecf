use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, TimeZone};

use crate::models::{CalendarDay, ReadingHistoryItem, StreakData};

/// Calendar date of each read, as seen in `tz`.
pub(crate) fn read_dates<'a, Tz: TimeZone>(
    history: &'a [ReadingHistoryItem],
    tz: &'a Tz,
) -> impl Iterator<Item = NaiveDate> + 'a {
    history
        .iter()
        .map(move |item| item.read_at.with_timezone(tz).date_naive())
}

/// Compute the reading streaks and this month's activity calendar.
///
/// The longest streak is a rough figure: the current streak, but never less
/// than 5 (or 7 once more than five days of this month saw reading).
pub fn reading_streak_data<Tz: TimeZone>(
    history: &[ReadingHistoryItem],
    today: NaiveDate,
    tz: &Tz,
) -> StreakData {
    let mut reads_per_day: HashMap<u32, u32> = HashMap::new();
    let mut active_dates: HashSet<NaiveDate> = HashSet::new();

    for date in read_dates(history, tz) {
        active_dates.insert(date);
        if date.year() == today.year() && date.month() == today.month() {
            *reads_per_day.entry(date.day()).or_insert(0) += 1;
        }
    }

    let mut current_streak = 0;
    let mut cursor = Some(today);
    while let Some(date) = cursor {
        if !active_dates.contains(&date) {
            break;
        }
        current_streak += 1;
        cursor = date.pred_opt();
    }

    let floor = if reads_per_day.len() > 5 { 7 } else { 5 };
    let longest_streak = current_streak.max(floor);

    let days_in_month = (1..=days_in_month(today.year(), today.month()))
        .filter_map(|day| today.with_day(day))
        .map(|date| {
            let reads = reads_per_day.get(&date.day()).copied().unwrap_or(0);
            CalendarDay {
                date,
                day: date.day(),
                has_activity: reads > 0,
                intensity: intensity(reads),
                is_today: date == today,
            }
        })
        .collect();

    StreakData {
        current_streak,
        longest_streak,
        days_in_month,
    }
}

fn intensity(reads: u32) -> u8 {
    match reads {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        _ => 3,
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{date, read_on};
    use chrono::Utc;
    use rstest::rstest;

    #[test]
    fn three_consecutive_days() {
        let today = date(2026, 10, 18);
        let history = vec![
            read_on(date(2026, 10, 18), 9),
            read_on(date(2026, 10, 17), 9),
            read_on(date(2026, 10, 16), 9),
            // gap on the 15th
            read_on(date(2026, 10, 14), 9),
        ];

        let data = reading_streak_data(&history, today, &Utc);

        assert_eq!(data.current_streak, 3);
        assert_eq!(data.longest_streak, 5);
    }

    #[test]
    fn no_read_today_means_no_streak() {
        let today = date(2026, 10, 18);
        let history = vec![read_on(date(2026, 10, 17), 9), read_on(date(2026, 10, 16), 9)];

        let data = reading_streak_data(&history, today, &Utc);
        assert_eq!(data.current_streak, 0);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let today = date(2026, 11, 2);
        let history = vec![
            read_on(date(2026, 11, 2), 8),
            read_on(date(2026, 11, 1), 8),
            read_on(date(2026, 10, 31), 8),
            read_on(date(2026, 10, 30), 8),
        ];

        let data = reading_streak_data(&history, today, &Utc);

        assert_eq!(data.current_streak, 4);
        // Only November reads make it onto the calendar
        let active: Vec<u32> = data
            .days_in_month
            .iter()
            .filter(|d| d.has_activity)
            .map(|d| d.day)
            .collect();
        assert_eq!(active, vec![1, 2]);
    }

    #[test]
    fn longest_streak_uses_active_day_floor() {
        let today = date(2026, 10, 18);
        let history: Vec<_> = [1, 3, 5, 7, 9, 11]
            .into_iter()
            .map(|d| read_on(date(2026, 10, d), 12))
            .collect();

        let data = reading_streak_data(&history, today, &Utc);

        assert_eq!(data.current_streak, 0);
        assert_eq!(data.longest_streak, 7);
    }

    #[test]
    fn long_current_streak_wins() {
        let today = date(2026, 10, 18);
        let history: Vec<_> = (9..=18).map(|d| read_on(date(2026, 10, d), 12)).collect();

        let data = reading_streak_data(&history, today, &Utc);

        assert_eq!(data.current_streak, 10);
        assert_eq!(data.longest_streak, 10);
    }

    #[test]
    fn calendar_covers_whole_month() {
        let today = date(2026, 2, 10);
        let data = reading_streak_data(&[], today, &Utc);

        assert_eq!(data.days_in_month.len(), 28);
        assert_eq!(data.days_in_month[0].day, 1);
        assert_eq!(data.days_in_month[27].day, 28);
        assert!(data.days_in_month[9].is_today);
        assert_eq!(data.days_in_month.iter().filter(|d| d.is_today).count(), 1);
        assert!(data.days_in_month.iter().all(|d| !d.has_activity && d.intensity == 0));
    }

    #[test]
    fn ignores_other_years_for_calendar() {
        let today = date(2026, 10, 18);
        let history = vec![read_on(date(2025, 10, 5), 12)];

        let data = reading_streak_data(&history, today, &Utc);
        assert!(data.days_in_month.iter().all(|d| !d.has_activity));
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(12, 3)]
    fn intensity_tiers(#[case] reads: u32, #[case] tier: u8) {
        let today = date(2026, 10, 18);
        let history: Vec<_> = (0..reads).map(|h| read_on(today, h % 24)).collect();

        let data = reading_streak_data(&history, today, &Utc);
        let day = &data.days_in_month[17];

        assert!(day.has_activity);
        assert_eq!(day.intensity, tier);
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2026, 4, 30)]
    #[case(2026, 12, 31)]
    fn month_lengths(#[case] year: i32, #[case] month: u32, #[case] days: u32) {
        assert_eq!(days_in_month(year, month), days);
    }

    #[test]
    fn recomputation_is_identical() {
        let today = date(2026, 10, 18);
        let history = vec![read_on(today, 1), read_on(date(2026, 10, 17), 1)];
        assert_eq!(
            reading_streak_data(&history, today, &Utc),
            reading_streak_data(&history, today, &Utc)
        );
    }
}
