use chrono::NaiveDate;
use serde::Serialize;

/// Streak state after one attempt was credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct StreakOutcome {
    pub current: i32,
    pub best: i32,
    pub updated: bool,
}

/// Daily streak arithmetic over calendar dates, not timestamps.
///
/// No prior activity starts a streak at 1; a second attempt on the same day
/// leaves it untouched; the next calendar day extends it; any longer gap
/// resets it to 1. `best` never decreases.
pub fn advance_streak(
    last_activity: Option<NaiveDate>,
    today: NaiveDate,
    current: i32,
    best: i32,
) -> StreakOutcome {
    let (current, updated) = match last_activity {
        None => (1, true),
        Some(last) => match (today - last).num_days() {
            0 => (current, false),
            1 => (current + 1, true),
            _ => (1, true),
        },
    };

    StreakOutcome {
        current,
        best: best.max(current),
        updated,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_activity_starts_at_one() {
        let out = advance_streak(None, date(2024, 3, 10), 0, 0);
        assert_eq!(out, StreakOutcome { current: 1, best: 1, updated: true });
    }

    #[test]
    fn same_day_leaves_streak_untouched() {
        let today = date(2024, 3, 10);
        let out = advance_streak(Some(today), today, 4, 6);
        assert_eq!(out, StreakOutcome { current: 4, best: 6, updated: false });
    }

    #[test]
    fn next_day_extends_streak() {
        let out = advance_streak(Some(date(2024, 3, 9)), date(2024, 3, 10), 4, 4);
        assert_eq!(out, StreakOutcome { current: 5, best: 5, updated: true });
    }

    #[test]
    fn gap_resets_but_best_is_kept() {
        let out = advance_streak(Some(date(2024, 3, 7)), date(2024, 3, 10), 6, 9);
        assert_eq!(out, StreakOutcome { current: 1, best: 9, updated: true });
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let out = advance_streak(Some(date(2024, 2, 29)), date(2024, 3, 1), 2, 2);
        assert_eq!(out, StreakOutcome { current: 3, best: 3, updated: true });
    }

    #[test]
    fn best_streak_is_monotonic() {
        let days = [
            date(2024, 3, 1),
            date(2024, 3, 2),
            date(2024, 3, 5), // gap, reset
            date(2024, 3, 6),
            date(2024, 3, 6), // same day
        ];
        let mut last = None;
        let mut current = 0;
        let mut best = 0;
        let mut prev_best = 0;
        for day in days {
            let out = advance_streak(last, day, current, best);
            assert!(out.best >= prev_best);
            assert!(out.best >= out.current);
            prev_best = out.best;
            current = out.current;
            best = out.best;
            last = Some(day);
        }
        assert_eq!(current, 2);
        assert_eq!(best, 2);
    }
}
