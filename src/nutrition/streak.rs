use std::collections::HashSet;

use time::Date;

/// Streak lengths that earn an achievement.
pub const MILESTONES: [u32; 4] = [7, 30, 60, 90];

/// How far back a streak is followed.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// Consecutive days with at least one logged meal, counting back from
/// `today`. A day without meals ends the streak, so an unlogged today
/// gives zero.
pub fn current_streak(days_with_meals: &[Date], today: Date) -> u32 {
    let logged: HashSet<Date> = days_with_meals.iter().copied().collect();
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(d) = day {
        if streak >= MAX_LOOKBACK_DAYS || !logged.contains(&d) {
            break;
        }
        streak += 1;
        day = d.previous_day();
    }
    streak
}

pub fn is_milestone(streak: u32) -> bool {
    MILESTONES.contains(&streak)
}

pub fn streak_title(days: u32) -> String {
    format!("רצף של {days} ימים!")
}

pub fn streak_description(days: u32) -> String {
    format!("תיעדת את הארוחות שלך {days} ימים ברציפות! המשך כך!")
}

pub const WEIGHT_GOAL_TITLE: &str = "הגעת למשקל היעד!";

pub fn weight_goal_description(target_kg: f64) -> String {
    format!("הגעת למשקל היעד שלך של {target_kg} ק\"ג. כל הכבוד!")
}

/// Whether `weight_kg` meets the goal. A goal below the starting weight
/// is reached at or under the target, a goal above it at or over.
pub fn reached_weight_goal(starting_kg: f64, target_kg: f64, weight_kg: f64) -> bool {
    if target_kg <= 0.0 || (starting_kg - target_kg).abs() < f64::EPSILON {
        return false;
    }
    if target_kg < starting_kg {
        weight_kg <= target_kg
    } else {
        weight_kg >= target_kg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Duration};

    fn run(end: Date, len: i64) -> Vec<Date> {
        (0..len).map(|i| end - Duration::days(i)).collect()
    }

    #[test]
    fn counts_back_from_today() {
        let today = date!(2025 - 03 - 10);
        assert_eq!(current_streak(&run(today, 7), today), 7);
        let mut days = run(today, 3);
        days.extend(run(date!(2025 - 03 - 05), 10));
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn no_meal_today_means_no_streak() {
        let today = date!(2025 - 03 - 10);
        assert_eq!(current_streak(&run(date!(2025 - 03 - 09), 20), today), 0);
        assert_eq!(current_streak(&[], today), 0);
    }

    #[test]
    fn lookback_is_capped_at_a_year() {
        let today = date!(2025 - 03 - 10);
        assert_eq!(current_streak(&run(today, 500), today), MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn duplicate_dates_count_once() {
        let today = date!(2025 - 03 - 10);
        let days = vec![today, today, date!(2025 - 03 - 09)];
        assert_eq!(current_streak(&days, today), 2);
    }

    #[test]
    fn milestones_and_titles() {
        assert!(is_milestone(7));
        assert!(is_milestone(90));
        assert!(!is_milestone(8));
        assert_eq!(streak_title(30), "רצף של 30 ימים!");
    }

    #[test]
    fn weight_goal_direction() {
        assert!(reached_weight_goal(90.0, 80.0, 79.5));
        assert!(reached_weight_goal(90.0, 80.0, 80.0));
        assert!(!reached_weight_goal(90.0, 80.0, 80.1));
        assert!(reached_weight_goal(60.0, 65.0, 65.2));
        assert!(!reached_weight_goal(70.0, 70.0, 70.0));
    }
}
