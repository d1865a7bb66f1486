use serde::Serialize;
use time::Date;

use super::formulas::{
    tdee, weekly_weight_change, ActivityLevel, Gender, TdeeMethod, SEDENTARY_MULTIPLIER,
};
use crate::dates::iso_date;
use crate::meals::repo_types::{Meal, MealType};
use crate::workouts::repo_types::Workout;

/// The parts of a profile the day's energy balance is computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyPlan {
    pub gender: Gender,
    /// Manual basal calories when set, otherwise the computed BMR.
    pub basal_calories: f64,
    pub activity_level: ActivityLevel,
    pub use_tdee_multiplier: bool,
    pub method: TdeeMethod,
    pub include_workout_calories: bool,
    pub deficit: i32,
    pub calories_target: i32,
    pub protein_target: i32,
}

impl EnergyPlan {
    /// Maintenance calories before today's logged workouts.
    fn base_out(&self) -> i32 {
        match self.method {
            TdeeMethod::Custom if self.calories_target > 0 => self.calories_target + self.deficit,
            TdeeMethod::Custom => self.basal_calories.round() as i32,
            method => tdee(
                self.basal_calories,
                method,
                self.use_tdee_multiplier,
                self.activity_level,
            )
            .round() as i32,
        }
    }

    fn counted_workouts(&self, logged_workout_calories: i32) -> i32 {
        if self.include_workout_calories && self.method != TdeeMethod::Custom {
            logged_workout_calories
        } else {
            0
        }
    }

    /// Calories to eat today.
    pub fn adjusted_target(&self, logged_workout_calories: i32) -> i32 {
        match self.method {
            TdeeMethod::Custom if self.calories_target > 0 => self.calories_target,
            TdeeMethod::Custom => self.basal_calories.round() as i32,
            _ => (self.base_out() + self.counted_workouts(logged_workout_calories) - self.deficit)
                .max(self.gender.calorie_floor()),
        }
    }

    /// Calories burned by daily activity on top of the basal rate.
    pub fn activity_calories(&self) -> i32 {
        if self.basal_calories <= 0.0 {
            return 0;
        }
        match self.method {
            TdeeMethod::FullActivity if self.use_tdee_multiplier => {
                (self.basal_calories * self.activity_level.multiplier() - self.basal_calories)
                    .round() as i32
            }
            TdeeMethod::SedentaryPlusExercise => {
                (self.basal_calories * SEDENTARY_MULTIPLIER - self.basal_calories).round() as i32
            }
            _ => 0,
        }
    }

    pub fn calories_out(&self, logged_workout_calories: i32) -> i32 {
        self.base_out() + self.counted_workouts(logged_workout_calories)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn of<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> Self {
        meals.into_iter().fold(Self::default(), |acc, m| Self {
            calories: acc.calories + m.calories,
            protein: acc.protein + m.protein,
            carbs: acc.carbs + m.carbs,
            fat: acc.fat + m.fat,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealTypeGroup {
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub calories: f64,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub consumed: MacroTotals,
    pub basal_calories: f64,
    pub activity_calories: i32,
    pub workout_calories: i32,
    pub calories_out: i32,
    pub calories_target: i32,
    pub calories_remaining: i32,
    pub calories_percentage: i32,
    pub over_by: Option<i32>,
    pub protein_target: i32,
    pub protein_remaining: f64,
    pub protein_percentage: i32,
    pub expected_deficit: i32,
    pub projected_weekly_change: f64,
    pub meals_by_type: Vec<MealTypeGroup>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn percentage(part: f64, whole: f64) -> i32 {
    if whole <= 0.0 {
        return 0;
    }
    ((part / whole * 100.0).round() as i32).min(100)
}

/// Energy balance for `date`. Meals and workouts from other days are
/// ignored. Without a plan every target is zero.
pub fn summarize_day(
    plan: Option<&EnergyPlan>,
    date: Date,
    meals: Vec<Meal>,
    workouts: &[Workout],
) -> DailySummary {
    let meals: Vec<Meal> = meals.into_iter().filter(|m| m.date == date).collect();
    let workout_calories: i32 = workouts
        .iter()
        .filter(|w| w.date == date)
        .map(|w| w.calories_burned)
        .sum();

    let mut consumed = MacroTotals::of(&meals);
    consumed.protein = round2(consumed.protein);

    let (basal_calories, activity_calories, calories_out, calories_target, protein_target) =
        match plan {
            Some(p) => (
                p.basal_calories,
                p.activity_calories(),
                p.calories_out(workout_calories),
                p.adjusted_target(workout_calories),
                p.protein_target,
            ),
            None => (0.0, 0, 0, 0, 0),
        };

    let consumed_kcal = consumed.calories.round() as i32;
    let over = consumed_kcal - calories_target;
    let expected_deficit = (calories_out - consumed_kcal).max(0);

    let meals_by_type = MealType::ALL
        .iter()
        .map(|&meal_type| {
            let of_type: Vec<Meal> = meals
                .iter()
                .filter(|m| m.meal_type == meal_type)
                .cloned()
                .collect();
            MealTypeGroup {
                meal_type,
                calories: of_type.iter().map(|m| m.calories).sum(),
                meals: of_type,
            }
        })
        .collect();

    DailySummary {
        date,
        basal_calories,
        activity_calories,
        workout_calories,
        calories_out,
        calories_target,
        calories_remaining: (-over).max(0),
        calories_percentage: percentage(consumed.calories, f64::from(calories_target)),
        over_by: (calories_target > 0 && over > 0).then_some(over),
        protein_target,
        protein_remaining: if protein_target > 0 {
            round2((f64::from(protein_target) - consumed.protein).max(0.0))
        } else {
            0.0
        },
        protein_percentage: percentage(consumed.protein, f64::from(protein_target)),
        expected_deficit,
        projected_weekly_change: weekly_weight_change(f64::from(expected_deficit)),
        consumed,
        meals_by_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::workouts::{Intensity, WorkoutType};
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn plan() -> EnergyPlan {
        EnergyPlan {
            gender: Gender::Male,
            basal_calories: 1880.0,
            activity_level: ActivityLevel::Moderate,
            use_tdee_multiplier: true,
            method: TdeeMethod::FullActivity,
            include_workout_calories: true,
            deficit: 500,
            calories_target: 2414,
            protein_target: 144,
        }
    }

    fn meal(meal_type: MealType, calories: f64, protein: f64, date: Date) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            meal_type,
            description: "meal".into(),
            calories,
            protein,
            carbs: 10.0,
            fat: 5.0,
            portion_size: None,
            photo_url: None,
            date,
            time: None,
            created_at: datetime!(2025-03-10 12:00 UTC),
        }
    }

    fn workout(calories_burned: i32, date: Date) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            workout_type: WorkoutType::Cardio,
            duration: 30,
            intensity: Intensity::Medium,
            calories_burned,
            notes: None,
            date,
            created_at: datetime!(2025-03-10 08:00 UTC),
        }
    }

    #[test]
    fn full_activity_target_adds_logged_workouts() {
        let p = plan();
        assert_eq!(p.adjusted_target(0), 2414);
        assert_eq!(p.adjusted_target(300), 2714);
        assert_eq!(p.activity_calories(), 1034);
        assert_eq!(p.calories_out(300), 3214);

        let mut no_workouts = plan();
        no_workouts.include_workout_calories = false;
        assert_eq!(no_workouts.adjusted_target(300), 2414);
    }

    #[test]
    fn multiplier_off_uses_basal() {
        let mut p = plan();
        p.use_tdee_multiplier = false;
        assert_eq!(p.adjusted_target(0), 1500);
        assert_eq!(p.activity_calories(), 0);
        assert_eq!(p.calories_out(0), 1880);
    }

    #[test]
    fn sedentary_plus_exercise_and_custom() {
        let mut p = plan();
        p.method = TdeeMethod::SedentaryPlusExercise;
        assert_eq!(p.adjusted_target(200), 2256 + 200 - 500);
        assert_eq!(p.activity_calories(), 376);

        p.method = TdeeMethod::Custom;
        p.calories_target = 1700;
        assert_eq!(p.adjusted_target(400), 1700);
        assert_eq!(p.calories_out(400), 2200);
    }

    #[test]
    fn floor_applies_to_computed_targets() {
        let mut p = plan();
        p.gender = Gender::Female;
        p.basal_calories = 1100.0;
        p.use_tdee_multiplier = false;
        p.deficit = 1000;
        assert_eq!(p.adjusted_target(0), 1200);
    }

    #[test]
    fn summary_sums_only_the_selected_day() {
        let day = date!(2025 - 03 - 10);
        let meals = vec![
            meal(MealType::Breakfast, 400.0, 30.333, day),
            meal(MealType::Lunch, 700.0, 40.0, day),
            meal(MealType::Lunch, 100.0, 0.0, day),
            meal(MealType::Dinner, 900.0, 50.0, date!(2025 - 03 - 09)),
        ];
        let workouts = vec![workout(300, day), workout(500, date!(2025 - 03 - 09))];
        let s = summarize_day(Some(&plan()), day, meals, &workouts);

        assert_eq!(s.consumed.calories, 1200.0);
        assert_eq!(s.consumed.protein, 70.33);
        assert_eq!(s.workout_calories, 300);
        assert_eq!(s.calories_target, 2714);
        assert_eq!(s.calories_remaining, 1514);
        assert_eq!(s.calories_percentage, 44);
        assert_eq!(s.over_by, None);
        assert_eq!(s.protein_remaining, 73.67);
        assert_eq!(s.expected_deficit, 3214 - 1200);

        let lunch = s
            .meals_by_type
            .iter()
            .find(|g| g.meal_type == MealType::Lunch)
            .unwrap();
        assert_eq!(lunch.calories, 800.0);
        assert_eq!(lunch.meals.len(), 2);
        assert_eq!(s.meals_by_type.len(), 5);
    }

    #[test]
    fn overeating_caps_percentage_and_reports_excess() {
        let day = date!(2025 - 03 - 10);
        let meals = vec![meal(MealType::Dinner, 3000.0, 200.0, day)];
        let s = summarize_day(Some(&plan()), day, meals, &[]);
        assert_eq!(s.calories_remaining, 0);
        assert_eq!(s.calories_percentage, 100);
        assert_eq!(s.over_by, Some(586));
        assert_eq!(s.protein_percentage, 100);
        assert_eq!(s.protein_remaining, 0.0);
    }

    #[test]
    fn no_plan_means_no_targets() {
        let day = date!(2025 - 03 - 10);
        let s = summarize_day(None, day, vec![meal(MealType::Snack, 150.0, 3.0, day)], &[]);
        assert_eq!(s.calories_target, 0);
        assert_eq!(s.calories_percentage, 0);
        assert_eq!(s.protein_percentage, 0);
        assert_eq!(s.over_by, None);
    }
}
