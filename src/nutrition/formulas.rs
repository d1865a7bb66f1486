//! Calorie and macro target arithmetic.
//!
//! All inputs are metric: kilograms, centimetres, years.

use serde::{Deserialize, Serialize};

use crate::enums::text_enum;

/// Kilocalories in one kilogram of body fat.
pub const KCAL_PER_KG: f64 = 7700.0;
const LB_PER_KG: f64 = 2.20462;
pub const SEDENTARY_MULTIPLIER: f64 = 1.2;
const PLANNED_WORKOUT_MINUTES: f64 = 60.0;

text_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
    }
}

text_enum! {
    pub enum ActivityLevel {
        Sedentary => "sedentary",
        Light => "light",
        Moderate => "moderate",
        Active => "active",
        VeryActive => "very_active",
    }
}

text_enum! {
    /// Selected weight-loss pace.
    pub enum WeightLossRate {
        Slow => "slow",
        Moderate => "moderate",
        Fast => "fast",
    }
}

text_enum! {
    /// The kind of training a user plans on, used for planned workout
    /// calories and the protein factor.
    pub enum WorkoutFocus {
        Cardio => "cardio",
        Strength => "strength",
        Mixed => "mixed",
    }
}

text_enum! {
    pub enum TdeeMethod {
        FullActivity => "full_activity",
        SedentaryPlusExercise => "sedentary_plus_exercise",
        Custom => "custom",
    }
}

impl Gender {
    /// Lowest daily calorie target ever suggested.
    pub fn calorie_floor(&self) -> i32 {
        match self {
            Gender::Male => 1500,
            Gender::Female => 1200,
        }
    }
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl WeightLossRate {
    /// Daily deficit in kcal.
    pub fn deficit(&self) -> i32 {
        match self {
            WeightLossRate::Slow => 250,
            WeightLossRate::Moderate => 500,
            WeightLossRate::Fast => 1000,
        }
    }
}

impl WorkoutFocus {
    fn kcal_per_minute(&self) -> f64 {
        match self {
            WorkoutFocus::Cardio => 8.0,
            WorkoutFocus::Strength => 6.0,
            WorkoutFocus::Mixed => 7.0,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate.
pub fn bmr(gender: Gender, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Activity-adjusted expenditure, excluding planned workouts.
pub fn tdee(bmr: f64, method: TdeeMethod, use_multiplier: bool, activity: ActivityLevel) -> f64 {
    match method {
        TdeeMethod::FullActivity if use_multiplier => bmr * activity.multiplier(),
        TdeeMethod::FullActivity => bmr,
        TdeeMethod::SedentaryPlusExercise => bmr * SEDENTARY_MULTIPLIER,
        TdeeMethod::Custom => bmr,
    }
}

/// Average daily burn from the planned workout schedule.
pub fn planned_workout_calories_per_day(weight_kg: f64, frequency: u32, focus: WorkoutFocus) -> f64 {
    if frequency == 0 {
        return 0.0;
    }
    let weight_lb = weight_kg * LB_PER_KG;
    let per_workout = (focus.kcal_per_minute() * PLANNED_WORKOUT_MINUTES / 150.0 * weight_lb).round();
    per_workout * f64::from(frequency) / 7.0
}

pub fn calories_target(energy_out: f64, deficit: i32, gender: Gender) -> i32 {
    let nominal = (energy_out - f64::from(deficit)).round() as i32;
    nominal.max(gender.calorie_floor())
}

pub fn protein_grams_per_kg(focus: WorkoutFocus, frequency: u32) -> f64 {
    if focus == WorkoutFocus::Strength {
        2.0
    } else if frequency >= 5 {
        1.8
    } else {
        1.6
    }
}

pub fn protein_target(weight_kg: f64, focus: WorkoutFocus, frequency: u32) -> i32 {
    (weight_kg * protein_grams_per_kg(focus, frequency)).round() as i32
}

/// Kilograms lost per week at a steady daily deficit.
pub fn weekly_weight_change(daily_deficit: f64) -> f64 {
    daily_deficit * 7.0 / KCAL_PER_KG
}

pub fn weeks_to_goal(starting_kg: f64, target_kg: f64, weekly_change_kg: f64) -> Option<u32> {
    let to_lose = starting_kg - target_kg;
    if to_lose <= 0.0 || weekly_change_kg <= 0.0 {
        return None;
    }
    Some((to_lose / weekly_change_kg).ceil() as u32)
}

/// Everything a profile's targets are computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInputs {
    pub gender: Gender,
    pub age: u32,
    pub height: f64,
    pub starting_weight: f64,
    pub target_weight: f64,
    pub activity_level: ActivityLevel,
    pub workout_frequency: u32,
    pub workout_type: WorkoutFocus,
    pub weight_loss_rate: WeightLossRate,
    pub tdee_calculation_method: TdeeMethod,
    pub use_tdee_multiplier: bool,
    pub include_workout_calories: bool,
    #[serde(default)]
    pub overrides: ManualTargets,
}

/// Values a user typed in by hand; each one replaces its computed
/// counterpart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManualTargets {
    pub basal_calories: Option<f64>,
    pub calories_target: Option<i32>,
    pub protein_target: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Targets {
    pub bmr: f64,
    pub tdee: f64,
    pub workout_calories_per_day: f64,
    pub deficit: i32,
    pub calories_target: i32,
    pub protein_target: i32,
    pub weekly_weight_loss: f64,
    pub weeks_to_goal: Option<u32>,
}

pub fn compute_targets(inputs: &TargetInputs) -> Targets {
    let bmr = match inputs.overrides.basal_calories {
        Some(basal) if basal > 0.0 => basal,
        _ => bmr(
            inputs.gender,
            inputs.starting_weight,
            inputs.height,
            inputs.age,
        ),
    };
    let tdee = tdee(
        bmr,
        inputs.tdee_calculation_method,
        inputs.use_tdee_multiplier,
        inputs.activity_level,
    );
    let workout_calories_per_day = if inputs.include_workout_calories
        && inputs.tdee_calculation_method != TdeeMethod::Custom
    {
        planned_workout_calories_per_day(
            inputs.starting_weight,
            inputs.workout_frequency,
            inputs.workout_type,
        )
    } else {
        0.0
    };
    let deficit = inputs.weight_loss_rate.deficit();
    let calories_target = inputs
        .overrides
        .calories_target
        .unwrap_or_else(|| calories_target(tdee + workout_calories_per_day, deficit, inputs.gender));
    let protein_target = inputs.overrides.protein_target.unwrap_or_else(|| {
        protein_target(
            inputs.starting_weight,
            inputs.workout_type,
            inputs.workout_frequency,
        )
    });
    let weekly_weight_loss = weekly_weight_change(f64::from(deficit));

    Targets {
        bmr,
        tdee,
        workout_calories_per_day,
        deficit,
        calories_target,
        protein_target,
        weekly_weight_loss,
        weeks_to_goal: weeks_to_goal(inputs.starting_weight, inputs.target_weight, weekly_weight_loss),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male_90kg() -> TargetInputs {
        TargetInputs {
            gender: Gender::Male,
            age: 30,
            height: 180.0,
            starting_weight: 90.0,
            target_weight: 80.0,
            activity_level: ActivityLevel::Moderate,
            workout_frequency: 0,
            workout_type: WorkoutFocus::Mixed,
            weight_loss_rate: WeightLossRate::Moderate,
            tdee_calculation_method: TdeeMethod::FullActivity,
            use_tdee_multiplier: true,
            include_workout_calories: true,
            overrides: ManualTargets::default(),
        }
    }

    #[test]
    fn bmr_matches_mifflin_st_jeor() {
        assert_eq!(bmr(Gender::Male, 90.0, 180.0, 30), 1880.0);
        assert_eq!(bmr(Gender::Female, 90.0, 180.0, 30), 1714.0);
        assert_eq!(bmr(Gender::Female, 62.5, 165.0, 41), 10.0 * 62.5 + 6.25 * 165.0 - 205.0 - 161.0);
    }

    #[test]
    fn tdee_without_multiplier_is_bmr() {
        for level in [ActivityLevel::Sedentary, ActivityLevel::VeryActive] {
            assert_eq!(tdee(1880.0, TdeeMethod::FullActivity, false, level), 1880.0);
        }
        assert_eq!(tdee(1880.0, TdeeMethod::Custom, true, ActivityLevel::Active), 1880.0);
    }

    #[test]
    fn tdee_by_method() {
        let moderate = tdee(1880.0, TdeeMethod::FullActivity, true, ActivityLevel::Moderate);
        assert!((moderate - 2914.0).abs() < 1e-9);
        let sedentary = tdee(1880.0, TdeeMethod::SedentaryPlusExercise, true, ActivityLevel::VeryActive);
        assert!((sedentary - 2256.0).abs() < 1e-9);
    }

    #[test]
    fn worked_example_male_moderate() {
        let t = compute_targets(&male_90kg());
        assert_eq!(t.bmr, 1880.0);
        assert_eq!(t.tdee.round(), 2914.0);
        assert_eq!(t.deficit, 500);
        assert_eq!(t.calories_target, 2414);
        assert_eq!(t.protein_target, 144);
    }

    #[test]
    fn calories_target_is_floored_by_gender() {
        assert_eq!(calories_target(1400.0, 1000, Gender::Male), 1500);
        assert_eq!(calories_target(1400.0, 1000, Gender::Female), 1200);
        assert_eq!(calories_target(2000.0, 250, Gender::Female), 1750);

        let mut small = male_90kg();
        small.gender = Gender::Female;
        small.starting_weight = 50.0;
        small.height = 150.0;
        small.age = 70;
        small.activity_level = ActivityLevel::Sedentary;
        small.weight_loss_rate = WeightLossRate::Fast;
        assert_eq!(compute_targets(&small).calories_target, 1200);
    }

    #[test]
    fn protein_factor_by_training() {
        assert_eq!(protein_target(100.0, WorkoutFocus::Mixed, 3), 160);
        assert_eq!(protein_target(100.0, WorkoutFocus::Strength, 1), 200);
        assert_eq!(protein_target(100.0, WorkoutFocus::Cardio, 5), 180);
        assert_eq!(protein_target(50.0, WorkoutFocus::Cardio, 5), 90);
    }

    #[test]
    fn deficits_per_rate() {
        assert_eq!(WeightLossRate::Slow.deficit(), 250);
        assert_eq!(WeightLossRate::Moderate.deficit(), 500);
        assert_eq!(WeightLossRate::Fast.deficit(), 1000);
    }

    #[test]
    fn planned_workouts_raise_the_target() {
        // 90 kg = 198.4158 lb; mixed 7 kcal/min * 60 / 150 * lb = 555.56 -> 556 per workout.
        let per_day = planned_workout_calories_per_day(90.0, 3, WorkoutFocus::Mixed);
        assert!((per_day - 556.0 * 3.0 / 7.0).abs() < 1e-9);

        let mut inputs = male_90kg();
        inputs.workout_frequency = 3;
        let t = compute_targets(&inputs);
        assert_eq!(t.calories_target, (2914.0 + per_day - 500.0).round() as i32);

        inputs.include_workout_calories = false;
        assert_eq!(compute_targets(&inputs).calories_target, 2414);
    }

    #[test]
    fn custom_method_ignores_workouts() {
        let mut inputs = male_90kg();
        inputs.workout_frequency = 4;
        inputs.tdee_calculation_method = TdeeMethod::Custom;
        let t = compute_targets(&inputs);
        assert_eq!(t.workout_calories_per_day, 0.0);
        assert_eq!(t.tdee, 1880.0);
    }

    #[test]
    fn manual_overrides_win() {
        let mut inputs = male_90kg();
        inputs.overrides = ManualTargets {
            basal_calories: Some(2000.0),
            calories_target: None,
            protein_target: Some(170),
        };
        let t = compute_targets(&inputs);
        assert_eq!(t.bmr, 2000.0);
        assert_eq!(t.calories_target, (2000.0f64 * 1.55 - 500.0).round() as i32);
        assert_eq!(t.protein_target, 170);

        inputs.overrides.calories_target = Some(1800);
        assert_eq!(compute_targets(&inputs).calories_target, 1800);
    }

    #[test]
    fn weekly_change_and_weeks_to_goal() {
        assert!((weekly_weight_change(500.0) - 3500.0 / 7700.0).abs() < 1e-12);
        let weekly = weekly_weight_change(1000.0);
        assert_eq!(weeks_to_goal(90.0, 81.0, weekly), Some(10));
        assert_eq!(weeks_to_goal(80.0, 85.0, weekly), None);
        assert_eq!(weeks_to_goal(90.0, 80.0, 0.0), None);
    }

    #[test]
    fn multipliers_table() {
        let expected = [1.2, 1.375, 1.55, 1.725, 1.9];
        let levels = [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ];
        for (level, m) in levels.iter().zip(expected) {
            assert_eq!(level.multiplier(), m);
        }
    }
}
