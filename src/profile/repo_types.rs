use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::nutrition::daily::EnergyPlan;
use crate::nutrition::formulas::{
    ActivityLevel, Gender, ManualTargets, TargetInputs, TdeeMethod, WeightLossRate, WorkoutFocus,
};

pub(super) const PROFILE_COLUMNS: &str = "id, user_id, height, starting_weight, target_weight, age, \
    gender, activity_level, workout_frequency, workout_type, weight_loss_rate, bmr, basal_calories, \
    tdee, calories_target, protein_target, tdee_calculation_method, use_tdee_multiplier, \
    include_workout_calories, completed_questionnaire, updated_at";

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub height: f64,
    pub starting_weight: f64,
    pub target_weight: f64,
    pub age: i32,
    pub gender: String,
    pub activity_level: String,
    pub workout_frequency: i32,
    pub workout_type: String,
    pub weight_loss_rate: String,
    pub bmr: f64,
    pub basal_calories: Option<f64>,
    pub tdee: f64,
    pub calories_target: i32,
    pub protein_target: i32,
    pub tdee_calculation_method: String,
    pub use_tdee_multiplier: bool,
    pub include_workout_calories: bool,
    pub completed_questionnaire: bool,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub height: f64,
    pub starting_weight: f64,
    pub target_weight: f64,
    pub age: i32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub workout_frequency: i32,
    pub workout_type: WorkoutFocus,
    pub weight_loss_rate: WeightLossRate,
    pub bmr: f64,
    pub basal_calories: Option<f64>,
    pub tdee: f64,
    pub calories_target: i32,
    pub protein_target: i32,
    pub tdee_calculation_method: TdeeMethod,
    pub use_tdee_multiplier: bool,
    pub include_workout_calories: bool,
    pub completed_questionnaire: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = ValidationError;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            height: r.height,
            starting_weight: r.starting_weight,
            target_weight: r.target_weight,
            age: r.age,
            gender: r.gender.parse()?,
            activity_level: r.activity_level.parse()?,
            workout_frequency: r.workout_frequency,
            workout_type: r.workout_type.parse()?,
            weight_loss_rate: r.weight_loss_rate.parse()?,
            bmr: r.bmr,
            basal_calories: r.basal_calories,
            tdee: r.tdee,
            calories_target: r.calories_target,
            protein_target: r.protein_target,
            tdee_calculation_method: r.tdee_calculation_method.parse()?,
            use_tdee_multiplier: r.use_tdee_multiplier,
            include_workout_calories: r.include_workout_calories,
            completed_questionnaire: r.completed_questionnaire,
            updated_at: r.updated_at,
        })
    }
}

impl UserProfile {
    /// Manual basal calories when set, otherwise the stored BMR.
    pub fn basal(&self) -> f64 {
        match self.basal_calories {
            Some(b) if b > 0.0 => b,
            _ => self.bmr,
        }
    }

    pub fn energy_plan(&self) -> EnergyPlan {
        EnergyPlan {
            gender: self.gender,
            basal_calories: self.basal(),
            activity_level: self.activity_level,
            use_tdee_multiplier: self.use_tdee_multiplier,
            method: self.tdee_calculation_method,
            include_workout_calories: self.include_workout_calories,
            deficit: self.weight_loss_rate.deficit(),
            calories_target: self.calories_target,
            protein_target: self.protein_target,
        }
    }
}

/// Questionnaire answers or profile-editor fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub height: f64,
    pub starting_weight: f64,
    pub target_weight: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub workout_frequency: u32,
    pub workout_type: WorkoutFocus,
    pub weight_loss_rate: WeightLossRate,
    #[serde(default = "default_method")]
    pub tdee_calculation_method: TdeeMethod,
    #[serde(default = "default_true")]
    pub use_tdee_multiplier: bool,
    #[serde(default = "default_true")]
    pub include_workout_calories: bool,
    #[serde(default)]
    pub basal_calories: Option<f64>,
    #[serde(default)]
    pub calories_target: Option<i32>,
    #[serde(default)]
    pub protein_target: Option<i32>,
    /// Name to greet the user with; only applied on first save.
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_method() -> TdeeMethod {
    TdeeMethod::FullActivity
}

fn default_true() -> bool {
    true
}

impl ProfileInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("height", self.height),
            ("starting_weight", self.starting_weight),
            ("target_weight", self.target_weight),
            ("age", f64::from(self.age)),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ValidationError::NotPositive { field });
            }
        }
        Ok(())
    }

    pub fn target_inputs(&self) -> TargetInputs {
        TargetInputs {
            gender: self.gender,
            age: self.age,
            height: self.height,
            starting_weight: self.starting_weight,
            target_weight: self.target_weight,
            activity_level: self.activity_level,
            workout_frequency: self.workout_frequency,
            workout_type: self.workout_type,
            weight_loss_rate: self.weight_loss_rate,
            tdee_calculation_method: self.tdee_calculation_method,
            use_tdee_multiplier: self.use_tdee_multiplier,
            include_workout_calories: self.include_workout_calories,
            overrides: ManualTargets {
                basal_calories: self.basal_calories.filter(|b| *b > 0.0),
                calories_target: self.calories_target.filter(|c| *c > 0),
                protein_target: self.protein_target.filter(|p| *p > 0),
            },
        }
    }
}
