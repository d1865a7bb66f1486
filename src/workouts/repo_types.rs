use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::error::ValidationError;
use crate::nutrition::workouts::{Intensity, WorkoutType};

#[derive(Debug, FromRow)]
pub struct WorkoutRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_type: String,
    pub duration: i32,
    pub intensity: String,
    pub calories_burned: i32,
    pub notes: Option<String>,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub duration: i32,
    pub intensity: Intensity,
    pub calories_burned: i32,
    pub notes: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<WorkoutRow> for Workout {
    type Error = ValidationError;

    fn try_from(r: WorkoutRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            workout_type: r.workout_type.parse()?,
            duration: r.duration,
            intensity: r.intensity.parse()?,
            calories_burned: r.calories_burned,
            notes: r.notes,
            date: r.date,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub workout_type: WorkoutType,
    pub duration: i32,
    pub intensity: Intensity,
    pub calories_burned: i32,
    pub notes: Option<String>,
    pub date: Date,
}
