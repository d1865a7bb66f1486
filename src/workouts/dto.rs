use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates::iso_date;
use crate::nutrition::workouts::{Intensity, WorkoutType};

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub duration: i32,
    #[serde(default = "default_intensity")]
    pub intensity: Intensity,
    pub calories_burned: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

fn default_intensity() -> Intensity {
    Intensity::Medium
}

#[derive(Debug, Deserialize)]
pub struct WorkoutQuery {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    #[serde(default = "default_intensity")]
    pub intensity: Intensity,
    pub duration: u32,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub calories_burned: i32,
}
