use serde::{Deserialize, Serialize};
use time::Date;

use crate::achievements::repo::Achievement;
use crate::dates::iso_date;
use crate::error::ValidationError;
use crate::meals::repo_types::{Meal, MealType, NutritionAnalysis};

#[derive(Debug, Deserialize)]
pub struct MealQuery {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl MealQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit <= 0 {
            return Err(ValidationError::NotPositive { field: "limit" });
        }
        if self.offset < 0 {
            return Err(ValidationError::Negative { field: "offset" });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub description: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    pub portion_size: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealRequest {
    #[serde(rename = "type")]
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub portion_size: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub time: Option<String>,
}

/// A meal with its like count and whether the caller liked it.
#[derive(Debug, Serialize)]
pub struct LikedMeal {
    #[serde(flatten)]
    pub meal: Meal,
    pub likes: i64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub meal: LikedMeal,
    pub analysis: Option<NutritionAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub meals: Vec<LikedMeal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<Achievement>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes: i64,
    pub liked: bool,
}
