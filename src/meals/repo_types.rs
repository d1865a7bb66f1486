use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::enums::text_enum;
use crate::error::ValidationError;
use crate::llm::analysis::{lenient_f64, null_as_default};

text_enum! {
    pub enum MealType {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
        NightSnack => "night_snack",
    }
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Snack,
        MealType::Dinner,
        MealType::NightSnack,
    ];
}

#[derive(Debug, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_type: String,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub portion_size: Option<String>,
    pub photo_url: Option<String>,
    pub date: Date,
    pub time: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub portion_size: Option<String>,
    pub photo_url: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub time: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<MealRow> for Meal {
    type Error = ValidationError;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            meal_type: r.meal_type.parse()?,
            description: r.description,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            portion_size: r.portion_size,
            photo_url: r.photo_url,
            date: r.date,
            time: r.time,
            created_at: r.created_at,
        })
    }
}

/// Fields of a meal before it is stored.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub meal_type: MealType,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub portion_size: Option<String>,
    pub photo_url: Option<String>,
    pub date: Date,
    pub time: Option<String>,
}

/// One identified food inside an analysed meal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FoodItem {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub portion: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub fat: f64,
}

#[derive(Debug, FromRow)]
pub struct NutritionAnalysisRow {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub net_carbs: f64,
    pub fat: f64,
    pub keto_friendly: bool,
    pub low_carb_friendly: bool,
    pub food_items: Json<Vec<FoodItem>>,
    pub analysis_date: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionAnalysis {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub net_carbs: f64,
    pub fat: f64,
    pub keto_friendly: bool,
    pub low_carb_friendly: bool,
    pub food_items: Vec<FoodItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub analysis_date: OffsetDateTime,
}

impl From<NutritionAnalysisRow> for NutritionAnalysis {
    fn from(r: NutritionAnalysisRow) -> Self {
        Self {
            id: r.id,
            meal_id: r.meal_id,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fiber: r.fiber,
            net_carbs: r.net_carbs,
            fat: r.fat,
            keto_friendly: r.keto_friendly,
            low_carb_friendly: r.low_carb_friendly,
            food_items: r.food_items.0,
            analysis_date: r.analysis_date,
        }
    }
}

/// Analysis values before they are attached to a stored meal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNutritionAnalysis {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub net_carbs: f64,
    pub fat: f64,
    pub keto_friendly: bool,
    pub low_carb_friendly: bool,
    pub food_items: Vec<FoodItem>,
}

/// Calories and macros a user corrects by hand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroValues {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}
