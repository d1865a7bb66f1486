use std::collections::HashMap;

use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateMealRequest, LikedMeal, UpdateMealRequest};
use super::repo::MealUpdate;
use super::repo_types::{Meal, NewMeal};
use crate::dates::{clock_time, is_valid_clock_time};
use crate::error::ValidationError;

fn check_time(time: Option<String>) -> Result<Option<String>, ValidationError> {
    match time {
        Some(t) if !is_valid_clock_time(&t) => Err(ValidationError::InvalidTime(t)),
        other => Ok(other),
    }
}

fn check_macros(values: [(&'static str, Option<f64>); 4]) -> Result<(), ValidationError> {
    for (field, value) in values {
        if matches!(value, Some(v) if v < 0.0 || !v.is_finite()) {
            return Err(ValidationError::Negative { field });
        }
    }
    Ok(())
}

/// Builds a meal from a manual entry; date and time default to `now`.
pub fn new_meal(req: CreateMealRequest, now: OffsetDateTime) -> Result<NewMeal, ValidationError> {
    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(ValidationError::Missing { field: "description" });
    }
    check_macros([
        ("calories", Some(req.calories)),
        ("protein", Some(req.protein)),
        ("carbs", Some(req.carbs)),
        ("fat", Some(req.fat)),
    ])?;
    let time = check_time(req.time)?.unwrap_or_else(|| clock_time(now));
    Ok(NewMeal {
        meal_type: req.meal_type,
        description,
        calories: req.calories,
        protein: req.protein,
        carbs: req.carbs,
        fat: req.fat,
        portion_size: req.portion_size.filter(|p| !p.trim().is_empty()),
        photo_url: req.photo_url.filter(|p| !p.trim().is_empty()),
        date: req.date.unwrap_or(now.date()),
        time: Some(time),
    })
}

pub fn meal_update(req: UpdateMealRequest) -> Result<MealUpdate, ValidationError> {
    if matches!(&req.description, Some(d) if d.trim().is_empty()) {
        return Err(ValidationError::Missing { field: "description" });
    }
    check_macros([
        ("calories", req.calories),
        ("protein", req.protein),
        ("carbs", req.carbs),
        ("fat", req.fat),
    ])?;
    Ok(MealUpdate {
        meal_type: req.meal_type,
        description: req.description.map(|d| d.trim().to_string()),
        calories: req.calories,
        protein: req.protein,
        carbs: req.carbs,
        fat: req.fat,
        portion_size: req.portion_size,
        date: req.date,
        time: check_time(req.time)?,
    })
}

/// Pairs meals with `(meal_id, likes, liked_by_caller)` rows; meals without
/// a row have no likes.
pub fn with_likes(meals: Vec<Meal>, stats: Vec<(Uuid, i64, bool)>) -> Vec<LikedMeal> {
    let by_meal: HashMap<Uuid, (i64, bool)> = stats
        .into_iter()
        .map(|(id, likes, liked)| (id, (likes, liked)))
        .collect();
    meals
        .into_iter()
        .map(|meal| {
            let (likes, liked) = by_meal.get(&meal.id).copied().unwrap_or((0, false));
            LikedMeal { meal, likes, liked }
        })
        .collect()
}
