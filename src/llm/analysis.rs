//! The structured answer to a meal-analysis prompt and its chat rendering.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{parse_json_text, LlmError};
use crate::meals::repo_types::{FoodItem, MacroValues, NewNutritionAnalysis};

/// Where the analysed meal came from; picks the reply heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Text,
    Photo,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct NutritionFacts {
    #[serde(deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub fiber: Option<f64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub net_carbs: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub fat: f64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MealAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub meal_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub identified_foods: Vec<FoodItem>,
    pub nutrition: NutritionFacts,
    #[serde(deserialize_with = "null_as_default")]
    pub is_keto_friendly: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_low_carb_friendly: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub nutrition_assessment: String,
    #[serde(deserialize_with = "null_as_default")]
    pub low_carb_optimization: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alternative_suggestions: Vec<String>,
}

impl MealAnalysis {
    /// Accepts the model answer as an object or as JSON text. An answer
    /// without a `nutrition` object is rejected.
    pub fn from_value(value: Value) -> Result<Self, LlmError> {
        let value = match value {
            Value::String(text) => parse_json_text(&text)?,
            other => other,
        };
        if !value.get("nutrition").is_some_and(Value::is_object) {
            return Err(LlmError::InvalidJson(
                "analysis has no nutrition object".into(),
            ));
        }
        serde_json::from_value(value).map_err(|e| LlmError::InvalidJson(e.to_string()))
    }

    pub fn fiber(&self) -> f64 {
        self.nutrition.fiber.unwrap_or(0.0)
    }

    /// Reported net carbs, or `carbs - fiber` when the model left them out.
    pub fn net_carbs(&self) -> f64 {
        match self.nutrition.net_carbs {
            Some(n) if n != 0.0 => n,
            _ => self.nutrition.carbs - self.fiber(),
        }
    }

    pub fn macros(&self) -> MacroValues {
        MacroValues {
            calories: self.nutrition.calories,
            protein: self.nutrition.protein,
            carbs: self.nutrition.carbs,
            fat: self.nutrition.fat,
        }
    }

    pub fn to_new_analysis(&self) -> NewNutritionAnalysis {
        NewNutritionAnalysis {
            calories: self.nutrition.calories,
            protein: self.nutrition.protein,
            carbs: self.nutrition.carbs,
            fiber: self.fiber(),
            net_carbs: self.net_carbs(),
            fat: self.nutrition.fat,
            keto_friendly: self.is_keto_friendly,
            low_carb_friendly: self.is_low_carb_friendly,
            food_items: self.identified_foods.clone(),
        }
    }

    /// The model's description, or `fallback` when it gave none.
    pub fn description_or(&self, fallback: &str) -> String {
        if self.meal_description.trim().is_empty() {
            fallback.to_string()
        } else {
            self.meal_description.clone()
        }
    }

    /// Nutritionist reply shown in the chat after an analysis.
    pub fn render_message(&self, source: AnalysisSource) -> String {
        let mut out = String::new();
        match source {
            AnalysisSource::Text => out.push_str("**ניתוח הארוחה שלך**\n\n"),
            AnalysisSource::Photo => {
                out.push_str("**ניתוח הארוחה בתמונה**\n\n");
                if !self.meal_description.is_empty() {
                    out.push_str(&format!("{}\n\n", self.meal_description));
                }
            }
        }

        if !self.identified_foods.is_empty() {
            out.push_str("**פירוט רכיבי הארוחה:**\n");
            for food in &self.identified_foods {
                out.push_str(&format!("• {} ({})\n", food.name, food.portion));
                out.push_str(&format!("  - קלוריות: {}\n", food.calories));
                out.push_str(&format!("  - חלבון: {}g\n", food.protein));
                out.push_str(&format!("  - פחמימות: {}g\n", food.carbs));
                out.push_str(&format!("  - שומן: {}g\n", food.fat));
            }
            out.push('\n');
        }

        let n = &self.nutrition;
        out.push_str("**סיכום תזונתי כולל:**\n");
        out.push_str(&format!("• קלוריות: {}\n", n.calories));
        out.push_str(&format!("• חלבון: {}g\n", n.protein));
        out.push_str(&format!("• פחמימות: {}g", n.carbs));
        if self.fiber() != 0.0 {
            out.push_str(&format!(" (מתוכן {}g סיבים תזונתיים)\n", self.fiber()));
            out.push_str(&format!("• פחמימות נטו: {}g\n", self.net_carbs()));
        } else {
            out.push('\n');
        }
        out.push_str(&format!("• שומן: {}g\n\n", n.fat));

        if self.is_low_carb_friendly {
            out.push_str("✅ **ארוחה זו מתאימה לדיאטה דלת-פחמימות**\n\n");
        } else {
            out.push_str("⚠️ **ארוחה זו אינה אידיאלית לדיאטה דלת-פחמימות**\n\n");
        }

        out.push_str(&format!("**הערכה תזונתית:**\n{}\n\n", self.nutrition_assessment));
        out.push_str(&format!("**טיפים לאופטימיזציה:**\n{}\n\n", self.low_carb_optimization));

        if !self.alternative_suggestions.is_empty() {
            out.push_str("**המלצות לחלופות דלות פחמימות:**\n");
            for alt in &self.alternative_suggestions {
                out.push_str(&format!("• {alt}\n"));
            }
        }

        out.push_str("\n\nהאם הערכים התזונתיים נכונים? אם לא, הקלד \"ערוך ערכים תזונתיים\" כדי לעדכן אותם.");
        out
    }
}

/// Numbers from a model may arrive as strings (`"12g"`) or null.
pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_opt_f64(d)?.unwrap_or(0.0))
}

pub fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches(|c: char| c.is_alphabetic())
            .trim()
            .parse()
            .ok(),
        _ => None,
    })
}

pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "meal_description": "חביתה עם סלט",
            "identified_foods": [
                {"name": "חביתה", "portion": "2 ביצים", "calories": 180, "protein": 12, "carbs": 1, "fat": 14},
                {"name": "סלט", "portion": "קערה", "calories": 60, "protein": 2, "carbs": 9, "fat": 2}
            ],
            "nutrition": {"calories": 240, "protein": 14, "carbs": 10, "fiber": 3, "net_carbs": 7, "fat": 16},
            "is_keto_friendly": true,
            "is_low_carb_friendly": true,
            "nutrition_assessment": "ארוחה מאוזנת",
            "low_carb_optimization": "הוסף אבוקדו",
            "alternative_suggestions": ["קישוא במקום לחם"]
        })
    }

    #[test]
    fn parses_full_answer() {
        let a = MealAnalysis::from_value(sample()).unwrap();
        assert_eq!(a.identified_foods.len(), 2);
        assert_eq!(a.net_carbs(), 7.0);
        assert_eq!(a.macros().calories, 240.0);
        let stored = a.to_new_analysis();
        assert_eq!(stored.fiber, 3.0);
        assert!(stored.keto_friendly);
    }

    #[test]
    fn net_carbs_fall_back_to_carbs_minus_fiber() {
        let a = MealAnalysis::from_value(json!({
            "nutrition": {"calories": 400, "protein": 20, "carbs": 30, "fiber": 8, "fat": 10}
        }))
        .unwrap();
        assert_eq!(a.net_carbs(), 22.0);
        assert!(a.identified_foods.is_empty());

        let a = MealAnalysis::from_value(json!({
            "nutrition": {"calories": 100, "protein": 1, "carbs": 12, "fat": 1}
        }))
        .unwrap();
        assert_eq!(a.fiber(), 0.0);
        assert_eq!(a.net_carbs(), 12.0);
    }

    #[test]
    fn tolerates_strings_and_nulls() {
        let a = MealAnalysis::from_value(json!({
            "meal_description": null,
            "identified_foods": null,
            "nutrition": {"calories": "350", "protein": "20g", "carbs": null, "fat": 15.5}
        }))
        .unwrap();
        assert_eq!(a.nutrition.calories, 350.0);
        assert_eq!(a.nutrition.protein, 20.0);
        assert_eq!(a.nutrition.carbs, 0.0);
        assert_eq!(a.description_or("טוסט"), "טוסט");
    }

    #[test]
    fn accepts_json_text_and_rejects_missing_nutrition() {
        let text = Value::String(sample().to_string());
        assert!(MealAnalysis::from_value(text).is_ok());
        assert!(matches!(
            MealAnalysis::from_value(json!({"meal_description": "x"})),
            Err(LlmError::InvalidJson(_))
        ));
        assert!(MealAnalysis::from_value(json!("I cannot see a meal")).is_err());
    }

    #[test]
    fn renders_text_reply() {
        let msg = MealAnalysis::from_value(sample())
            .unwrap()
            .render_message(AnalysisSource::Text);
        assert!(msg.starts_with("**ניתוח הארוחה שלך**\n\n**פירוט רכיבי הארוחה:**\n• חביתה (2 ביצים)\n"));
        assert!(msg.contains("• פחמימות: 10g (מתוכן 3g סיבים תזונתיים)\n• פחמימות נטו: 7g\n"));
        assert!(msg.contains("✅"));
        assert!(msg.contains("• קישוא במקום לחם\n"));
        assert!(msg.ends_with("כדי לעדכן אותם."));
    }

    #[test]
    fn photo_reply_includes_description_and_warning() {
        let mut a = MealAnalysis::from_value(sample()).unwrap();
        a.is_low_carb_friendly = false;
        a.nutrition.fiber = None;
        let msg = a.render_message(AnalysisSource::Photo);
        assert!(msg.starts_with("**ניתוח הארוחה בתמונה**\n\nחביתה עם סלט\n\n"));
        assert!(msg.contains("• פחמימות: 10g\n• שומן: 16g"));
        assert!(msg.contains("⚠️"));
    }
}
