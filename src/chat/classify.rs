//! Routing of free-text chat messages.

use lazy_static::lazy_static;
use regex::Regex;

use crate::meals::repo_types::MealType;

const EDIT_COMMANDS: [&str; 3] = ["ערוך ערכים", "עדכן ערכים", "תקן ערכים"];

lazy_static! {
    static ref MEAL_LOG: Regex = Regex::new(
        r"(?i)ארוחת|חטיף|ארוחה|יוגורט|סלט|לחם|פרי|ביצה|עוף|בשר|דג|ארוחת בוקר|צהריים|ערב"
    )
    .expect("meal log pattern");
}

pub fn is_edit_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    EDIT_COMMANDS.iter().any(|c| lower.contains(c))
}

/// Whether a message reads like a meal being reported.
pub fn is_meal_log(text: &str) -> bool {
    MEAL_LOG.is_match(text)
}

/// Meal type named in `text`, otherwise the one usual at `hour`.
pub fn infer_meal_type(text: &str, hour: u8) -> MealType {
    let lower = text.to_lowercase();
    if lower.contains("בוקר") {
        MealType::Breakfast
    } else if lower.contains("צהריים") {
        MealType::Lunch
    } else if lower.contains("ארוחת ביניים") || lower.contains("חטיף") {
        MealType::Snack
    } else if lower.contains("ערב") {
        MealType::Dinner
    } else if lower.contains("לילה") || lower.contains("נשנוש") {
        MealType::NightSnack
    } else {
        meal_type_at(hour)
    }
}

fn meal_type_at(hour: u8) -> MealType {
    match hour {
        5..=10 => MealType::Breakfast,
        11..=15 => MealType::Lunch,
        16..=18 => MealType::Snack,
        19..=22 => MealType::Dinner,
        _ => MealType::NightSnack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_edit_commands() {
        assert!(is_edit_command("בבקשה ערוך ערכים"));
        assert!(is_edit_command("תקן ערכים של הארוחה"));
        assert!(!is_edit_command("ערכים תזונתיים של אבוקדו?"));
    }

    #[test]
    fn detects_meal_logs() {
        assert!(is_meal_log("אכלתי סלט עם טונה"));
        assert!(is_meal_log("ארוחת בוקר: 2 ביצים"));
        assert!(is_meal_log("חזה עוף ואורז"));
        assert!(!is_meal_log("כמה חלבון אני צריך ביום?"));
        assert!(!is_meal_log("hello"));
    }

    #[test]
    fn meal_type_from_keywords() {
        assert_eq!(infer_meal_type("ארוחת בוקר", 20), MealType::Breakfast);
        assert_eq!(infer_meal_type("אכלתי בצהריים שניצל", 8), MealType::Lunch);
        assert_eq!(infer_meal_type("חטיף חלבון", 8), MealType::Snack);
        assert_eq!(infer_meal_type("ארוחת ערב", 8), MealType::Dinner);
        assert_eq!(infer_meal_type("נשנוש של גבינה", 8), MealType::NightSnack);
    }

    #[test]
    fn meal_type_from_hour() {
        assert_eq!(infer_meal_type("סלט", 5), MealType::Breakfast);
        assert_eq!(infer_meal_type("סלט", 10), MealType::Breakfast);
        assert_eq!(infer_meal_type("סלט", 11), MealType::Lunch);
        assert_eq!(infer_meal_type("סלט", 16), MealType::Snack);
        assert_eq!(infer_meal_type("סלט", 19), MealType::Dinner);
        assert_eq!(infer_meal_type("סלט", 23), MealType::NightSnack);
        assert_eq!(infer_meal_type("סלט", 2), MealType::NightSnack);
    }
}
