use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::enums::text_enum;
use crate::meals::repo_types::{Meal, MealType};

/// Calorie target assumed for the weekly chart when the user has no profile.
pub const DEFAULT_CALORIE_TARGET: i32 = 2000;
pub const DEFAULT_PROTEIN_TARGET: i32 = 120;

const HIGH_CALORIE_SNACK: f64 = 300.0;
const LATE_EATING_HOUR: u8 = 20;
const LATE_EATING_SHARE: f64 = 0.4;
const LOW_PROTEIN_SHARE: f64 = 0.7;
const MEAL_IDEA_MAX_REMAINING: f64 = 500.0;

/// Net carbs under which a set of meals counts as low-carb.
const LOW_CARB_NET_CARBS: f64 = 100.0;
const KETO_NET_CARBS: f64 = 30.0;

text_enum! {
    pub enum InsightRange {
        Day => "day",
        Week => "week",
        Month => "month",
    }
}

impl InsightRange {
    /// Inclusive first and last date covered when anchored on `anchor`.
    pub fn bounds(&self, anchor: Date) -> (Date, Date) {
        match self {
            InsightRange::Day => (anchor, anchor),
            InsightRange::Week => (anchor.saturating_sub(Duration::days(7)), anchor),
            InsightRange::Month => {
                let last = anchor.month().length(anchor.year());
                (
                    anchor.replace_day(1).unwrap_or(anchor),
                    anchor.replace_day(last).unwrap_or(anchor),
                )
            }
        }
    }

    /// Per-day average of `total` over the range. A day reports its total.
    pub fn average(&self, total: f64) -> f64 {
        match self {
            InsightRange::Day => total,
            InsightRange::Week => (total / 7.0).round(),
            InsightRange::Month => (total / 30.0).round(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MacroBreakdown {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub net_carbs: f64,
    pub low_carb_friendly: bool,
    pub keto_friendly: bool,
    pub protein_percentage: i32,
    pub carbs_percentage: i32,
    pub fat_percentage: i32,
}

/// Totals over `meals`, with fiber taken from each meal's analysis.
pub fn macro_breakdown(meals: &[Meal], fiber_by_meal: &HashMap<Uuid, f64>) -> MacroBreakdown {
    let mut b = MacroBreakdown::default();
    for meal in meals {
        b.calories += meal.calories;
        b.protein += meal.protein;
        b.carbs += meal.carbs;
        b.fat += meal.fat;
        b.fiber += fiber_by_meal.get(&meal.id).copied().unwrap_or(0.0);
    }
    b.net_carbs = b.carbs - b.fiber;
    b.low_carb_friendly = b.net_carbs < LOW_CARB_NET_CARBS;
    b.keto_friendly = b.net_carbs < KETO_NET_CARBS;

    let energy = b.protein * 4.0 + b.carbs * 4.0 + b.fat * 9.0;
    let share = |kcal: f64| {
        if energy == 0.0 {
            0
        } else {
            (kcal / energy * 100.0).round() as i32
        }
    };
    b.protein_percentage = share(b.protein * 4.0);
    b.carbs_percentage = share(b.carbs * 4.0);
    b.fat_percentage = share(b.fat * 9.0);
    b
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopMeal {
    pub id: Uuid,
    pub description: String,
    pub calories: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub range: InsightRange,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(with = "iso_date")]
    pub to: Date,
    pub meal_count: usize,
    pub average_calories: f64,
    pub average_protein: f64,
    pub top_meal: Option<TopMeal>,
    pub breakdown: MacroBreakdown,
    pub calories_target: Option<i32>,
    pub protein_target: Option<i32>,
    pub recommendations: Vec<Recommendation>,
}

pub struct RangeTargets {
    pub calories: i32,
    pub protein: i32,
}

pub fn range_insights(
    range: InsightRange,
    anchor: Date,
    meals: Vec<Meal>,
    fiber_by_meal: &HashMap<Uuid, f64>,
    targets: Option<RangeTargets>,
) -> Insights {
    let (from, to) = range.bounds(anchor);
    let meals: Vec<Meal> = meals
        .into_iter()
        .filter(|m| m.date >= from && m.date <= to)
        .collect();

    let total_calories: f64 = meals.iter().map(|m| m.calories).sum();
    let total_protein: f64 = meals.iter().map(|m| m.protein).sum();
    // First meal wins a tie.
    let top_meal = meals
        .iter()
        .fold(None::<&Meal>, |best, m| match best {
            Some(b) if b.calories >= m.calories => Some(b),
            _ => Some(m),
        })
        .map(|m| TopMeal {
            id: m.id,
            description: m.description.clone(),
            calories: m.calories,
        });

    Insights {
        range,
        from,
        to,
        meal_count: meals.len(),
        average_calories: range.average(total_calories),
        average_protein: range.average(total_protein),
        top_meal,
        breakdown: macro_breakdown(&meals, fiber_by_meal),
        calories_target: targets.as_ref().map(|t| t.calories),
        protein_target: targets.as_ref().map(|t| t.protein),
        recommendations: recommendations(&meals, targets.as_ref()),
    }
}

text_enum! {
    pub enum RecommendationKind {
        StartLogging => "start_logging",
        AddBreakfast => "add_breakfast",
        MoreProtein => "more_protein",
        LighterSnacks => "lighter_snacks",
        EarlierDinner => "earlier_dinner",
        MealIdea => "meal_idea",
        KeepGoing => "keep_going",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
}

impl Recommendation {
    fn new(kind: RecommendationKind, title: &str, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// Hour a meal was eaten at; meals without a time count as noon.
fn meal_hour(meal: &Meal) -> u8 {
    meal.time
        .as_deref()
        .and_then(|t| t.split(':').next())
        .and_then(|h| h.parse().ok())
        .unwrap_or(12)
}

/// Eating-pattern advice for the meals of an insights range. Missing or
/// zero targets fall back to 2000 kcal and 120 g protein.
pub fn recommendations(meals: &[Meal], targets: Option<&RangeTargets>) -> Vec<Recommendation> {
    use RecommendationKind::*;

    if meals.is_empty() {
        return vec![Recommendation::new(
            StartLogging,
            "התחל לתעד את הארוחות שלך",
            "רישום כל הארוחות שלך יעזור לך לעקוב אחר צריכת הקלוריות והתזונה שלך ולהגיע ליעדים שלך.",
        )];
    }

    let calorie_target = targets
        .map(|t| t.calories)
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_CALORIE_TARGET);
    let protein_target = targets
        .map(|t| t.protein)
        .filter(|p| *p > 0)
        .unwrap_or(DEFAULT_PROTEIN_TARGET);

    let total_calories: f64 = meals.iter().map(|m| m.calories).sum();
    let total_protein: f64 = meals.iter().map(|m| m.protein).sum();
    let calories_remaining = (f64::from(calorie_target) - total_calories).max(0.0);
    let protein_remaining = (f64::from(protein_target) - total_protein).max(0.0);

    let mut out = Vec::new();

    if !meals.iter().any(|m| m.meal_type == MealType::Breakfast) {
        out.push(Recommendation::new(
            AddBreakfast,
            "הוסף ארוחת בוקר",
            "אכילת ארוחת בוקר יכולה לעזור להאיץ את חילוף החומרים ולהפחית את הרעב מאוחר יותר ביום.",
        ));
    }

    if total_protein < f64::from(protein_target) * LOW_PROTEIN_SHARE {
        out.push(Recommendation::new(
            MoreProtein,
            "הגדל את צריכת החלבון",
            "חלבון עוזר בשימור מסת שריר בזמן הרזיה. נסה להוסיף מקורות חלבון כמו ביצים, חזה עוף, או קטניות.",
        ));
    }

    if meals
        .iter()
        .any(|m| m.meal_type == MealType::Snack && m.calories > HIGH_CALORIE_SNACK)
    {
        out.push(Recommendation::new(
            LighterSnacks,
            "החלף חטיפים עתירי קלוריות",
            "חטיפים שלך מכילים קלוריות רבות. שקול להחליף אותם באפשרויות דלות יותר בקלוריות כמו ירקות, פירות, או יוגורט.",
        ));
    }

    let late_calories: f64 = meals
        .iter()
        .filter(|m| meal_hour(m) >= LATE_EATING_HOUR)
        .map(|m| m.calories)
        .sum();
    if late_calories > total_calories * LATE_EATING_SHARE {
        out.push(Recommendation::new(
            EarlierDinner,
            "הפחת אכילת ערב מאוחרת",
            "אתה צורך חלק גדול מהקלוריות שלך בערב. נסה להקדים את הארוחות ולהימנע מאכילה 3 שעות לפני השינה.",
        ));
    }

    if calories_remaining > 0.0 && calories_remaining <= MEAL_IDEA_MAX_REMAINING {
        let idea = if protein_remaining > 20.0 {
            "סלט עם חזה עוף צלוי וטחינה"
        } else {
            "מרק ירקות עם קרוטונים מחיטה מלאה"
        };
        out.push(Recommendation::new(
            MealIdea,
            "רעיון לארוחה מאוזנת",
            format!(
                "נותרו לך {} קלוריות היום. שקול {idea}.",
                calories_remaining.round()
            ),
        ));
    }

    if out.is_empty() {
        out.push(Recommendation::new(
            KeepGoing,
            "המשך בעבודה הטובה!",
            "נראה שאתה שומר על דפוסי אכילה מאוזנים. המשך לגוון את התזונה שלך עם מגוון מזונות עשירים בנוטריינטים.",
        ));
    }
    out
}

/// Where a day's intake falls relative to the calorie target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieBand {
    Over,
    OnTarget,
    Close,
    Under,
}

impl CalorieBand {
    pub fn classify(calories: f64, target: i32) -> Self {
        let target = f64::from(target);
        if calories > target * 1.1 {
            CalorieBand::Over
        } else if calories >= target * 0.9 {
            CalorieBand::OnTarget
        } else if calories >= target * 0.7 {
            CalorieBand::Close
        } else {
            CalorieBand::Under
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub calories: f64,
    pub meals: usize,
    pub band: CalorieBand,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyChart {
    pub days: Vec<ChartDay>,
    pub average_calories: f64,
    pub calories_target: i32,
    /// Upper bound for the chart axis, in whole hundreds.
    pub y_axis_max: f64,
}

/// Sunday through Saturday of the week containing `anchor`.
pub fn week_of(anchor: Date) -> (Date, Date) {
    let offset = i64::from(anchor.weekday().number_days_from_sunday());
    let start = anchor.saturating_sub(Duration::days(offset));
    (start, start.saturating_add(Duration::days(6)))
}

pub fn weekly_chart(anchor: Date, meals: &[Meal], calories_target: Option<i32>) -> WeeklyChart {
    let target = calories_target
        .filter(|t| *t > 0)
        .unwrap_or(DEFAULT_CALORIE_TARGET);
    let (start, _) = week_of(anchor);

    let days: Vec<ChartDay> = (0..7)
        .map(|i| {
            let date = start.saturating_add(Duration::days(i));
            let of_day = meals.iter().filter(|m| m.date == date);
            let (calories, count) = of_day.fold((0.0, 0), |(c, n), m| (c + m.calories, n + 1));
            ChartDay {
                date,
                calories,
                meals: count,
                band: CalorieBand::classify(calories, target),
            }
        })
        .collect();

    let total: f64 = days.iter().map(|d| d.calories).sum();
    let peak = days
        .iter()
        .map(|d| d.calories)
        .fold(f64::from(target), f64::max);

    WeeklyChart {
        average_calories: (total / 7.0).round(),
        calories_target: target,
        y_axis_max: (peak * 1.1 / 100.0).ceil() * 100.0,
        days,
    }
}
