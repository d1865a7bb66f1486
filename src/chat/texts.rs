//! Nutritionist replies shown in the chat.

use crate::meals::repo_types::MacroValues;

pub const EDIT_AVAILABLE: &str = "אתה יכול לערוך את הערכים התזונתיים בחלון שנפתח. לאחר העריכה, הערכים יעודכנו בארוחה האחרונה שתיעדת.";
pub const NOTHING_TO_EDIT: &str = "אין ערכים תזונתיים זמינים לעריכה. אנא תעד ארוחה תחילה.";

pub const ANALYZE_FAILED: &str = "מצטער, התרחשה שגיאה בניתוח הארוחה. אנא נסה שוב עם תיאור מפורט יותר של הארוחה.";
pub const ADVICE_FAILED: &str = "מצטער, התרחשה שגיאה בעת קבלת תגובה. אנא נסה שוב מאוחר יותר.";
pub const IMAGE_FAILED: &str = "מצטער, התרחשה שגיאה בעת עיבוד התמונה. אנא נסה שוב או תאר את הארוחה בהודעת טקסט.";
pub const EDIT_FAILED: &str = "אירעה שגיאה בעדכון הערכים התזונתיים. אנא נסה שוב.";
pub const LAST_MEAL_MISSING: &str = "לא ניתן למצוא את הארוחה האחרונה. אנא נסה לתעד את הארוחה מחדש.";

pub const CHAT_CLEARED: &str = "הצ'אט נקה. אפשר להתחיל שיחה חדשה.";
pub const DEFAULT_PHOTO_CAPTION: &str = "הנה תמונה של הארוחה שלי";

pub fn greeting(name: &str) -> String {
    format!("שלום {name}! אני התזונאי האישי שלך. איך אוכל לעזור לך היום?")
}

pub fn nutrition_updated(v: &MacroValues) -> String {
    format!(
        "✅ הערכים התזונתיים עודכנו בהצלחה:\n\n• קלוריות: {}\n• חלבון: {}g\n• פחמימות: {}g\n• שומן: {}g",
        v.calories, v.protein, v.carbs, v.fat
    )
}
