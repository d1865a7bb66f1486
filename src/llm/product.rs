//! Packaged-product answers: the barcode read off a photo and the
//! nutrition facts looked up for it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::analysis::{lenient_f64, null_as_default};
use super::{parse_json_text, LlmError};

/// What the model answers when it cannot make out a barcode.
pub const BARCODE_NOT_FOUND: &str = "BARCODE_NOT_FOUND";

/// The digits of a barcode-reading answer, `None` for anything else.
pub fn barcode_from_answer(answer: &str) -> Option<String> {
    let code = answer.trim().trim_matches('"').trim();
    if code == BARCODE_NOT_FOUND || !is_barcode(code) {
        return None;
    }
    Some(code.to_string())
}

pub fn is_barcode(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProductInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub protein: f64,
    pub serving_size: Option<String>,
    pub brand: Option<String>,
    /// False when the model guessed from similar products.
    #[serde(deserialize_with = "null_as_default")]
    pub found: bool,
}

impl ProductInfo {
    pub fn from_value(value: Value) -> Result<Self, LlmError> {
        let value = match value {
            Value::String(text) => parse_json_text(&text)?,
            other => other,
        };
        serde_json::from_value(value).map_err(|e| LlmError::InvalidJson(e.to_string()))
    }

    pub fn has_name(&self) -> bool {
        !self.product_name.trim().is_empty()
    }

    /// Meal description prefilled from the product, serving size in
    /// parentheses.
    pub fn meal_description(&self) -> String {
        match self.serving_size.as_deref().map(str::trim) {
            Some(size) if !size.is_empty() => format!("{} ({size})", self.product_name),
            _ => self.product_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn barcode_answers() {
        assert_eq!(barcode_from_answer(" 7290000066318\n").as_deref(), Some("7290000066318"));
        assert_eq!(barcode_from_answer("\"123\"").as_deref(), Some("123"));
        assert_eq!(barcode_from_answer("BARCODE_NOT_FOUND"), None);
        assert_eq!(barcode_from_answer("barcode: 123"), None);
        assert_eq!(barcode_from_answer(""), None);
    }

    #[test]
    fn product_from_object_or_text() {
        let p = ProductInfo::from_value(json!({
            "product_name": "במבה",
            "calories": "534",
            "protein": 15,
            "serving_size": "100 גרם",
            "brand": "אסם",
            "found": true
        }))
        .unwrap();
        assert_eq!(p.calories, 534.0);
        assert!(p.found);
        assert_eq!(p.meal_description(), "במבה (100 גרם)");

        let p = ProductInfo::from_value(json!("```json\n{\"product_name\": \"חלב\", \"found\": null}\n```"))
            .unwrap();
        assert_eq!(p.meal_description(), "חלב");
        assert!(!p.found);
        assert_eq!(p.protein, 0.0);
    }

    #[test]
    fn product_without_name() {
        let p = ProductInfo::from_value(json!({"calories": 100})).unwrap();
        assert!(!p.has_name());
        assert!(ProductInfo::from_value(json!("not json")).is_err());
    }
}
