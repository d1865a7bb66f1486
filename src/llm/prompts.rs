use serde_json::{json, Value};

use super::product::BARCODE_NOT_FOUND;
use super::{HistoryTurn, InvokeRequest};

/// How many earlier chat messages go along with an advice question.
pub const HISTORY_WINDOW: usize = 5;

const ADVICE_GUIDANCE: &str = "As a professional nutritionist specializing in low-carb diets, respond to this user message.

Provide scientifically accurate, helpful advice about nutrition, fitness, and health that aligns with low-carb dietary principles.

Consider the following when crafting your response:
- Focus on low-carb nutrition science and practical advice
- Keep responses concise but informative
- Include relevant nutritional facts when appropriate
- Maintain a professional, supportive tone
- If asking for information about specific foods, provide accurate macro breakdowns

If the user's query isn't related to nutrition, fitness, or health, politely redirect them to nutrition-related topics.

Respond in Hebrew with proper formatting.";

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a professional nutritionist specializing in analyzing meals for their nutritional content. Respond with accurate nutritional information in the specified JSON format.";

const ANALYSIS_STEPS: &str = "1. Identify all food items, including preparations and cooking methods
2. Estimate portion sizes based on common serving standards
3. Calculate nutritional values for EACH individual food item:
   - Item name
   - Estimated portion
   - Calories
   - Protein (g)
   - Carbohydrates (g)
   - Fat (g)
4. Also calculate a comprehensive nutritional profile for the entire meal:
   - Total calories
   - Total protein (g)
   - Total carbohydrates (g)
   - Dietary fiber (g)
   - Net carbs (total carbs minus fiber)
   - Total fat (g)
5. Determine if this meal is keto-friendly and/or low-carb friendly
6. Provide professional advice for optimizing this meal for a low-carb diet
7. Suggest 2-3 specific alternative ingredients to reduce carbs while maintaining nutritional value

VERY IMPORTANT: Provide all your analysis in Hebrew, not English. The full response must be in Hebrew.";

/// Free-form nutrition question, answered with the tail of the
/// conversation as context.
pub fn advice_request(message: &str, history: &[HistoryTurn]) -> InvokeRequest {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    InvokeRequest {
        system_prompt: Some(ADVICE_GUIDANCE.to_string()),
        prompt: format!("User message: \"{message}\""),
        history: history[start..].to_vec(),
        temperature: Some(0.7),
        max_tokens: Some(1000),
        add_context_from_internet: true,
        ..Default::default()
    }
}

/// Structured analysis of a described and/or photographed meal.
pub fn meal_analysis_request(description: Option<&str>, image_url: Option<&str>) -> InvokeRequest {
    let mut prompt = String::from(
        "As a professional nutritionist specializing in low-carb diets, analyze this meal in detail:",
    );
    if image_url.is_some() {
        prompt.push_str("\n\nA photo of the meal is attached.");
    }
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        prompt.push_str(&format!("\n\nMeal description: \"{description}\""));
    }
    prompt.push_str("\n\n");
    prompt.push_str(ANALYSIS_STEPS);

    InvokeRequest {
        system_prompt: Some(ANALYSIS_SYSTEM_PROMPT.to_string()),
        prompt,
        response_json_schema: Some(meal_analysis_schema()),
        image_url: image_url.map(str::to_string),
        temperature: Some(0.5),
        max_tokens: Some(1500),
        add_context_from_internet: image_url.is_none(),
        ..Default::default()
    }
}

pub fn meal_analysis_schema() -> Value {
    let number = json!({ "type": "number" });
    json!({
        "type": "object",
        "properties": {
            "meal_description": { "type": "string" },
            "identified_foods": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "portion": { "type": "string" },
                        "calories": number,
                        "protein": number,
                        "carbs": number,
                        "fat": number
                    }
                }
            },
            "nutrition": {
                "type": "object",
                "properties": {
                    "calories": number,
                    "protein": number,
                    "carbs": number,
                    "fiber": number,
                    "net_carbs": number,
                    "fat": number
                }
            },
            "is_keto_friendly": { "type": "boolean" },
            "is_low_carb_friendly": { "type": "boolean" },
            "nutrition_assessment": { "type": "string" },
            "low_carb_optimization": { "type": "string" },
            "alternative_suggestions": { "type": "array", "items": { "type": "string" } }
        }
    })
}

/// Reads the digits of a barcode photo.
pub fn barcode_read_request(image_url: &str) -> InvokeRequest {
    InvokeRequest {
        prompt: format!(
            "This is an image of a barcode. Please identify the barcode number (digits only). \
             If you can't identify a barcode clearly, just respond with \"{BARCODE_NOT_FOUND}\". \
             Provide nothing else in your response other than the barcode number or {BARCODE_NOT_FOUND}."
        ),
        image_url: Some(image_url.to_string()),
        temperature: Some(0.0),
        max_tokens: Some(50),
        ..Default::default()
    }
}

/// Nutrition facts of the packaged product behind `barcode`.
pub fn product_lookup_request(barcode: &str) -> InvokeRequest {
    InvokeRequest {
        system_prompt: Some(ANALYSIS_SYSTEM_PROMPT.to_string()),
        prompt: format!(
            "I need detailed nutritional information for a food product with barcode {barcode}.
As if you're a nutritionist, extract this information from known food databases to the best of your knowledge.

If you can find the product, provide the following in JSON format:
1. Product name (in Hebrew)
2. Calories per serving
3. Protein content in grams
4. Serving size (e.g., \"100g\", \"1 piece\")
5. Brand or manufacturer (if available)

If you cannot find this specific barcode in your knowledge, make an intelligent guess based on common food products with similar barcodes or formats, and include \"found\": false in your response."
        ),
        response_json_schema: Some(product_schema()),
        temperature: Some(0.3),
        max_tokens: Some(500),
        add_context_from_internet: true,
        ..Default::default()
    }
}

pub fn product_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "product_name": { "type": "string" },
            "calories": { "type": "number" },
            "protein": { "type": "number" },
            "serving_size": { "type": "string" },
            "brand": { "type": "string" },
            "found": { "type": "boolean" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;

    fn turn(i: usize) -> HistoryTurn {
        HistoryTurn {
            role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
            content: format!("message {i}"),
        }
    }

    #[test]
    fn advice_keeps_only_the_last_five_messages() {
        let history: Vec<_> = (0..8).map(turn).collect();
        let req = advice_request("מה לאכול בערב?", &history);
        assert_eq!(req.history.len(), HISTORY_WINDOW);
        assert_eq!(req.history[0].content, "message 3");
        assert!(req.prompt.contains("מה לאכול בערב?"));
        assert!(req.response_json_schema.is_none());
        assert!(req.add_context_from_internet);
    }

    #[test]
    fn advice_with_short_history_keeps_all() {
        let history: Vec<_> = (0..2).map(turn).collect();
        assert_eq!(advice_request("hi", &history).history.len(), 2);
    }

    #[test]
    fn analysis_request_carries_schema_and_image() {
        let req = meal_analysis_request(Some("סלט עם ביצה"), Some("https://files/x.jpg"));
        assert!(req.prompt.contains("Meal description: \"סלט עם ביצה\""));
        assert_eq!(req.image_url.as_deref(), Some("https://files/x.jpg"));
        let schema = req.response_json_schema.unwrap();
        assert_eq!(schema["properties"]["nutrition"]["properties"]["net_carbs"]["type"], "number");
        assert_eq!(req.max_tokens, Some(1500));
    }

    #[test]
    fn blank_description_is_left_out() {
        let req = meal_analysis_request(Some("  "), None);
        assert!(!req.prompt.contains("Meal description"));
        assert!(req.image_url.is_none());
    }

    #[test]
    fn barcode_prompts() {
        let read = barcode_read_request("https://files/code.jpg");
        assert_eq!(read.image_url.as_deref(), Some("https://files/code.jpg"));
        assert!(read.prompt.contains(BARCODE_NOT_FOUND));
        assert!(read.response_json_schema.is_none());

        let lookup = product_lookup_request("7290000066318");
        assert!(lookup.prompt.contains("barcode 7290000066318"));
        assert!(lookup.add_context_from_internet);
        let schema = lookup.response_json_schema.unwrap();
        assert_eq!(schema["properties"]["found"]["type"], "boolean");
    }
}
