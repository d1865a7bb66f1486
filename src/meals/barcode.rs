use serde::Serialize;

use crate::llm::{
    product::{barcode_from_answer, ProductInfo},
    prompts::{barcode_read_request, product_lookup_request},
    text_of, LlmClient, LlmError,
};

/// A looked-up product, ready to prefill a new meal.
#[derive(Debug, Serialize)]
pub struct ProductLookup {
    pub barcode: String,
    pub product: ProductInfo,
    pub description: String,
}

/// The barcode in the photo at `image_url`, `None` when unreadable.
pub async fn read_barcode(llm: &dyn LlmClient, image_url: &str) -> Result<Option<String>, LlmError> {
    let answer = llm.invoke(&barcode_read_request(image_url)).await?;
    Ok(barcode_from_answer(&text_of(&answer)?))
}

pub async fn lookup_product(llm: &dyn LlmClient, barcode: &str) -> Result<ProductLookup, LlmError> {
    let answer = llm.invoke(&product_lookup_request(barcode)).await?;
    let product = ProductInfo::from_value(answer)?;
    Ok(ProductLookup {
        barcode: barcode.to_string(),
        description: product.meal_description(),
        product,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use serde_json::json;

    #[tokio::test]
    async fn reads_digits_from_photo() {
        let llm = ScriptedLlm::new(vec![Ok(json!("7290000066318"))]);
        let code = read_barcode(&llm, "https://files/code.jpg").await.unwrap();
        assert_eq!(code.as_deref(), Some("7290000066318"));
        assert_eq!(
            llm.calls()[0].image_url.as_deref(),
            Some("https://files/code.jpg")
        );
    }

    #[tokio::test]
    async fn unreadable_photo_has_no_barcode() {
        let llm = ScriptedLlm::new(vec![Ok(json!("BARCODE_NOT_FOUND"))]);
        assert!(read_barcode(&llm, "https://files/blurry.jpg")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn lookup_prefills_description() {
        let llm = ScriptedLlm::new(vec![Ok(json!({
            "product_name": "יוגורט יווני",
            "calories": 120,
            "protein": 10,
            "serving_size": "150 גרם",
            "found": true
        }))]);
        let lookup = lookup_product(&llm, "7290000066318").await.unwrap();
        assert_eq!(lookup.description, "יוגורט יווני (150 גרם)");
        assert_eq!(lookup.product.calories, 120.0);
        assert!(llm.calls()[0].response_json_schema.is_some());
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let llm = ScriptedLlm::failing();
        assert!(lookup_product(&llm, "123").await.is_err());
    }
}
