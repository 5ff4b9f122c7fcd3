//! Prompt construction and insight generation.

use std::fmt::Write;

use crate::generation::{GenerationError, TextGenerator};
use crate::types::ProductRecord;

/// Output bound passed to the generator when none is configured.
pub const DEFAULT_MAX_LENGTH: u32 = 2000;

/// Build the prompt listing the product's nutrition facts, followed by the
/// preferences question when `preferences` is not blank.
pub fn build_prompt(record: &ProductRecord, preferences: &str) -> String {
    let mut prompt = format!(
        "The product '{}' has the following nutritional information:\n",
        record.product_name
    );
    for (name, value) in &record.nutrition_facts {
        let _ = writeln!(prompt, "{name}: {value}");
    }

    let preferences = preferences.trim();
    if !preferences.is_empty() {
        let _ = write!(
            prompt,
            "\nBased on the following preferences: {preferences}, can you provide insights \
             on whether this product is a good choice for health and sustainability?"
        );
    }
    prompt
}

/// Ask `generator` about `record` and return the first candidate's text.
pub async fn generate_insight(
    generator: &dyn TextGenerator,
    record: &ProductRecord,
    preferences: &str,
    max_length: u32,
) -> Result<String, GenerationError> {
    let prompt = build_prompt(record, preferences);
    tracing::debug!(prompt = %prompt, "built insight prompt");
    tracing::info!(
        backend = generator.backend_name(),
        model = generator.model_name(),
        max_length,
        "generating insight"
    );

    let generations = generator.generate(&prompt, max_length).await?;
    let first = generations.into_iter().next().ok_or(GenerationError::Empty)?;
    Ok(first.generated_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::FakeGenerator;
    use crate::types::{Barcode, NutritionFacts};

    fn maggi() -> ProductRecord {
        let mut facts = NutritionFacts::new();
        facts.insert("Sugars".into(), 2.5);
        facts.insert("Sodium".into(), 0.8);
        ProductRecord {
            barcode: Barcode::new("8901058851668").unwrap(),
            product_name: "Maggi Noodles".into(),
            brand: "Maggi".into(),
            generic_name: "Instant noodles".into(),
            image_url: None,
            ingredients: None,
            allergens: None,
            categories: None,
            labels: None,
            nutrition_facts: facts,
        }
    }

    #[test]
    fn prompt_lists_facts_and_preferences() {
        let prompt = build_prompt(&maggi(), "low-sugar");
        assert!(prompt.starts_with(
            "The product 'Maggi Noodles' has the following nutritional information:\n"
        ));
        assert!(prompt.contains("Sugars: 2.5\n"));
        assert!(prompt.contains("Sodium: 0.8\n"));
        assert!(prompt.contains("low-sugar"));
        assert!(prompt.contains("Based on the following preferences: low-sugar, can you"));
    }

    #[test]
    fn empty_preferences_omit_question() {
        for prefs in ["", "   "] {
            let prompt = build_prompt(&maggi(), prefs);
            assert!(!prompt.contains("Based on the following preferences"));
            assert!(prompt.ends_with("Sugars: 2.5\n"));
        }
    }

    #[test]
    fn prompt_without_facts_is_header_only() {
        let mut record = maggi();
        record.nutrition_facts.clear();
        assert_eq!(
            build_prompt(&record, ""),
            "The product 'Maggi Noodles' has the following nutritional information:\n"
        );
    }

    #[tokio::test]
    async fn returns_first_candidate() {
        let generator = FakeGenerator::with_response("maggi", "Fairly salty.");
        let insight = generate_insight(&generator, &maggi(), "low-sodium", 50)
            .await
            .unwrap();
        assert_eq!(insight, "Fairly salty.");
        assert!(generator.prompts()[0].contains("low-sodium"));
    }
}
