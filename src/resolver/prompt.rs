//! Generation prompts and the JSON schemas sent with them.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::RecipeSummary;

fn summary_properties() -> Value {
    json!({
        "id": { "type": "string", "description": "kebab-case identifier" },
        "name": { "type": "string" },
        "category": { "type": "string" },
        "shortDescription": { "type": "string", "description": "one sentence" },
        "prepTime": { "type": "string", "description": "e.g. \"35 min\"" },
        "calories": { "type": "string", "description": "per serving, e.g. \"520 kcal\"" }
    })
}

/// Schema for a single [`crate::model::RecipeDetail`].
pub fn recipe_schema() -> Value {
    let mut properties = summary_properties();
    if let Some(map) = properties.as_object_mut() {
        let list = json!({ "type": "array", "items": { "type": "string" } });
        map.insert("ingredients".into(), list.clone());
        map.insert("instructions".into(), list.clone());
        map.insert("tips".into(), list);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": [
            "name", "category", "shortDescription", "prepTime", "calories",
            "ingredients", "instructions", "tips"
        ]
    })
}

/// Schema for a search reply: an object wrapping the summary list.
pub fn summaries_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "recipes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": summary_properties(),
                    "required": ["name", "category", "shortDescription", "prepTime", "calories"]
                }
            }
        },
        "required": ["recipes"]
    })
}

#[derive(Debug, Deserialize)]
pub struct SummaryEnvelope {
    pub recipes: Vec<RecipeSummary>,
}

pub fn recipe_prompt(name: &str) -> String {
    format!(
        "Write a complete, realistic home-cooking recipe for \"{name}\" in English. \
         Use metric quantities, list every ingredient with its amount, give clear numbered-style \
         steps without numbers, and add two or three practical tips."
    )
}

pub fn search_prompt(query: &str, count: usize, avoid: &[&str]) -> String {
    let mut prompt = format!(
        "Suggest {count} distinct recipes in English that match the search \"{query}\". \
         Each needs a short appetising description, a realistic preparation time and calories per serving."
    );
    if !avoid.is_empty() {
        prompt.push_str(" Do not suggest any of: ");
        prompt.push_str(&avoid.join(", "));
        prompt.push('.');
    }
    prompt
}
