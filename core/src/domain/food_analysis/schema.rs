use serde_json::json;

use crate::domain::food_analysis::entities::{CAUTION_GLYPH, HEALTHY_GLYPH};

/// Returns the JSON schema every analysis reply must follow.
pub fn get_analysis_result_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "estimatedPortionSize": { "type": "string" },
            "dishName": { "type": "string" },
            "calories": { "type": "number" },
            "macros": {
                "type": "object",
                "properties": {
                    "protein": { "type": "number" },
                    "carbs": { "type": "number" },
                    "fats": { "type": "number" }
                },
                "required": ["protein", "carbs", "fats"]
            },
            "verdictEmoji": {
                "type": "string",
                "enum": [HEALTHY_GLYPH, CAUTION_GLYPH]
            },
            "briefExplanation": { "type": "string" },
            "diabeticFriendliness": {
                "type": "string",
                "enum": ["High", "Moderate", "Low"]
            },
            "diabeticAdvice": { "type": "string" },
            "portionSizeSuggestion": { "type": "string" },
            "foodItems": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "quantity": { "type": "string" }
                    },
                    "required": ["name", "quantity"]
                }
            }
        },
        "required": [
            "estimatedPortionSize", "dishName", "calories", "macros", "verdictEmoji",
            "briefExplanation", "diabeticFriendliness", "diabeticAdvice", "portionSizeSuggestion"
        ]
    })
}
