use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    common::entities::app_errors::CoreError,
    food_analysis::{
        entities::{food_item::FoodItem, model_tier::ModelTier},
        sanitizer::decode_response,
    },
};

pub const HEALTHY_GLYPH: &str = "✅";
pub const CAUTION_GLYPH: &str = "⚠️";

/// Macronutrients in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroNutrients {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MacroNutrients {
    pub fn new(protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            protein: non_negative("macros.protein", protein),
            carbs: non_negative("macros.carbs", carbs),
            fats: non_negative("macros.fats", fats),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerdictEmoji {
    Healthy,
    #[default]
    Caution,
}

impl VerdictEmoji {
    pub fn glyph(&self) -> &'static str {
        match self {
            VerdictEmoji::Healthy => HEALTHY_GLYPH,
            VerdictEmoji::Caution => CAUTION_GLYPH,
        }
    }
}

impl From<String> for VerdictEmoji {
    fn from(value: String) -> Self {
        if value.trim() == HEALTHY_GLYPH {
            VerdictEmoji::Healthy
        } else {
            VerdictEmoji::Caution
        }
    }
}

impl From<VerdictEmoji> for String {
    fn from(value: VerdictEmoji) -> Self {
        value.glyph().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Caution,
}

impl Verdict {
    pub fn label(&self) -> &str {
        match self {
            Verdict::Healthy => "Healthy",
            Verdict::Caution => "Caution",
        }
    }
}

/// How suitable a meal is for a type 2 diabetic.
///
/// Labels the model invents outside the three known ones land in `Unknown`,
/// keeping the original text so it can still be displayed neutrally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiabeticFriendliness {
    High,
    Moderate,
    Low,
    Unknown(String),
}

impl DiabeticFriendliness {
    pub fn label(&self) -> &str {
        match self {
            DiabeticFriendliness::High => "High",
            DiabeticFriendliness::Moderate => "Moderate",
            DiabeticFriendliness::Low => "Low",
            DiabeticFriendliness::Unknown(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DiabeticFriendliness::Unknown(_))
    }
}

impl Default for DiabeticFriendliness {
    fn default() -> Self {
        DiabeticFriendliness::Unknown(String::new())
    }
}

impl From<String> for DiabeticFriendliness {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => DiabeticFriendliness::High,
            "moderate" => DiabeticFriendliness::Moderate,
            "low" => DiabeticFriendliness::Low,
            _ => DiabeticFriendliness::Unknown(value),
        }
    }
}

impl From<DiabeticFriendliness> for String {
    fn from(value: DiabeticFriendliness) -> Self {
        match value {
            DiabeticFriendliness::Unknown(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for DiabeticFriendliness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated nutrition result. Edits never mutate a result in place; they
/// produce a new one through the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub estimated_portion_size: String,
    pub dish_name: String,
    pub calories: f64,
    pub macros: MacroNutrients,
    pub verdict_emoji: VerdictEmoji,
    pub brief_explanation: String,
    pub diabetic_friendliness: DiabeticFriendliness,
    pub diabetic_advice: String,
    pub portion_size_suggestion: String,
    pub used_model: ModelTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_items: Option<Vec<FoodItem>>,
}

/// Wire shape of the model's reply. Only the identifying fields are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResultDto {
    estimated_portion_size: String,
    dish_name: String,
    calories: f64,
    #[serde(default)]
    macros: MacroNutrients,
    #[serde(default)]
    verdict_emoji: VerdictEmoji,
    #[serde(default)]
    brief_explanation: String,
    #[serde(default)]
    diabetic_friendliness: DiabeticFriendliness,
    #[serde(default)]
    diabetic_advice: String,
    #[serde(default)]
    portion_size_suggestion: String,
    #[serde(default)]
    food_items: Option<Vec<Value>>,
}

impl AnalysisResult {
    /// Sanitizes a raw model reply and decodes it, tagging the result with
    /// the tier that produced it.
    pub fn decode(raw: &str, used_model: ModelTier) -> Result<Self, CoreError> {
        let dto: AnalysisResultDto = decode_response(raw)?;

        let food_items = dto
            .food_items
            .map(|items| items.iter().map(FoodItem::decode).collect::<Result<Vec<_>, _>>())
            .transpose()
            .inspect_err(|e| tracing::error!(raw = %raw, "Invalid food item in response: {}", e))?;

        Ok(Self {
            estimated_portion_size: dto.estimated_portion_size,
            dish_name: dto.dish_name,
            calories: non_negative("calories", dto.calories),
            macros: MacroNutrients::new(dto.macros.protein, dto.macros.carbs, dto.macros.fats),
            verdict_emoji: dto.verdict_emoji,
            brief_explanation: dto.brief_explanation,
            diabetic_friendliness: dto.diabetic_friendliness,
            diabetic_advice: dto.diabetic_advice,
            portion_size_suggestion: dto.portion_size_suggestion,
            used_model,
            food_items,
        })
    }

    pub fn verdict(&self) -> Verdict {
        match self.verdict_emoji {
            VerdictEmoji::Healthy => Verdict::Healthy,
            VerdictEmoji::Caution => Verdict::Caution,
        }
    }

    /// Only results from the fast tier are eligible for escalation.
    pub fn can_improve(&self) -> bool {
        self.used_model == ModelTier::Fast
    }

    pub fn with_dish_name(&self, dish_name: impl Into<String>) -> Self {
        Self {
            dish_name: dish_name.into(),
            ..self.clone()
        }
    }

    /// Replaces the portion list and recomputes the portion summary from it.
    pub fn with_portions(&self, items: Vec<FoodItem>) -> Self {
        Self {
            estimated_portion_size: portions_summary(&items),
            food_items: Some(items),
            ..self.clone()
        }
    }
}

/// `"100g Rice, 150g Dal"`.
pub fn portions_summary(items: &[FoodItem]) -> String {
    items
        .iter()
        .map(FoodItem::portion_label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_negative(field: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!("Clamping out-of-range {} value {} to 0", field, value);
        0.0
    }
}
