use serde::Serialize;
use serde_json::json;

use crate::domain::{
    common::entities::app_errors::CoreError,
    food_analysis::{
        entities::{AnalysisResult, CAUTION_GLYPH, FoodItem, HEALTHY_GLYPH, ModelTier},
        ports::ImageCodec,
        schema::get_analysis_result_schema,
    },
};

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

const HIDDEN_CALORIES: &str = "Account for hidden calories from cooking fats and additions \
(oil, ghee, butter, cream, sugar) that are not directly visible.";

const NUTRITION_SOURCES: [&str; 7] = [
    "USDA FoodData Central (fdc.nal.usda.gov)",
    "Healthline (healthline.com)",
    "Mayo Clinic (mayoclinic.org)",
    "WebMD (webmd.com)",
    "American Diabetes Association (diabetes.org)",
    "CDC (cdc.gov)",
    "MyFoodData (myfooddata.com)",
];

/// What a request asks the model to do.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisIntent<'a> {
    /// Dish name and portion only, from a photo.
    Identify { image: &'a [u8] },
    NutritionFromName { name: &'a str, quantity: &'a str },
    NutritionFromDescription { description: &'a str },
    /// Full analysis of an already decided portion list. The image is context only.
    NutritionFromPortions {
        items: &'a [FoodItem],
        image: Option<&'a [u8]>,
    },
    /// Escalation: verify and refine `prior` against the same photo.
    Improve {
        image: &'a [u8],
        prior: &'a AnalysisResult,
    },
}

impl AnalysisIntent<'_> {
    pub fn model_tier(&self) -> ModelTier {
        match self {
            AnalysisIntent::Improve { .. } => ModelTier::Detailed,
            AnalysisIntent::Identify { .. }
            | AnalysisIntent::NutritionFromName { .. }
            | AnalysisIntent::NutritionFromDescription { .. }
            | AnalysisIntent::NutritionFromPortions { .. } => ModelTier::Fast,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisIntent::Identify { .. } => "identify",
            AnalysisIntent::NutritionFromName { .. } => "nutrition_from_name",
            AnalysisIntent::NutritionFromDescription { .. } => "nutrition_from_description",
            AnalysisIntent::NutritionFromPortions { .. } => "nutrition_from_portions",
            AnalysisIntent::Improve { .. } => "improve",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Provider-neutral request: instruction text, optional photo and the
/// schema the reply must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    pub text: String,
    pub image: Option<InlineImage>,
    pub response_schema: serde_json::Value,
}

pub struct PromptBuilder<'a, I> {
    codec: &'a I,
}

impl<'a, I: ImageCodec> PromptBuilder<'a, I> {
    pub fn new(codec: &'a I) -> Self {
        Self { codec }
    }

    pub fn build(&self, intent: &AnalysisIntent<'_>) -> Result<PromptPayload, CoreError> {
        let (text, image) = match intent {
            AnalysisIntent::Identify { image } => (identify_text(), Some(*image)),
            AnalysisIntent::NutritionFromName { name, quantity } => {
                (nutrition_from_name_text(name, quantity), None)
            }
            AnalysisIntent::NutritionFromDescription { description } => {
                (nutrition_from_description_text(description), None)
            }
            AnalysisIntent::NutritionFromPortions { items, image } => {
                (nutrition_from_portions_text(items), *image)
            }
            AnalysisIntent::Improve { image, prior } => (improve_text(prior), Some(*image)),
        };

        let image = image
            .map(|bytes| {
                self.codec
                    .encode_for_transport(bytes)
                    .map(|data| InlineImage {
                        mime_type: JPEG_MIME_TYPE.to_string(),
                        data,
                    })
            })
            .transpose()?;

        Ok(PromptPayload {
            text,
            image,
            response_schema: get_analysis_result_schema(),
        })
    }
}

/// Field-by-field description of the reply, with per-intent hints.
fn output_shape(portion: &str, dish: &str, food_items: &str) -> String {
    format!(
        r#"Return JSON in this exact format:
{{
  "estimatedPortionSize": {portion},
  "dishName": {dish},
  "calories": 0,
  "macros": {{ "protein": 0, "carbs": 0, "fats": 0 }},
  "verdictEmoji": "{HEALTHY_GLYPH}" or "{CAUTION_GLYPH}",
  "briefExplanation": "One sentence explaining the verdict.",
  "diabeticFriendliness": "High", "Moderate", or "Low",
  "diabeticAdvice": "Specific advice for people with type 2 diabetes.",
  "portionSizeSuggestion": "Recommended portion size for health.",
  "foodItems": {food_items}
}}
calories is in kcal and every macro is in grams. Respond with the JSON object only."#
    )
}

fn quoted(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

const GENERIC_FOOD_ITEMS: &str = r#"[ { "name": "Item name", "quantity": "amount" } ]"#;

fn identify_text() -> String {
    format!(
        "Analyse this food image to identify the dish and estimate the portion size.\n\
         Only the dish name, the portion estimate and the list of visible food items matter \
         at this stage; nutrition values may be left at 0 and text fields may say \
         \"Pending analysis...\".\n\n{}",
        output_shape(
            r#""Estimated portion (e.g., 250g, 1.5 cups)""#,
            r#""Name of the dish""#,
            GENERIC_FOOD_ITEMS,
        )
    )
}

fn nutrition_from_name_text(name: &str, quantity: &str) -> String {
    let sources = NUTRITION_SOURCES
        .iter()
        .map(|source| format!("- {source}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Compute detailed nutritional information for:\n\
         Dish: {dish}\n\
         Quantity: {portion}\n\n\
         Prefer well-respected, authoritative nutrition sources such as:\n{sources}\n\n\
         1. Calculate precise calories and macros (protein, carbs, fats) for this specific quantity. \
         {HIDDEN_CALORIES}\n\
         2. Provide diabetes care information (glycemic index, glycemic load and specific advice) \
         based on the sources above.\n\n{shape}",
        dish = quoted(name),
        portion = quoted(quantity),
        shape = output_shape(&quoted(quantity), &quoted(name), "[]"),
    )
}

fn nutrition_from_description_text(description: &str) -> String {
    format!(
        "Based on this food description: {description}\n\n\
         1. Portion estimation: estimate the portion size from the description \
         (e.g., \"250g\", \"1.5 cups\", \"2 medium rotis + 150g dal + 200g rice\").\n\
         2. Nutritional analysis: calculate total calories and macronutrients (protein, carbs, \
         fats in grams) for the described portion. {HIDDEN_CALORIES}\n\
         3. Health assessment: give an overall health verdict and a type 2 diabetic assessment \
         considering glycemic index and carbohydrate load.\n\n{shape}",
        description = quoted(description),
        shape = output_shape(
            r#""Estimated portion from description""#,
            r#""Name of dish/meal""#,
            GENERIC_FOOD_ITEMS,
        ),
    )
}

fn nutrition_from_portions_text(items: &[FoodItem]) -> String {
    let portions = items
        .iter()
        .map(FoodItem::portion_label)
        .collect::<Vec<_>>()
        .join(", ");
    let food_items = items
        .iter()
        .map(|item| json!({ "name": item.name, "quantity": item.quantity }))
        .collect::<Vec<_>>();
    let food_items = serde_json::Value::Array(food_items).to_string();

    format!(
        "Calculate nutritional information for this meal with these exact portions:\n\
         {portions}\n\n\
         The portions are final; do not re-estimate them. If an image is attached, use it only \
         as supplementary context for cooking style.\n\
         1. Total calories for these exact portions, accounting for typical cooking methods. \
         {HIDDEN_CALORIES}\n\
         2. Macronutrients (protein, carbs, fats in grams) for these exact portions.\n\
         3. Overall health verdict based on nutritional balance.\n\
         4. Diabetic assessment considering total carbohydrate load and glycemic index.\n\n{shape}",
        shape = output_shape(&quoted(&portions), r#""Name of the meal/combination""#, &food_items),
    )
}

fn improve_text(prior: &AnalysisResult) -> String {
    format!(
        "CONTEXT: A previous analysis by a faster model produced this assessment:\n\
         - Dish name: {dish}\n\
         - Estimated portion: {portion}\n\
         - Calories: {calories:.0} kcal\n\
         - Protein: {protein:.0}g, Carbs: {carbs:.0}g, Fats: {fats:.0}g\n\
         - Diabetic friendliness: {friendliness}\n\n\
         YOUR TASK: verify and refine this assessment using the attached image. Do not start an \
         independent analysis from scratch; start from the values above and correct them.\n\
         1. Verify the dish identification and portion estimate and correct obvious errors.\n\
         2. Give a more precise portion estimate using exact measurements (grams or units).\n\
         3. Recalculate nutrition more accurately, considering cooking methods. {HIDDEN_CALORIES}\n\
         4. Give enhanced diabetic guidance (glycemic load, insulin response, meal timing).\n\n{shape}",
        dish = prior.dish_name,
        portion = prior.estimated_portion_size,
        calories = prior.calories,
        protein = prior.macros.protein,
        carbs = prior.macros.carbs,
        fats = prior.macros.fats,
        friendliness = prior.diabetic_friendliness,
        shape = output_shape(
            r#""Precise portion estimate""#,
            r#""Refined dish name""#,
            r#"[ { "name": "Item name", "quantity": "precise amount" } ]"#,
        ),
    )
}
