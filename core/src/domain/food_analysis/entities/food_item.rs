use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::common::{entities::app_errors::CoreError, generate_uuid_v7};

pub const DEFAULT_QUANTITY: &str = "Standard serving";

const NAME_KEYS: [&str; 2] = ["name", "item"];
const QUANTITY_KEYS: [&str; 2] = ["quantity", "amount"];

/// One component of a meal, e.g. `150g Dal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: String,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            id: generate_uuid_v7(),
            name: name.into(),
            quantity: quantity.into(),
        }
    }

    /// Tolerant decoding of a model-provided item.
    ///
    /// Accepts a bare string (the name, with a standard serving) or an object
    /// using `name`/`item` for the name and `quantity`/`amount` for the
    /// quantity. Numbers are accepted wherever a string is expected.
    pub fn decode(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::String(name) => Ok(Self::new(name.trim(), DEFAULT_QUANTITY)),
            Value::Object(map) => {
                let name = first_text(map, &NAME_KEYS)
                    .ok_or_else(|| CoreError::MissingField("name".to_string()))?;
                let quantity =
                    first_text(map, &QUANTITY_KEYS).unwrap_or_else(|| DEFAULT_QUANTITY.to_string());

                Ok(Self::new(name, quantity))
            }
            _ => Err(CoreError::MissingField("name".to_string())),
        }
    }

    /// `"<quantity> <name>"`, the form used in portion summaries.
    pub fn portion_label(&self) -> String {
        format!("{} {}", self.quantity, self.name)
    }
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
