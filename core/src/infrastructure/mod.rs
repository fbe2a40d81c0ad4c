pub mod credentials;
pub mod image_codec;
pub mod llm;
pub mod meal_store;
