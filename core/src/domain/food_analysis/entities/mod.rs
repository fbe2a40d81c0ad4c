pub mod analysis_result;
pub mod food_item;
pub mod meal_entry;
pub mod model_tier;

pub use analysis_result::*;
pub use food_item::*;
pub use meal_entry::*;
pub use model_tier::*;
