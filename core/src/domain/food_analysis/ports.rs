use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    food_analysis::{
        entities::{AnalysisResult, FoodItem, MealCategory, MealEntry, ModelTier},
        prompts::PromptPayload,
        value_objects::SessionState,
    },
};

/// Transport to the remote generative model.
pub trait LLMClient: Send + Sync {
    /// Sends `payload` to the model behind `tier` and returns the text of the
    /// first candidate. Resolves to `CoreError::Cancelled` as soon as
    /// `cancel` fires.
    fn send(
        &self,
        tier: ModelTier,
        payload: PromptPayload,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// Source of the API credential.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    /// The trimmed credential, or `None` when absent or blank.
    fn api_key(&self) -> Option<String>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ImageCodec: Send + Sync {
    /// Re-encodes `image` as JPEG and returns it base64-encoded.
    fn encode_for_transport(&self, image: &[u8]) -> Result<String, CoreError>;

    /// Compresses `image` to a JPEG small enough to keep with a meal record.
    fn compress_for_storage(&self, image: &[u8]) -> Result<Vec<u8>, CoreError>;
}

/// Local meal records.
pub trait MealStore: Send + Sync {
    fn save(
        &self,
        image: Option<Bytes>,
        result: AnalysisResult,
        category: MealCategory,
    ) -> impl Future<Output = Result<MealEntry, CoreError>> + Send;

    fn fetch_for_day(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<MealEntry>, CoreError>> + Send;

    /// Meals with `start <= timestamp < end`, oldest first.
    fn fetch_for_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<MealEntry>, CoreError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_category(
        &self,
        id: Uuid,
        category: MealCategory,
    ) -> impl Future<Output = Result<MealEntry, CoreError>> + Send;

    /// Distinct days of `month` that have at least one meal, sorted.
    fn days_with_meals(
        &self,
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<Vec<NaiveDate>, CoreError>> + Send;
}

/// One analysis session: identify, edit, analyse, improve, save.
///
/// Every command resolves to the session state once the command has been
/// applied. Commands that do not apply to the current state leave it
/// unchanged.
pub trait FoodAnalysisService: Send + Sync {
    fn start_from_image(&self, image: Bytes) -> impl Future<Output = SessionState> + Send;

    fn start_from_description(
        &self,
        description: String,
    ) -> impl Future<Output = SessionState> + Send;

    fn confirm(&self) -> impl Future<Output = SessionState> + Send;

    fn confirm_portions(&self) -> impl Future<Output = SessionState> + Send;

    fn edit_dish_name(&self, dish_name: String) -> impl Future<Output = SessionState> + Send;

    fn edit_portions(&self, items: Vec<FoodItem>) -> impl Future<Output = SessionState> + Send;

    fn improve(&self) -> impl Future<Output = SessionState> + Send;

    fn save(&self, category: MealCategory) -> impl Future<Output = SessionState> + Send;

    fn retry(&self) -> impl Future<Output = SessionState> + Send;

    fn reset(&self) -> impl Future<Output = SessionState> + Send;

    fn editable_portions(&self) -> impl Future<Output = Vec<FoodItem>> + Send;

    fn state(&self) -> SessionState;

    fn subscribe(&self) -> watch::Receiver<SessionState>;
}
