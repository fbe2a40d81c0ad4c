use crate::{
    domain::{
        common::{NutriThaliConfig, entities::app_errors::CoreError},
        food_analysis::services::Orchestrator,
    },
    infrastructure::{
        credentials::StaticCredentialSource, image_codec::jpeg::JpegImageCodec,
        llm::gemini_client::GeminiLLMClient, meal_store::in_memory::InMemoryMealStore,
    },
};

pub type NutriThaliService = Orchestrator<
    GeminiLLMClient<StaticCredentialSource>,
    InMemoryMealStore<JpegImageCodec>,
    JpegImageCodec,
>;

pub fn create_service(config: NutriThaliConfig) -> Result<NutriThaliService, CoreError> {
    let credentials = StaticCredentialSource::new(config.llm.api_key.clone());
    let llm_client = GeminiLLMClient::new(credentials, &config.llm)?;
    let image_codec = JpegImageCodec::new();
    let meal_store = InMemoryMealStore::new(image_codec.clone());

    Ok(Orchestrator::new(llm_client, meal_store, image_codec))
}
