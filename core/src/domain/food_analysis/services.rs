use std::{future::Future, sync::Arc};

use bytes::Bytes;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::domain::{
    common::entities::app_errors::CoreError,
    food_analysis::{
        entities::{AnalysisResult, FoodItem, MealCategory},
        helpers::editable_portions,
        policies::can_improve,
        ports::{FoodAnalysisService, ImageCodec, LLMClient, MealStore},
        prompts::{AnalysisIntent, PromptBuilder},
        value_objects::{AnalysisSource, SessionError, SessionState},
    },
};

/// Drives one analysis session against the remote model.
///
/// All state lives behind a single mutex and every transition is published on
/// a watch channel. Network-bound commands run on their own task; starting a
/// new one cancels whatever was in flight, and a response arriving for a
/// cancelled request is dropped without touching the state.
pub struct Orchestrator<L, M, I> {
    inner: Arc<Inner<L, M, I>>,
}

impl<L, M, I> Clone for Orchestrator<L, M, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<L, M, I> {
    llm_client: L,
    meal_store: M,
    image_codec: I,
    session: Mutex<Session>,
    state_tx: watch::Sender<SessionState>,
}

#[derive(Default)]
struct Session {
    source: Option<AnalysisSource>,
    improve_used: bool,
    cancel: CancellationToken,
    /// Result kept after a failed save so `retry` can restore it.
    unsaved: Option<AnalysisResult>,
    /// A store call is running for the current result.
    saving: bool,
}

impl Session {
    /// Cancels the in-flight request, if any, and hands out a token for the
    /// next one.
    fn begin_request(&mut self) -> CancellationToken {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }

    fn clear(&mut self) {
        self.cancel.cancel();
        *self = Session::default();
    }
}

impl<L, M, I> Orchestrator<L, M, I>
where
    L: LLMClient + 'static,
    M: MealStore + 'static,
    I: ImageCodec + 'static,
{
    pub fn new(llm_client: L, meal_store: M, image_codec: I) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);

        Self {
            inner: Arc::new(Inner {
                llm_client,
                meal_store,
                image_codec,
                session: Mutex::new(Session::default()),
                state_tx,
            }),
        }
    }

    pub fn meal_store(&self) -> &M {
        &self.inner.meal_store
    }

    pub async fn improve_used(&self) -> bool {
        self.inner.session.lock().await.improve_used
    }

    /// Whether `improve` would issue a request right now.
    pub async fn can_improve(&self) -> bool {
        let session = self.inner.session.lock().await;
        !session.saving
            && can_improve(
                &self.inner.current(),
                session.source.as_ref(),
                session.improve_used,
            )
    }

    async fn spawn<F, Fut>(&self, command: F) -> SessionState
    where
        F: FnOnce(Arc<Inner<L, M, I>>) -> Fut,
        Fut: Future<Output = SessionState> + Send + 'static,
    {
        let task = tokio::spawn(command(Arc::clone(&self.inner)));

        match task.await {
            Ok(state) => state,
            Err(e) => {
                error!("Session task failed: {}", e);
                self.inner.current()
            }
        }
    }
}

impl<L, M, I> Inner<L, M, I>
where
    L: LLMClient,
    M: MealStore,
    I: ImageCodec,
{
    fn current(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    fn publish(&self, state: SessionState) -> SessionState {
        debug!(state = state.name(), "Session transition");
        self.state_tx.send_replace(state.clone());
        state
    }

    fn ignore(&self, command: &str) -> SessionState {
        let state = self.current();
        debug!(command, state = state.name(), "Command does not apply, ignoring");
        state
    }

    async fn request(
        &self,
        intent: AnalysisIntent<'_>,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, CoreError> {
        let tier = intent.model_tier();
        let payload = PromptBuilder::new(&self.image_codec).build(&intent)?;

        debug!(intent = intent.name(), tier = %tier, "Sending analysis request");
        let raw = self.llm_client.send(tier, payload, cancel).await?;

        AnalysisResult::decode(&raw, tier)
    }

    /// Applies a request's outcome unless a newer command superseded it.
    async fn complete<F>(
        &self,
        cancel: &CancellationToken,
        outcome: Result<AnalysisResult, CoreError>,
        on_success: F,
    ) -> SessionState
    where
        F: FnOnce(AnalysisResult) -> SessionState + Send,
    {
        let _session = self.session.lock().await;

        if cancel.is_cancelled() {
            debug!("Dropping response of a superseded request");
            return self.current();
        }

        match outcome {
            Ok(result) => {
                info!(dish_name = %result.dish_name, tier = %result.used_model, "Analysis completed");
                self.publish(on_success(result))
            }
            Err(CoreError::Cancelled) => self.current(),
            Err(e) => {
                error!("Analysis failed: {}", e);
                self.publish(SessionState::Error(SessionError::from(e)))
            }
        }
    }

    async fn start_from_image(&self, image: Bytes) -> SessionState {
        let cancel = {
            let mut session = self.session.lock().await;
            session.clear();
            session.source = Some(AnalysisSource::Image(image.clone()));
            self.publish(SessionState::Identifying);
            session.begin_request()
        };

        let outcome = self
            .request(AnalysisIntent::Identify { image: &image }, cancel.clone())
            .await;

        self.complete(&cancel, outcome, SessionState::Identified).await
    }

    async fn start_from_description(&self, description: String) -> SessionState {
        let cancel = {
            let mut session = self.session.lock().await;
            session.clear();
            session.source = Some(AnalysisSource::Description(description.clone()));
            self.publish(SessionState::Analysing);
            session.begin_request()
        };

        let outcome = self
            .request(
                AnalysisIntent::NutritionFromDescription {
                    description: &description,
                },
                cancel.clone(),
            )
            .await;

        self.complete(&cancel, outcome, SessionState::Result).await
    }

    async fn confirm(&self) -> SessionState {
        let (identified, cancel) = {
            let mut session = self.session.lock().await;
            let SessionState::Identified(identified) = self.current() else {
                return self.ignore("confirm");
            };
            self.publish(SessionState::Analysing);
            (identified, session.begin_request())
        };

        let outcome = self
            .request(
                AnalysisIntent::NutritionFromName {
                    name: &identified.dish_name,
                    quantity: &identified.estimated_portion_size,
                },
                cancel.clone(),
            )
            .await;

        self.complete(&cancel, outcome, SessionState::Result).await
    }

    async fn confirm_portions(&self) -> SessionState {
        let (items, image, cancel) = {
            let mut session = self.session.lock().await;
            let SessionState::Identified(identified) = self.current() else {
                return self.ignore("confirm_portions");
            };
            let items = editable_portions(&identified);
            if items.is_empty() {
                return self.ignore("confirm_portions");
            }
            let image = session.source.as_ref().and_then(AnalysisSource::image).cloned();
            self.publish(SessionState::Analysing);
            (items, image, session.begin_request())
        };

        let outcome = self
            .request(
                AnalysisIntent::NutritionFromPortions {
                    items: &items,
                    image: image.as_deref(),
                },
                cancel.clone(),
            )
            .await;

        self.complete(&cancel, outcome, SessionState::Result).await
    }

    async fn edit_dish_name(&self, dish_name: String) -> SessionState {
        let _session = self.session.lock().await;
        let dish_name = dish_name.trim();

        match self.current() {
            SessionState::Identified(result) if !dish_name.is_empty() => {
                self.publish(SessionState::Identified(result.with_dish_name(dish_name)))
            }
            _ => self.ignore("edit_dish_name"),
        }
    }

    async fn edit_portions(&self, items: Vec<FoodItem>) -> SessionState {
        let _session = self.session.lock().await;

        match self.current() {
            SessionState::Identified(result) if !items.is_empty() => {
                self.publish(SessionState::Identified(result.with_portions(items)))
            }
            _ => self.ignore("edit_portions"),
        }
    }

    async fn improve(&self) -> SessionState {
        let (prior, image, back_to_identified, cancel) = {
            let mut session = self.session.lock().await;
            let state = self.current();
            if session.saving
                || !can_improve(&state, session.source.as_ref(), session.improve_used)
            {
                return self.ignore("improve");
            }

            let back_to_identified = matches!(state, SessionState::Identified(_));
            let (Some(prior), Some(image)) = (
                state.result().cloned(),
                session.source.as_ref().and_then(AnalysisSource::image).cloned(),
            ) else {
                return self.ignore("improve");
            };

            session.improve_used = true;
            self.publish(SessionState::Analysing);
            (prior, image, back_to_identified, session.begin_request())
        };

        let outcome = self
            .request(
                AnalysisIntent::Improve {
                    image: &image,
                    prior: &prior,
                },
                cancel.clone(),
            )
            .await;

        self.complete(&cancel, outcome, |result| {
            if back_to_identified {
                SessionState::Identified(result)
            } else {
                SessionState::Result(result)
            }
        })
        .await
    }

    async fn save(&self, category: MealCategory) -> SessionState {
        let (result, image, cancel) = {
            let mut session = self.session.lock().await;
            let SessionState::Result(result) = self.current() else {
                return self.ignore("save");
            };
            if session.saving {
                return self.ignore("save");
            }
            session.saving = true;
            let image = session.source.as_ref().and_then(AnalysisSource::image).cloned();
            (result, image, session.cancel.clone())
        };

        let saved = self
            .meal_store
            .save(image, result.clone(), category)
            .await;

        let mut session = self.session.lock().await;
        if cancel.is_cancelled() {
            debug!("Dropping outcome of a superseded save");
            return self.current();
        }
        session.saving = false;

        match saved {
            Ok(entry) => {
                info!(meal_id = %entry.id, category = %category, "Meal saved");
                session.clear();
                self.publish(SessionState::Idle)
            }
            Err(e) => {
                error!("Failed to save meal: {}", e);
                session.unsaved = Some(result);
                self.publish(SessionState::Error(SessionError::from(e)))
            }
        }
    }

    async fn retry(&self) -> SessionState {
        let mut session = self.session.lock().await;

        if !matches!(self.current(), SessionState::Error(_)) {
            return self.ignore("retry");
        }

        match session.unsaved.take() {
            Some(result) => self.publish(SessionState::Result(result)),
            None => {
                session.clear();
                self.publish(SessionState::Idle)
            }
        }
    }

    async fn reset(&self) -> SessionState {
        let mut session = self.session.lock().await;
        session.clear();
        self.publish(SessionState::Idle)
    }
}

impl<L, M, I> FoodAnalysisService for Orchestrator<L, M, I>
where
    L: LLMClient + 'static,
    M: MealStore + 'static,
    I: ImageCodec + 'static,
{
    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    async fn start_from_image(&self, image: Bytes) -> SessionState {
        self.spawn(move |inner| async move { inner.start_from_image(image).await })
            .await
    }

    #[instrument(skip(self, description))]
    async fn start_from_description(&self, description: String) -> SessionState {
        self.spawn(move |inner| async move { inner.start_from_description(description).await })
            .await
    }

    #[instrument(skip(self))]
    async fn confirm(&self) -> SessionState {
        self.spawn(|inner| async move { inner.confirm().await }).await
    }

    #[instrument(skip(self))]
    async fn confirm_portions(&self) -> SessionState {
        self.spawn(|inner| async move { inner.confirm_portions().await })
            .await
    }

    #[instrument(skip(self))]
    async fn edit_dish_name(&self, dish_name: String) -> SessionState {
        self.inner.edit_dish_name(dish_name).await
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn edit_portions(&self, items: Vec<FoodItem>) -> SessionState {
        self.inner.edit_portions(items).await
    }

    #[instrument(skip(self))]
    async fn improve(&self) -> SessionState {
        self.spawn(|inner| async move { inner.improve().await }).await
    }

    #[instrument(skip(self))]
    async fn save(&self, category: MealCategory) -> SessionState {
        self.spawn(move |inner| async move { inner.save(category).await })
            .await
    }

    #[instrument(skip(self))]
    async fn retry(&self) -> SessionState {
        self.inner.retry().await
    }

    #[instrument(skip(self))]
    async fn reset(&self) -> SessionState {
        self.inner.reset().await
    }

    async fn editable_portions(&self) -> Vec<FoodItem> {
        let _session = self.inner.session.lock().await;
        self.inner
            .current()
            .result()
            .map(editable_portions)
            .unwrap_or_default()
    }

    fn state(&self) -> SessionState {
        self.inner.current()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }
}
