use bytes::Bytes;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    food_analysis::{
        entities::{AnalysisResult, MealCategory, MealEntry},
        ports::{ImageCodec, MealStore},
    },
};

/// Process-local meal log. Days are UTC calendar days.
pub struct InMemoryMealStore<I> {
    codec: I,
    meals: RwLock<Vec<MealEntry>>,
}

impl<I: ImageCodec> InMemoryMealStore<I> {
    pub fn new(codec: I) -> Self {
        Self {
            codec,
            meals: RwLock::new(Vec::new()),
        }
    }

    /// Adds an already-built entry as is, keeping its timestamp.
    pub async fn insert(&self, entry: MealEntry) {
        let mut meals = self.meals.write().await;
        let position = meals.partition_point(|meal| meal.timestamp <= entry.timestamp);
        meals.insert(position, entry);
    }

    pub async fn len(&self) -> usize {
        self.meals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.meals.read().await.is_empty()
    }

    async fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<MealEntry> {
        self.meals
            .read()
            .await
            .iter()
            .filter(|meal| meal.timestamp >= start && meal.timestamp < end)
            .cloned()
            .collect()
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| CoreError::InvalidInput(format!("date out of range: {}", date)))
}

impl<I: ImageCodec> MealStore for InMemoryMealStore<I> {
    async fn save(
        &self,
        image: Option<Bytes>,
        result: AnalysisResult,
        category: MealCategory,
    ) -> Result<MealEntry, CoreError> {
        let image = image
            .map(|image| {
                self.codec.compress_for_storage(&image).map_err(|e| {
                    error!("Failed to compress image for storage: {}", e);
                    CoreError::PersistenceFailure("failed to compress image for storage".to_string())
                })
            })
            .transpose()?
            .map(Bytes::from);

        let entry = MealEntry::new(image, result, category);
        self.insert(entry.clone()).await;

        debug!(meal_id = %entry.id, category = %category, "Stored meal");
        Ok(entry)
    }

    async fn fetch_for_day(&self, date: NaiveDate) -> Result<Vec<MealEntry>, CoreError> {
        let end = next_day(date)?;
        Ok(self.range(start_of_day(date), start_of_day(end)).await)
    }

    async fn fetch_for_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MealEntry>, CoreError> {
        Ok(self.range(start, end).await)
    }

    async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let mut meals = self.meals.write().await;
        let before = meals.len();
        meals.retain(|meal| meal.id != id);

        if meals.len() == before {
            return Err(CoreError::PersistenceFailure(format!("meal {} not found", id)));
        }
        Ok(())
    }

    async fn update_category(
        &self,
        id: Uuid,
        category: MealCategory,
    ) -> Result<MealEntry, CoreError> {
        let mut meals = self.meals.write().await;
        let meal = meals
            .iter_mut()
            .find(|meal| meal.id == id)
            .ok_or_else(|| CoreError::PersistenceFailure(format!("meal {} not found", id)))?;

        meal.category = category;
        Ok(meal.clone())
    }

    async fn days_with_meals(&self, year: i32, month: u32) -> Result<Vec<NaiveDate>, CoreError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| CoreError::InvalidInput(format!("invalid month {}-{}", year, month)))?;

        let mut days: Vec<NaiveDate> = self
            .meals
            .read()
            .await
            .iter()
            .map(|meal| meal.timestamp.date_naive())
            .filter(|day| day.year() == first.year() && day.month() == first.month())
            .collect();

        days.sort();
        days.dedup();
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::food_analysis::{
        entities::{DiabeticFriendliness, MacroNutrients, ModelTier, VerdictEmoji},
        ports::MockImageCodec,
    };

    fn result(dish_name: &str, calories: f64) -> AnalysisResult {
        AnalysisResult {
            estimated_portion_size: "1 plate".to_string(),
            dish_name: dish_name.to_string(),
            calories,
            macros: MacroNutrients::new(10.0, 40.0, 12.0),
            verdict_emoji: VerdictEmoji::Healthy,
            brief_explanation: String::new(),
            diabetic_friendliness: DiabeticFriendliness::Moderate,
            diabetic_advice: String::new(),
            portion_size_suggestion: String::new(),
            used_model: ModelTier::Fast,
            food_items: None,
        }
    }

    fn entry_at(dish_name: &str, timestamp: DateTime<Utc>, category: MealCategory) -> MealEntry {
        MealEntry {
            timestamp,
            ..MealEntry::new(None, result(dish_name, 300.0), category)
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_save_compresses_image() {
        let mut codec = MockImageCodec::new();
        codec
            .expect_compress_for_storage()
            .times(1)
            .returning(|_| Ok(b"small".to_vec()));

        let store = InMemoryMealStore::new(codec);
        let entry = store
            .save(
                Some(Bytes::from_static(b"large photo")),
                result("Thali", 780.0),
                MealCategory::Lunch,
            )
            .await
            .unwrap();

        assert_eq!(entry.image, Some(Bytes::from_static(b"small")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_reports_compression_failure() {
        let mut codec = MockImageCodec::new();
        codec
            .expect_compress_for_storage()
            .returning(|_| Err(CoreError::ImageEncoding("bad".to_string())));

        let store = InMemoryMealStore::new(codec);
        let saved = store
            .save(
                Some(Bytes::from_static(b"photo")),
                result("Thali", 780.0),
                MealCategory::Lunch,
            )
            .await;

        assert!(matches!(saved, Err(CoreError::PersistenceFailure(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_day_and_range_queries() {
        let store = InMemoryMealStore::new(MockImageCodec::new());
        store
            .insert(entry_at("Dosa", utc(2026, 3, 4, 8), MealCategory::Breakfast))
            .await;
        store
            .insert(entry_at("Biryani", utc(2026, 3, 4, 20), MealCategory::Dinner))
            .await;
        store
            .insert(entry_at("Poha", utc(2026, 3, 5, 0), MealCategory::Breakfast))
            .await;
        store
            .insert(entry_at("Idli", utc(2026, 4, 1, 9), MealCategory::Breakfast))
            .await;

        let day = store
            .fetch_for_day(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap())
            .await
            .unwrap();
        let names: Vec<_> = day.iter().map(|m| m.result.dish_name.as_str()).collect();
        assert_eq!(names, vec!["Dosa", "Biryani"]);

        let range = store
            .fetch_for_range(utc(2026, 3, 4, 12), utc(2026, 3, 5, 0))
            .await
            .unwrap();
        assert_eq!(range.len(), 1);

        let days = store.days_with_meals(2026, 3).await.unwrap();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            ]
        );
        assert!(matches!(
            store.days_with_meals(2026, 13).await,
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_category_and_delete() {
        let store = InMemoryMealStore::new(MockImageCodec::new());
        let entry = store
            .save(None, result("Samosa", 260.0), MealCategory::Lunch)
            .await
            .unwrap();

        let updated = store
            .update_category(entry.id, MealCategory::Snacks)
            .await
            .unwrap();
        assert_eq!(updated.category, MealCategory::Snacks);

        store.delete(entry.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete(entry.id).await,
            Err(CoreError::PersistenceFailure(_))
        ));
    }
}
