use std::{collections::BTreeMap, fmt, str::FromStr};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{common::generate_timestamp, food_analysis::entities::AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snacks,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MealCategory::Breakfast => "Breakfast",
            MealCategory::Lunch => "Lunch",
            MealCategory::Dinner => "Dinner",
            MealCategory::Snacks => "Snacks",
        }
    }

    pub fn time_hint(&self) -> &str {
        match self {
            MealCategory::Breakfast => "Usually eaten between 6 AM - 10 AM",
            MealCategory::Lunch => "Usually eaten between 12 PM - 2 PM",
            MealCategory::Dinner => "Usually eaten between 7 PM - 9 PM",
            MealCategory::Snacks => "Light meals eaten between main meals",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealCategory::Breakfast),
            "lunch" => Ok(MealCategory::Lunch),
            "dinner" => Ok(MealCategory::Dinner),
            "snack" | "snacks" => Ok(MealCategory::Snacks),
            other => Err(format!(
                "unknown meal category '{}', expected breakfast, lunch, dinner or snacks",
                other
            )),
        }
    }
}

/// A confirmed meal handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub category: MealCategory,
    #[serde(skip)]
    pub image: Option<Bytes>,
    pub result: AnalysisResult,
}

impl MealEntry {
    pub fn new(image: Option<Bytes>, result: AnalysisResult, category: MealCategory) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            timestamp: now,
            category,
            image,
            result,
        }
    }
}

/// Totals over a set of meals, typically one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySummary {
    pub meal_count: usize,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories_by_category: BTreeMap<MealCategory, f64>,
}

impl DailySummary {
    pub fn from_meals(meals: &[MealEntry]) -> Self {
        meals.iter().fold(Self::default(), |mut summary, meal| {
            summary.meal_count += 1;
            summary.calories += meal.result.calories;
            summary.protein += meal.result.macros.protein;
            summary.carbs += meal.result.macros.carbs;
            summary.fats += meal.result.macros.fats;
            *summary
                .calories_by_category
                .entry(meal.category)
                .or_insert(0.0) += meal.result.calories;
            summary
        })
    }
}
