use anyhow::{Context, bail};
use bytes::Bytes;
use clap::Parser;
use dotenv::dotenv;
use nutrithali_core::{
    application::{NutriThaliService, create_service},
    domain::food_analysis::{
        entities::{AnalysisResult, DailySummary, MealCategory},
        helpers::parse_portion_size,
        ports::{FoodAnalysisService, MealStore},
        value_objects::SessionState,
    },
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, LogArgs};

mod args;

fn init_logger(args: &LogArgs) {
    let filter = args.filter.parse::<EnvFilter>().unwrap_or_else(|err| {
        eprintln!("invalid log filter: {err}");
        eprintln!("using default log filter: info");
        EnvFilter::new("info")
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if args.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn log_result(result: &AnalysisResult) {
    let verdict = result.verdict();
    info!(
        dish_name = %result.dish_name,
        calories = result.calories,
        verdict = verdict.label(),
        diabetic_friendliness = %result.diabetic_friendliness,
        model = result.used_model.display_name(),
        "Analysis ready"
    );
}

/// Unwraps the result a finished command should have produced.
fn expect_result(state: SessionState) -> anyhow::Result<AnalysisResult> {
    match state {
        SessionState::Identified(result) | SessionState::Result(result) => Ok(result),
        SessionState::Error(error) => bail!("{}: {}", error.title, error.message),
        other => bail!("analysis ended in unexpected state `{}`", other.name()),
    }
}

async fn scan(
    service: &NutriThaliService,
    image: Bytes,
    dish_name: Option<String>,
    portions: Option<String>,
    improve: bool,
) -> anyhow::Result<AnalysisResult> {
    let identified = expect_result(service.start_from_image(image).await)?;
    info!(dish_name = %identified.dish_name, portion = %identified.estimated_portion_size, "Dish identified");

    if let Some(dish_name) = dish_name {
        service.edit_dish_name(dish_name).await;
    }

    let state = match portions {
        Some(portions) => {
            let items = parse_portion_size(&portions);
            if items.is_empty() {
                bail!("no portions found in `{}`", portions);
            }
            service.edit_portions(items).await;
            service.confirm_portions().await
        }
        None => service.confirm().await,
    };
    let mut result = expect_result(state)?;

    if improve {
        if service.can_improve().await {
            result = expect_result(service.improve().await)?;
        } else {
            warn!("Improve is not available for this result");
        }
    }

    Ok(result)
}

async fn save(service: &NutriThaliService, category: MealCategory) -> anyhow::Result<()> {
    info!(category = %category, hint = category.time_hint(), "Saving meal");
    if let SessionState::Error(error) = service.save(category).await {
        bail!("{}: {}", error.title, error.message);
    }

    let today = chrono::Utc::now().date_naive();
    let meals = service.meal_store().fetch_for_day(today).await?;
    let summary = DailySummary::from_meals(&meals);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();
    init_logger(&args.log);

    let command = args.command.clone();
    let service = create_service(args.into())?;

    let mut states = service.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().name();
            info!(state, "Session state changed");
        }
    });

    let category = match command {
        Command::Scan {
            image,
            dish_name,
            portions,
            improve,
            save,
        } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("failed to read {}", image.display()))?;
            let result = scan(&service, Bytes::from(bytes), dish_name, portions, improve).await?;
            log_result(&result);
            println!("{}", serde_json::to_string_pretty(&result)?);
            save
        }
        Command::Describe { text, save } => {
            let result = expect_result(service.start_from_description(text).await)?;
            log_result(&result);
            println!("{}", serde_json::to_string_pretty(&result)?);
            save
        }
    };

    if let Some(category) = category {
        save(&service, category).await?;
    }

    Ok(())
}
