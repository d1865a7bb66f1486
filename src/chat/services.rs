use anyhow::Context;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::classify::{infer_meal_type, is_edit_command, is_meal_log};
use super::repo::{self, Message, NewMessage, TRANSCRIPT_LIMIT};
use super::texts;
use crate::{
    dates::{clock_time, now_local},
    llm::{
        analysis::{AnalysisSource, MealAnalysis},
        prompts::{advice_request, meal_analysis_request},
        text_of, HistoryTurn, LlmClient, LlmError,
    },
    meals::{
        self,
        repo_types::{MacroValues, Meal, NewMeal, NutritionAnalysis},
    },
    state::AppState,
    uploads::services::{self as uploads, UploadItem},
    users,
};

/// Everything one chat exchange produced.
#[derive(Debug, Serialize)]
pub struct ChatTurn {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal: Option<Meal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NutritionAnalysis>,
}

impl ChatTurn {
    fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            meal: None,
            analysis: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NutritionEdit {
    pub meal: Option<Meal>,
    pub message: Message,
}

pub async fn analyze(
    llm: &dyn LlmClient,
    description: Option<&str>,
    image_url: Option<&str>,
) -> Result<MealAnalysis, LlmError> {
    let answer = llm
        .invoke(&meal_analysis_request(description, image_url))
        .await?;
    MealAnalysis::from_value(answer)
}

pub async fn advise(
    llm: &dyn LlmClient,
    message: &str,
    history: &[HistoryTurn],
) -> Result<String, LlmError> {
    let answer = llm.invoke(&advice_request(message, history)).await?;
    text_of(&answer)
}

/// The meal recorded for an analysis. The type comes from `type_hint`
/// (keywords, else the hour of `now`).
pub fn meal_from_analysis(
    analysis: &MealAnalysis,
    type_hint: &str,
    fallback_description: &str,
    photo_url: Option<String>,
    date: Date,
    now: OffsetDateTime,
) -> NewMeal {
    let macros = analysis.macros();
    NewMeal {
        meal_type: infer_meal_type(type_hint, now.hour()),
        description: analysis.description_or(fallback_description),
        calories: macros.calories,
        protein: macros.protein,
        carbs: macros.carbs,
        fat: macros.fat,
        portion_size: None,
        photo_url,
        date,
        time: Some(clock_time(now)),
    }
}

/// The current transcript; a first visit starts with a greeting.
pub async fn transcript(st: &AppState, user_id: Uuid, email: Option<&str>) -> anyhow::Result<Vec<Message>> {
    if !repo::has_any(&st.db, user_id).await? {
        let account = users::repo::upsert(&st.db, user_id, email).await?;
        let greeting = texts::greeting(account.greeting_name());
        repo::create(&st.db, user_id, &NewMessage::reply(greeting)).await?;
    }
    repo::transcript(&st.db, user_id, TRANSCRIPT_LIMIT).await
}

/// Handles a typed message: nutrition-edit command, meal report or a
/// question for the nutritionist.
pub async fn send_text(
    st: &AppState,
    user_id: Uuid,
    text: &str,
    date: Option<Date>,
) -> anyhow::Result<ChatTurn> {
    let history: Vec<HistoryTurn> = repo::transcript(&st.db, user_id, TRANSCRIPT_LIMIT)
        .await?
        .iter()
        .filter(|m| !m.is_reset)
        .map(Message::as_history)
        .collect();
    let user_message = repo::create(&st.db, user_id, &NewMessage::from_user(text, None)).await?;
    let now = now_local(st.config.utc_offset_hours);

    if is_edit_command(text) {
        let editable = meals::repo::latest_analysed(&st.db, user_id).await?.is_some();
        let reply = if editable {
            texts::EDIT_AVAILABLE
        } else {
            texts::NOTHING_TO_EDIT
        };
        let reply = repo::create(&st.db, user_id, &NewMessage::reply(reply)).await?;
        return Ok(ChatTurn::new(vec![user_message, reply]));
    }

    if is_meal_log(text) {
        debug!(%user_id, "message routed to meal analysis");
        return match log_text_meal(st, user_id, text, date.unwrap_or(now.date()), now).await {
            Ok((reply, meal, analysis)) => Ok(ChatTurn {
                messages: vec![user_message, reply],
                meal: Some(meal),
                analysis: Some(analysis),
            }),
            Err(e) => {
                st.errors.record(user_id, "analyzeMeal", &e);
                let reply = repo::create(&st.db, user_id, &NewMessage::reply(texts::ANALYZE_FAILED)).await?;
                Ok(ChatTurn::new(vec![user_message, reply]))
            }
        };
    }

    let reply = match advise(st.llm.as_ref(), text, &history).await {
        Ok(answer) => answer,
        Err(e) => {
            st.errors.record(user_id, "getResponse", &anyhow::Error::from(e));
            texts::ADVICE_FAILED.to_string()
        }
    };
    let reply = repo::create(&st.db, user_id, &NewMessage::reply(reply)).await?;
    Ok(ChatTurn::new(vec![user_message, reply]))
}

async fn log_text_meal(
    st: &AppState,
    user_id: Uuid,
    text: &str,
    date: Date,
    now: OffsetDateTime,
) -> anyhow::Result<(Message, Meal, NutritionAnalysis)> {
    let analysis = analyze(st.llm.as_ref(), Some(text), None)
        .await
        .context("analyse meal text")?;
    let reply = repo::create(
        &st.db,
        user_id,
        &NewMessage::reply(analysis.render_message(AnalysisSource::Text)),
    )
    .await?;
    let new = meal_from_analysis(&analysis, text, text, None, date, now);
    let (meal, stored) =
        meals::repo::create_with_analysis(&st.db, user_id, &new, &analysis.to_new_analysis()).await?;
    info!(%user_id, meal_id = %meal.id, calories = meal.calories, "meal logged from chat");
    Ok((reply, meal, stored))
}

/// Handles a meal photo: store it, post it as the user's message, analyse
/// it and log the meal with the photo attached.
pub async fn send_photo(
    st: &AppState,
    user_id: Uuid,
    image: UploadItem,
    caption: Option<&str>,
    date: Option<Date>,
) -> anyhow::Result<ChatTurn> {
    let now = now_local(st.config.utc_offset_hours);
    let image_url = match uploads::store(st, "chat", user_id, image).await {
        Ok(url) => url,
        Err(e) => {
            st.errors.record(user_id, "processImage", &e);
            let reply = repo::create(&st.db, user_id, &NewMessage::reply(texts::IMAGE_FAILED)).await?;
            return Ok(ChatTurn::new(vec![reply]));
        }
    };

    let content = caption.unwrap_or(texts::DEFAULT_PHOTO_CAPTION);
    let user_message = repo::create(
        &st.db,
        user_id,
        &NewMessage::from_user(content, Some(image_url.clone())),
    )
    .await?;

    let logged = async {
        let analysis = analyze(st.llm.as_ref(), caption, Some(&image_url))
            .await
            .context("analyse meal photo")?;
        let reply = repo::create(
            &st.db,
            user_id,
            &NewMessage::reply(analysis.render_message(AnalysisSource::Photo)),
        )
        .await?;
        let new = meal_from_analysis(
            &analysis,
            &analysis.meal_description,
            content,
            Some(image_url.clone()),
            date.unwrap_or(now.date()),
            now,
        );
        let (meal, stored) =
            meals::repo::create_with_analysis(&st.db, user_id, &new, &analysis.to_new_analysis())
                .await?;
        anyhow::Ok((reply, meal, stored))
    }
    .await;

    match logged {
        Ok((reply, meal, analysis)) => {
            info!(%user_id, meal_id = %meal.id, "meal logged from photo");
            Ok(ChatTurn {
                messages: vec![user_message, reply],
                meal: Some(meal),
                analysis: Some(analysis),
            })
        }
        Err(e) => {
            st.errors.record(user_id, "processImage", &e);
            let reply = repo::create(&st.db, user_id, &NewMessage::reply(texts::IMAGE_FAILED)).await?;
            Ok(ChatTurn::new(vec![user_message, reply]))
        }
    }
}

/// Applies hand-corrected macros to a meal and reports back in the chat.
pub async fn edit_nutrition(
    st: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
    values: MacroValues,
) -> anyhow::Result<NutritionEdit> {
    let meal = match meals::repo::update_macros(&st.db, user_id, meal_id, values).await {
        Ok(meal) => meal,
        Err(e) => {
            st.errors.record(user_id, "updateNutritionValues", &e);
            repo::create(&st.db, user_id, &NewMessage::reply(texts::EDIT_FAILED)).await?;
            return Err(e);
        }
    };
    let reply = match &meal {
        Some(_) => texts::nutrition_updated(&values),
        None => texts::LAST_MEAL_MISSING.to_string(),
    };
    let message = repo::create(&st.db, user_id, &NewMessage::reply(reply)).await?;
    Ok(NutritionEdit { meal, message })
}

/// Starts a fresh conversation; earlier messages stay stored.
pub async fn clear(st: &AppState, user_id: Uuid) -> anyhow::Result<Message> {
    let marker = repo::create(&st.db, user_id, &NewMessage::reset_marker(texts::CHAT_CLEARED)).await?;
    info!(%user_id, "chat cleared");
    Ok(marker)
}
