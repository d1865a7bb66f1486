use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::barcode::{lookup_product, read_barcode, ProductLookup};
use super::dto::{
    CreateMealRequest, GalleryResponse, LikeResponse, LikedMeal, MealDetails, MealQuery,
    UpdateMealRequest,
};
use super::repo;
use super::repo_types::{MacroValues, Meal};
use super::services::{meal_update, new_meal, with_likes};
use crate::{
    achievements::services as achievements,
    auth::AuthUser,
    chat::services::{edit_nutrition, NutritionEdit},
    dates,
    error::{bad_request, internal, not_found, ApiError, ValidationError},
    llm::product::is_barcode,
    state::AppState,
    uploads::services::{read_form, store, MAX_UPLOAD_BYTES},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route(
            "/meals/barcode",
            post(scan_barcode).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/meals/:id", get(get_meal).put(update_meal).delete(delete_meal))
        .route("/meals/:id/nutrition", patch(edit_meal_nutrition))
        .route("/meals/:id/like", post(like_meal).delete(unlike_meal))
        .route("/gallery", get(gallery))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<MealQuery>,
) -> Result<Json<Vec<Meal>>, ApiError> {
    q.validate()?;
    let meals = repo::list_by_user(&state.db, user.id, q.date, q.limit, q.offset)
        .await
        .map_err(internal)?;
    Ok(Json(meals))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Meal>), ApiError> {
    let new = new_meal(body, dates::now_local(state.config.utc_offset_hours))?;
    let meal = repo::create(&state.db, user.id, &new)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, meal_id = %meal.id, "meal logged");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/meals/{}", meal.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(meal)))
}

/// Multipart form: either a `barcode` field with the digits or a `file`
/// photo of the barcode. Answers with the product's nutrition facts.
#[instrument(skip(state, mp))]
pub async fn scan_barcode(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> Result<Json<ProductLookup>, ApiError> {
    let mut form = read_form(mp).await.map_err(bad_request)?;
    let barcode = match form.text("barcode") {
        Some(code) if is_barcode(code) => code.to_string(),
        Some(_) => return Err(bad_request("barcode must contain digits only")),
        None => {
            let image = form
                .file
                .take()
                .ok_or(ValidationError::Missing { field: "barcode" })?;
            if !image.is_image() {
                return Err(bad_request("file must be an image"));
            }
            let image_url = store(&state, "barcodes", user.id, image)
                .await
                .map_err(internal)?;
            read_barcode(state.llm.as_ref(), &image_url)
                .await
                .map_err(internal)?
                .ok_or((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "No barcode found in image".to_string(),
                ))?
        }
    };

    let lookup = lookup_product(state.llm.as_ref(), &barcode)
        .await
        .map_err(internal)?;
    if !lookup.product.has_name() {
        return Err(not_found("Product"));
    }
    info!(user_id = %user.id, %barcode, found = lookup.product.found, "barcode looked up");
    Ok(Json(lookup))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, ApiError> {
    let meal = repo::get(&state.db, user.id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Meal"))?;
    let analysis = repo::get_analysis(&state.db, id).await.map_err(internal)?;
    let stats = repo::like_stats(&state.db, user.id, &[id])
        .await
        .map_err(internal)?;
    let meal = with_likes(vec![meal], stats)
        .pop()
        .ok_or_else(|| not_found("Meal"))?;
    Ok(Json(MealDetails { meal, analysis }))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> Result<Json<Meal>, ApiError> {
    let update = meal_update(body)?;
    repo::update(&state.db, user.id, id, &update)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Meal"))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if repo::delete(&state.db, user.id, id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Meal"))
    }
}

/// Manual correction of an analysed meal; the outcome is also posted to
/// the chat.
#[instrument(skip(state, body))]
pub async fn edit_meal_nutrition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MacroValues>,
) -> Result<Json<NutritionEdit>, ApiError> {
    let edit = edit_nutrition(&state, user.id, id, body)
        .await
        .map_err(internal)?;
    if edit.meal.is_none() {
        return Err(not_found("Meal"));
    }
    Ok(Json(edit))
}

#[instrument(skip(state))]
pub async fn like_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    if !repo::exists(&state.db, id).await.map_err(internal)? {
        return Err(not_found("Meal"));
    }
    repo::like(&state.db, id, user.id)
        .await
        .map_err(internal)?;
    like_response(&state, user.id, id).await
}

#[instrument(skip(state))]
pub async fn unlike_meal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, ApiError> {
    repo::unlike(&state.db, id, user.id)
        .await
        .map_err(internal)?;
    like_response(&state, user.id, id).await
}

async fn like_response(
    state: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
) -> Result<Json<LikeResponse>, ApiError> {
    let stats = repo::like_stats(&state.db, user_id, &[meal_id])
        .await
        .map_err(internal)?;
    let (likes, liked) = stats
        .first()
        .map(|(_, likes, liked)| (*likes, *liked))
        .unwrap_or((0, false));
    Ok(Json(LikeResponse { likes, liked }))
}

/// The caller's meals with like counts. Opening the gallery also checks
/// for a new streak milestone.
#[instrument(skip(state))]
pub async fn gallery(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<MealQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    q.validate()?;
    let meals = repo::list_by_user(&state.db, user.id, q.date, q.limit, q.offset)
        .await
        .map_err(internal)?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let stats = repo::like_stats(&state.db, user.id, &ids)
        .await
        .map_err(internal)?;
    let meals: Vec<LikedMeal> = with_likes(meals, stats);

    let today = dates::today(state.config.utc_offset_hours);
    let achievement = match achievements::check_streak(&state.db, user.id, today).await {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "streak check failed");
            None
        }
    };
    Ok(Json(GalleryResponse { meals, achievement }))
}
