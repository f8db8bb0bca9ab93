use crate::dtos::{CreateItemRequest, CreateItemResponse, ItemResponse, ListItemsParams};
use crate::models::{Item, ListQuery};
use crate::services::deadline::within;
use crate::services::metrics::{record_item_created, record_store_error};
use crate::startup::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::time::Duration;
use validator::Validate;

/// Budget for each store call made on behalf of a request.
pub const STORE_DEADLINE: Duration = Duration::from_secs(3);

pub async fn list_items(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let Query(pairs) = pairs.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    let params = ListItemsParams::from_pairs(pairs);
    let query = ListQuery::from_params(&params)?;

    let items = within("find items", STORE_DEADLINE, state.store.find_many(&query))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "Failed to list items");
            record_store_error("find_many");
        })?;

    tracing::debug!(count = items.len(), skip = query.skip, limit = query.limit, "Listed items");

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("invalid id")))?;

    let item = within("find item", STORE_DEADLINE, state.store.find_one(id))
        .await
        .inspect_err(|e| {
            tracing::error!(item_id = %id, error = %e, "Failed to fetch item");
            record_store_error("find_one");
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("item not found")))?;

    Ok(Json(ItemResponse::from(item)))
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateItemResponse>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    req.validate()?;
    let Some(name) = req.name else {
        return Err(AppError::BadRequest(anyhow::anyhow!("name is required")));
    };

    let item = Item::new(name);

    let id = within("insert item", STORE_DEADLINE, state.store.insert_one(&item))
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "Failed to insert item");
            record_store_error("insert_one");
        })?;

    record_item_created();
    tracing::info!(item_id = %id, name = %item.name, "Item created");

    Ok((
        StatusCode::CREATED,
        Json(CreateItemResponse { id: id.to_hex() }),
    ))
}
