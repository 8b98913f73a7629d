use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::{CreateFoodRequest, Food, ServiceError, ServiceResult, UpdateFoodRequest};
use crate::observability::Metrics;
use crate::services::FoodService;

/// Shared application state for the food endpoints
#[derive(Clone)]
pub struct ApiState {
    pub food_service: Arc<FoodService>,
    pub metrics: Arc<Metrics>,
}

impl ApiState {
    fn record<T>(&self, operation: &str, result: &ServiceResult<T>) {
        let status = match result {
            Ok(_) => "success",
            Err(ServiceError::FoodNotFound { .. }) => "not_found",
            Err(ServiceError::ValidationError { .. }) => "invalid",
            Err(ServiceError::StorageUnavailable { .. }) => "error",
        };
        self.metrics.record_food_operation(operation, status);
    }
}

pub type ApiError = (StatusCode, Json<Value>);

const FOODS_SEGMENT: &str = "foods";

/// JSON body extractor whose rejections use the API's `{"detail": ...}` shape.
///
/// Malformed, mistyped or incomplete bodies are all reported as 422, as is a
/// Content-Type other than JSON. A body sent without any Content-Type is
/// still read as JSON. Oversized bodies keep their 413.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.headers().contains_key(header::CONTENT_TYPE) {
            return Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| Self(value))
                .map_err(body_rejection);
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(body_rejection)?;
        serde_json::from_slice(&bytes).map(Self).map_err(|err| {
            warn!("Rejected untyped request body: {}", err);
            detail(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        })
    }
}

fn body_rejection(rejection: impl IntoResponse + std::fmt::Display) -> ApiError {
    let message = rejection.to_string();
    let status = match rejection.into_response().status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    warn!(status = status.as_u16(), "Rejected request body: {}", message);
    detail(status, message)
}

#[instrument(name = "welcome", skip(state))]
pub async fn root(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({ "message": state.food_service.welcome() }))
}

/// Create a food; the body is the stored record, or `null` if it vanished before read-back
#[instrument(name = "create_food", skip(state, request), fields(food = %request.food))]
pub async fn create_food(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<CreateFoodRequest>,
) -> Result<(StatusCode, Json<Option<Food>>), ApiError> {
    info!("Creating food");

    let result = state.food_service.create_food(request).await;
    state.record("create", &result);

    match result {
        Ok(stored) => Ok((StatusCode::CREATED, Json(stored))),
        Err(err) => {
            error!("Failed to create food: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "list_foods", skip(state))]
pub async fn list_foods(State(state): State<ApiState>) -> Result<Json<Vec<Food>>, ApiError> {
    let result = state.food_service.list_foods().await;
    state.record("list", &result);

    match result {
        Ok(foods) => {
            info!("Successfully listed {} foods", foods.len());
            Ok(Json(foods))
        }
        Err(err) => {
            error!("Failed to list foods: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Look a food up by its exact name
#[instrument(name = "get_food", skip(state), fields(name = %name))]
pub async fn get_food(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<Food>, ApiError> {
    let result = state.food_service.get_food_by_name(&name).await;
    state.record("get", &result);

    match result {
        Ok(food) => {
            info!("Successfully retrieved food: {}", food.id);
            Ok(Json(food))
        }
        Err(err) => {
            warn!("Failed to get food {}: {}", name, err);
            Err(service_error_to_response(err))
        }
    }
}

pub async fn update_food(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateFoodRequest>,
) -> Result<Json<Food>, ApiError> {
    update_by_id(state, id, request).await
}

/// `PUT /foods` addresses the record with id `foods`; only GET lists
pub async fn update_foods_segment(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<UpdateFoodRequest>,
) -> Result<Json<Food>, ApiError> {
    update_by_id(state, FOODS_SEGMENT.to_string(), request).await
}

pub async fn delete_food(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_by_id(state, id).await
}

pub async fn delete_foods_segment(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    delete_by_id(state, FOODS_SEGMENT.to_string()).await
}

#[instrument(name = "update_food", skip(state, request), fields(id = %id))]
async fn update_by_id(
    state: ApiState,
    id: String,
    request: UpdateFoodRequest,
) -> Result<Json<Food>, ApiError> {
    let result = state.food_service.update_food(&id, request).await;
    state.record("update", &result);

    match result {
        Ok(food) => {
            info!("Successfully updated food: {}", food.id);
            Ok(Json(food))
        }
        Err(err) => {
            warn!("Failed to update food {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "delete_food", skip(state), fields(id = %id))]
async fn delete_by_id(state: ApiState, id: String) -> Result<StatusCode, ApiError> {
    let result = state.food_service.delete_food(&id).await;
    state.record("delete", &result);

    match result {
        Ok(()) => {
            info!("Successfully deleted food: {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            warn!("Failed to delete food {}: {}", id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// Fallback for paths no route matches
pub async fn not_found() -> ApiError {
    detail(StatusCode::NOT_FOUND, "Not Found")
}

/// Convert ServiceError to HTTP response
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    match err {
        ServiceError::FoodNotFound { .. } => detail(StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ValidationError { message } => {
            detail(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        ServiceError::StorageUnavailable { source } => {
            crate::error_with_trace!(error = %source, "Storage call failed");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "detail": message.into() })))
}
