use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coordinator::SearchCoordinator;
use crate::error::{ErrorKind, SearchError};
use crate::models::{Cuisine, DataSummary, RestaurantRecord, SearchInput, SearchOverrides, SearchResponse};

/// Upper bound on `limit` accepted from a request
const MAX_PAGE_SIZE: usize = 100;

/// Page size of the listing endpoints when no `limit` is given
const DEFAULT_LISTING_SIZE: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SearchCoordinator>,
}

/// Body of `POST /api/search`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBody {
    pub query: Option<String>,
    #[serde(flatten)]
    pub overrides: SearchOverrides,
    pub limit: Option<usize>,
}

impl SearchBody {
    fn into_parts(self) -> (SearchInput, Option<usize>) {
        let input = SearchInput {
            query: self.query,
            overrides: self.overrides,
        };
        (input, self.limit.map(|limit| limit.min(MAX_PAGE_SIZE)))
    }
}

/// `?limit=` on the listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub limit: Option<usize>,
}

impl ListingQuery {
    fn page_size(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LISTING_SIZE).min(MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
        ErrorKind::ExternalService => StatusCode::SERVICE_UNAVAILABLE,
        // nginx's "client closed request"
        ErrorKind::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            warn!("Search failed: {}", self);
        }
        let body = ApiError {
            kind,
            message: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/summary", get(summary))
        .route("/popular", get(popular))
        .route("/restaurants/{id}", get(restaurant))
        .route("/cuisines/{cuisine}", get(by_cuisine))
        .route("/health", get(health))
        .with_state(state)
}

async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, SearchError> {
    let Json(body) = body.map_err(|rejection| SearchError::invalid_request(rejection.body_text()))?;
    let (input, limit) = body.into_parts();
    Ok(Json(state.coordinator.search_page(&input, limit).await?))
}

async fn restaurant(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, SearchError> {
    let response = match state.coordinator.restaurant_by_id(&id).await? {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("No restaurant with id '{id}'") })),
        )
            .into_response(),
    };
    Ok(response)
}

async fn popular(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<RestaurantRecord>>, SearchError> {
    Ok(Json(state.coordinator.popular(query.page_size()).await?))
}

async fn by_cuisine(
    State(state): State<AppState>,
    Path(cuisine): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<RestaurantRecord>>, SearchError> {
    let cuisine: Cuisine = cuisine.parse().map_err(SearchError::invalid_request)?;
    Ok(Json(state.coordinator.by_cuisine(cuisine, query.page_size()).await?))
}

async fn summary(State(state): State<AppState>) -> Result<Json<DataSummary>, SearchError> {
    Ok(Json(state.coordinator.summary().await?))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
