use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::{db::EnrichedProperty, AppState, SearchError, SearchParams, ValidationError};

/// Query string accepted by the search endpoint, for the api docs only. The handler
/// reads raw pairs so `conditions` may be repeated.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PropertySearchQuery {
    /// Case-sensitive text matched against name, city or state
    pub search_text: Option<String>,
    /// Lowest temperature in °C, between -20 and 50
    pub temp_min: Option<String>,
    /// Highest temperature in °C, between -20 and 50
    pub temp_max: Option<String>,
    /// Lowest relative humidity in percent
    pub humidity_min: Option<String>,
    /// Highest relative humidity in percent
    pub humidity_max: Option<String>,
    /// Any of clear, cloudy, drizzle, rainy, snow (case-insensitive)
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Search(e) => {
                error!("error searching properties: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal Server Error"),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/get-properties",
    params(PropertySearchQuery),
    responses(
        (status = OK, description = "Up to 20 properties whose current weather matches the filters", body = Vec<EnrichedProperty>),
        (status = BAD_REQUEST, description = "Malformed filter value", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Property store failure", body = ErrorBody)
    ))]
pub async fn get_properties(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<EnrichedProperty>>, ApiError> {
    let params = SearchParams::from_pairs(pairs);
    let filter = params.validate()?;
    info!(
        "searching properties, text: {:?}, filter: {:?}",
        params.search_text(),
        filter
    );

    let matched = state.search.search(params.search_text(), &filter).await?;
    Ok(Json(matched))
}
