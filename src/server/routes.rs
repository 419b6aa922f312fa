use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use super::{error::ApiError, state::AppState};
use crate::query::{DEFAULT_PAGE, PageResult, ProcessingStats, QueryError, RowFilter};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    diet: Option<String>,
    q: Option<String>,
    filter: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    diet: Option<String>,
    filter: Option<String>,
}

/// Parse a 1-based paging parameter; values below 1 clamp to 1
fn paging_param(name: &'static str, value: Option<&str>, default: usize) -> Result<usize, QueryError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<i64>()
            .map(|n| n.max(1) as usize)
            .map_err(|_| QueryError::InvalidParameter {
                name,
                value: v.to_string(),
            }),
    }
}

pub async fn raw_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.query.raw().await.map_err(ApiError::Text)?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], bytes))
}

pub async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResult>, ApiError> {
    let page = paging_param("page", params.page.as_deref(), DEFAULT_PAGE)?;
    let page_size = paging_param(
        "pageSize",
        params.page_size.as_deref(),
        state.default_page_size,
    )?;
    // `q` wins when both keyword parameters are given
    let keyword = params.q.filter(|q| !q.is_empty()).or(params.filter);
    let filter = RowFilter::new(params.diet, keyword);

    Ok(Json(state.query.page(&filter, page, page_size).await?))
}

pub async fn stats_handler(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<ProcessingStats>, ApiError> {
    let filter = RowFilter::new(params.diet, params.filter);
    Ok(Json(state.query.stats(&filter).await?))
}
