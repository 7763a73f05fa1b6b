//! Agent directory endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::PageParams;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{AgentDetailResponse, AgentResponse, Paginated};

/// Build the agents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents))
        .route("/{id}", get(get_agent))
}

#[derive(Debug, Deserialize)]
struct AgentListQuery {
    /// Substring search over name, email, and company
    q: Option<String>,
    #[serde(flatten)]
    pagination: PageParams,
}

/// GET /agents - Agent directory with listing counts
async fn list_agents(
    State(state): State<AppState>,
    Query(query): Query<AgentListQuery>,
) -> Result<Json<Paginated<AgentResponse>>, ApiError> {
    let (page, per_page) = query.pagination.resolve();
    let (summaries, total) = state
        .user_service
        .list_agents(query.q.as_deref(), page, per_page)
        .await?;

    let items = summaries
        .into_iter()
        .map(|s| AgentResponse {
            agent: s.agent,
            listing_count: s.listing_count,
        })
        .collect();

    Ok(Json(Paginated {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /agents/{id} - Agent profile with their listings
async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AgentDetailResponse>, ApiError> {
    let (agent, listings) = state.user_service.get_agent(id).await?;
    Ok(Json(AgentDetailResponse { agent, listings }))
}
