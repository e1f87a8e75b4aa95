use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EventDraft, EventId, NewEngagementEvent, ParticipantId, Profile, UserId};
use super::repository::{EngagementStore, StoreError};
use super::scoring::ScoreWeights;
use super::service::{EngagementService, EngagementServiceError};

/// Router builder exposing HTTP endpoints for scoring, ingestion, and event management.
pub fn engagement_router<S>(service: Arc<EngagementService<S>>) -> Router
where
    S: EngagementStore + 'static,
{
    Router::new()
        .route("/api/v1/scores", post(score_handler::<S>))
        .route("/api/v1/events", post(create_event_handler::<S>))
        .route(
            "/api/v1/events/:event_id",
            get(event_handler::<S>).delete(delete_event_handler::<S>),
        )
        .route(
            "/api/v1/events/:event_id/clone",
            post(clone_event_handler::<S>),
        )
        .route(
            "/api/v1/events/:event_id/participants",
            post(join_event_handler::<S>),
        )
        .route(
            "/api/v1/events/:event_id/leaderboard",
            get(leaderboard_handler::<S>),
        )
        .route("/api/v1/engagement", post(log_engagement_handler::<S>))
        .route(
            "/api/v1/engagement/recent",
            get(recent_activity_handler::<S>),
        )
        .route(
            "/api/v1/participants/:participant_id",
            get(participant_handler::<S>),
        )
        .route(
            "/api/v1/participants/:participant_id/refresh",
            post(refresh_handler::<S>),
        )
        .route(
            "/api/v1/participants/:participant_id/activity",
            get(participant_activity_handler::<S>),
        )
        .route(
            "/api/v1/participants/:participant_id/mentors",
            get(mentors_handler::<S>),
        )
        .route("/api/v1/profiles", put(profile_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) attendance: f64,
    pub(crate) participation: f64,
    pub(crate) resources: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) engagement_score: f64,
    pub(crate) weights: ScoreWeights,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JoinEventRequest {
    pub(crate) user_id: UserId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LimitQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// HTTP status for each service failure.
pub(crate) fn error_status(error: &EngagementServiceError) -> StatusCode {
    match error {
        EngagementServiceError::Scoring(_) | EngagementServiceError::InvalidInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngagementServiceError::NotFound(_)
        | EngagementServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        EngagementServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        EngagementServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(error: EngagementServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (error_status(&error), Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, EngagementServiceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: EngagementStore + 'static,
{
    let calculator = service.calculator();
    let result = calculator
        .calculate(request.attendance, request.participation, request.resources)
        .map(|engagement_score| ScoreResponse {
            engagement_score,
            weights: *calculator.weights(),
        })
        .map_err(EngagementServiceError::from);
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_event_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Json(draft): Json<EventDraft>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::CREATED, service.create_event(draft))
}

pub(crate) async fn event_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::OK, service.event(&EventId(event_id)))
}

pub(crate) async fn delete_event_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::OK, service.delete_event(&EventId(event_id)))
}

pub(crate) async fn clone_event_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::CREATED, service.clone_event(&EventId(event_id)))
}

pub(crate) async fn join_event_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(event_id): Path<String>,
    Json(request): Json<JoinEventRequest>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.join_event(&EventId(event_id), &request.user_id),
    )
}

pub(crate) async fn leaderboard_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::OK, service.leaderboard(&EventId(event_id)))
}

pub(crate) async fn log_engagement_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Json(request): Json<NewEngagementEvent>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::CREATED, service.log_engagement(request))
}

pub(crate) async fn recent_activity_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::OK, service.recent_activity(query.limit))
}

pub(crate) async fn participant_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(
        StatusCode::OK,
        service.participant(&ParticipantId(participant_id)),
    )
}

pub(crate) async fn refresh_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(
        StatusCode::OK,
        service.refresh_scores(&ParticipantId(participant_id)),
    )
}

pub(crate) async fn participant_activity_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(
        StatusCode::OK,
        service.participant_activity(&ParticipantId(participant_id)),
    )
}

pub(crate) async fn mentors_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Path(participant_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(
        StatusCode::OK,
        service.recommend_mentors(&ParticipantId(participant_id), query.limit),
    )
}

pub(crate) async fn profile_handler<S>(
    State(service): State<Arc<EngagementService<S>>>,
    Json(profile): Json<Profile>,
) -> Response
where
    S: EngagementStore + 'static,
{
    respond(StatusCode::OK, service.upsert_profile(profile))
}
