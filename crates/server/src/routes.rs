//! HTTP endpoints over the arena handle.
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use duel_core::{ActionError, CardId, CardPick, Match, MatchId, PlayerId, StatBlock};
use duel_runtime::{ArenaError, ArenaHandle, JoinRequest};

pub fn router(handle: ArenaHandle) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/join-matchmaking", post(join_matchmaking))
        .route("/leave-matchmaking", post(leave_matchmaking))
        .route("/api/battle/:match_id", get(get_match))
        .route("/api/battle/:match_id/select-card", post(select_card))
        .route("/api/battle/:match_id/select-ability", post(select_ability))
        .route("/api/battle/:match_id/endTurn", post(end_turn))
        .route("/api/battle/:match_id/cancelMatch", post(cancel_match))
        .with_state(handle)
}

// ----------------------------------------------------------------------
// Bodies
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinBody {
    user_id: PlayerId,
    user_name: String,
    synergy: u32,
    #[serde(default)]
    photo: Option<String>,
    #[serde(default)]
    tutorial: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveBody {
    user_id: PlayerId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectCardBody {
    player_id: PlayerId,
    card_id: CardId,
    stats: StatBlock,
    #[serde(default)]
    photo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectAbilityBody {
    player_id: PlayerId,
    ability_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerBody {
    player_id: PlayerId,
}

#[derive(Debug, Serialize)]
struct Ack {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Ack {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
        })
    }

    fn with_message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

// ----------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------

pub struct ApiError(ArenaError);

impl From<ArenaError> for ApiError {
    fn from(error: ArenaError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ArenaError::Action(ActionError::MatchNotFound(_)) => StatusCode::NOT_FOUND,
            ArenaError::Action(ActionError::DuplicateAction { .. })
            | ArenaError::Action(ActionError::AlreadyInMatch(_)) => StatusCode::CONFLICT,
            ArenaError::Action(_) | ArenaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.0.error_code(), self.0);
        }

        let body = ErrorBody {
            success: false,
            error: self.0.to_string(),
            code: self.0.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ----------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------

async fn health() -> &'static str {
    "ok"
}

async fn join_matchmaking(
    State(arena): State<ArenaHandle>,
    Json(body): Json<JoinBody>,
) -> ApiResult<Json<Ack>> {
    let request = JoinRequest::new(body.user_id, body.user_name, body.synergy)
        .photo(body.photo)
        .tutorial(body.tutorial);
    arena.join_queue(request).await?;
    Ok(Ack::ok())
}

async fn leave_matchmaking(
    State(arena): State<ArenaHandle>,
    Json(body): Json<LeaveBody>,
) -> ApiResult<Json<Ack>> {
    arena.leave_queue(&body.user_id).await?;
    Ok(Ack::ok())
}

async fn get_match(
    State(arena): State<ArenaHandle>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<Match>> {
    let m = arena
        .get_match(&match_id)
        .await?
        .ok_or_else(|| ArenaError::from(ActionError::MatchNotFound(match_id)))?;
    Ok(Json(m))
}

async fn select_card(
    State(arena): State<ArenaHandle>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<SelectCardBody>,
) -> ApiResult<Json<Ack>> {
    let pick = CardPick {
        card_id: body.card_id,
        stats: body.stats,
        photo_ref: body.photo,
    };
    arena.select_card(&match_id, &body.player_id, pick).await?;
    Ok(Ack::with_message("Card selected"))
}

async fn select_ability(
    State(arena): State<ArenaHandle>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<SelectAbilityBody>,
) -> ApiResult<Json<Ack>> {
    let key = arena
        .select_ability(&match_id, &body.player_id, &body.ability_key)
        .await?;
    Ok(Ack::with_message(format!("Ability {key} selected")))
}

async fn end_turn(
    State(arena): State<ArenaHandle>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<PlayerBody>,
) -> ApiResult<Json<Ack>> {
    arena.end_turn(&match_id, &body.player_id).await?;
    Ok(Ack::ok())
}

async fn cancel_match(
    State(arena): State<ArenaHandle>,
    Path(match_id): Path<MatchId>,
    Json(body): Json<PlayerBody>,
) -> ApiResult<Json<Ack>> {
    let outcome = arena.cancel_match(&match_id, &body.player_id).await?;
    let message = match outcome.winner {
        Some(winner) => format!("Match cancelled, {winner} wins"),
        None => "Match cancelled".to_owned(),
    };
    Ok(Ack::with_message(message))
}
