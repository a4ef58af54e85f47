use minesweeper_common::{
    models::{GameParams, Pos},
    protocol::{
        BoardState, ErrorResponse, NewGameResponse, PlayAgentRequest, PlayAgentResponse,
        StepRequest,
    },
};
use rocket::{
    Build, Request, Rocket, State, catch, catchers, delete, get,
    http::Status,
    post,
    response::{self, Responder},
    routes,
    serde::json::{self, Json},
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::GameError,
    rate_limit::{ClientIp, RateLimiter, TrustedProxies},
    registry::Registry,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error("too many games created, try again later")]
    RateLimited,
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::Game(GameError::UnknownGame(_)) => Status::NotFound,
            ApiError::Game(_) | ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::RateLimited => Status::TooManyRequests,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        debug!("Responding with {}: {}", status, self);
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .respond_to(req)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Bodies that may be omitted entirely; an empty body means defaults.
fn optional_body<T: Default>(body: Result<Json<T>, json::Error<'_>>) -> Result<T, ApiError> {
    match body {
        Ok(value) => Ok(value.into_inner()),
        Err(json::Error::Parse(raw, _)) if raw.trim().is_empty() => Ok(T::default()),
        Err(e) => {
            warn!("Rejecting malformed request body: {}", e);
            Err(ApiError::BadRequest(e.to_string()))
        }
    }
}

fn rate_limited(rate_limiter: &RateLimiter, client_ip: &ClientIp) -> Result<(), ApiError> {
    rate_limiter.check(client_ip.0).map_err(|_| {
        warn!("Rate limit exceeded for client {}", client_ip.0);
        ApiError::RateLimited
    })
}

#[post("/new_game", data = "<params>")]
#[instrument(level = "trace", skip_all, fields(client_ip = %client_ip.0))]
pub fn new_game(
    params: Result<Json<GameParams>, json::Error<'_>>,
    registry: &State<Registry>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> ApiResult<NewGameResponse> {
    let params = optional_body(params)?;
    info!(
        "Game creation request from {}: {}x{} with {} mines",
        client_ip.0, params.height, params.width, params.mines
    );

    rate_limited(rate_limiter, &client_ip)?;
    let (game_id, state) = registry.new_game(&params)?;

    info!("Successfully created game {} for client {}", game_id, client_ip.0);
    Ok(Json(NewGameResponse { game_id, state }))
}

#[post("/step?<id>", data = "<request>")]
#[instrument(level = "trace", skip(request, registry), fields(game_id = %id))]
pub async fn step(
    id: &str,
    request: Json<StepRequest>,
    registry: &State<Registry>,
) -> ApiResult<BoardState> {
    let request = request.into_inner();
    debug!(
        "Player {:?} at ({}, {}) in game {}",
        request.action, request.row, request.col, id
    );
    let state = registry
        .step(id, request.action, Pos::new(request.row, request.col))
        .await?;
    Ok(Json(state))
}

#[get("/state?<id>")]
#[instrument(level = "trace", skip(registry), fields(game_id = %id))]
pub async fn state(id: &str, registry: &State<Registry>) -> ApiResult<BoardState> {
    Ok(Json(registry.state(id).await?))
}

#[post("/play_agent?<id>", data = "<request>")]
#[instrument(level = "trace", skip_all, fields(game_id = ?id, client_ip = %client_ip.0))]
pub async fn play_agent(
    id: Option<&str>,
    request: Result<Json<PlayAgentRequest>, json::Error<'_>>,
    registry: &State<Registry>,
    rate_limiter: &State<RateLimiter>,
    client_ip: ClientIp,
) -> ApiResult<PlayAgentResponse> {
    let request = optional_body(request)?;
    if id.is_none() {
        rate_limited(rate_limiter, &client_ip)?;
    }

    info!(
        "Agent {} requested for {}",
        request.agent.name(),
        id.unwrap_or("a new game")
    );
    let response = registry.play_agent(id, &request).await?;
    info!(
        "Agent {} played {} passes in game {}",
        request.agent.name(),
        response.frames.len(),
        response.game_id
    );
    Ok(Json(response))
}

#[delete("/game?<id>")]
#[instrument(level = "trace", skip(registry), fields(game_id = %id))]
pub fn delete_game(id: &str, registry: &State<Registry>) -> Result<Status, ApiError> {
    registry.remove(id)?;
    Ok(Status::NoContent)
}

fn error_body(status: Status, req: &Request<'_>) -> Json<ErrorResponse> {
    warn!("{} {} failed with {}", req.method(), req.uri(), status);
    Json(ErrorResponse {
        error: status.reason_lossy().to_lowercase(),
    })
}

#[catch(400)]
fn bad_request(req: &Request<'_>) -> Json<ErrorResponse> {
    error_body(Status::BadRequest, req)
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Json<ErrorResponse> {
    error_body(Status::NotFound, req)
}

#[catch(422)]
fn unprocessable(req: &Request<'_>) -> Json<ErrorResponse> {
    error_body(Status::UnprocessableEntity, req)
}

#[catch(429)]
fn too_many_requests(req: &Request<'_>) -> Json<ErrorResponse> {
    error_body(Status::TooManyRequests, req)
}

#[catch(500)]
fn internal_error(req: &Request<'_>) -> Json<ErrorResponse> {
    error_body(Status::InternalServerError, req)
}

/// Registers the game state, routes and JSON error catchers.
pub fn stage(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .manage(Registry::new())
        .manage(RateLimiter::from_env())
        .manage(TrustedProxies::from_env())
        .mount(
            "/",
            routes![new_game, step, state, play_agent, delete_game],
        )
        .register(
            "/",
            catchers![
                bad_request,
                not_found,
                unprocessable,
                too_many_requests,
                internal_error
            ],
        )
}
