use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use auth::{
    clear_session_cookie, session_cookie, session_token_from_cookie_header, AuthConfig,
    LocalAuthProvider, SIGN_UP_SUCCESS,
};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State, WebSocketUpgrade},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use anyhow::Context as _;
use chrono::{DateTime, Utc};
use color_analysis::SeasonPalettes;
use color_wheel::{ColorWheel, SvgOptions, BASE_HUES, DEFAULT_SECTOR_COUNT};
use serde::Deserialize;
use server_api::{
    classify_clothing, classify_color, classify_season, color_wheel_navigation, detect_undertone, new_wheel,
    pages::{self, Notice},
    resolve_session, select_sector, sign_in, sign_out, sign_up, validate_lighting, wheel_error,
    ApiContext, NavigationTarget, SessionState, MAX_IMAGE_BYTES,
};
use shared::{
    domain::{ColorSector, SectorId, Session, UserId},
    error::{ApiError, ErrorCode},
    protocol::{
        ClassifyClothingQuery, ClassifyClothingResponse, ClassifyColorRequest,
        ClassifyColorResponse, ClassifySeasonRequest, ClassifySeasonResponse, LightingReport,
        SelectSectorRequest, ServerEvent, SignInForm, SignUpForm, UndertoneReport, WheelSnapshot,
    },
};
use storage::Storage;
use tokio::sync::{broadcast, Mutex};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod config;

use config::{load_settings, prepare_database_url, Settings};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(600);
const MAX_SVG_SECTORS: usize = 720;

struct AppState {
    api: ApiContext,
    storage: Storage,
    events: broadcast::Sender<ServerEvent>,
    /// One wheel per signed-in session, keyed by session id.
    wheels: Mutex<HashMap<String, ColorWheel>>,
}

type HttpError = (StatusCode, Json<ApiError>);

#[derive(Debug, Deserialize)]
struct WheelSvgQuery {
    selected: Option<usize>,
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    check_wheel_settings(&settings)?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let palettes = SeasonPalettes::load(&settings.palettes_path).map_err(|error| {
        error!(path = %settings.palettes_path, %error, "failed to load season palettes");
        error
    })?;

    let auth = LocalAuthProvider::new(
        storage.clone(),
        AuthConfig {
            session_secret: settings.session_secret.clone(),
            session_ttl_seconds: settings.session_ttl_seconds,
        },
    );
    let api = ApiContext {
        auth: Arc::new(auth),
        palettes: Arc::new(palettes),
        match_threshold: settings.palette_match_threshold,
        wheel_sector_count: settings.wheel_sector_count,
    };
    let (events, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        api,
        storage,
        events,
        wheels: Mutex::new(HashMap::new()),
    });
    tokio::spawn(purge_expired_sessions(state.clone()));
    let app = build_router(state);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Rejects a configured sector count the wheel cannot be built with.
fn check_wheel_settings(settings: &Settings) -> anyhow::Result<()> {
    ColorWheel::new(settings.wheel_sector_count, &BASE_HUES)
        .map(drop)
        .with_context(|| {
            format!(
                "invalid wheel_sector_count {}",
                settings.wheel_sector_count
            )
        })
}

async fn purge_expired_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(error) = sweep_sessions(&state, Utc::now()).await {
            warn!(%error, "failed to purge expired sessions");
        }
    }
}

/// Purges expired session rows and drops every wheel whose session is gone,
/// including sessions deleted on sign-out or when a lookup found them
/// expired. Returns the number of wheels dropped.
async fn sweep_sessions(state: &AppState, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let purged = state.storage.purge_expired_sessions(now).await?;

    let held: Vec<String> = state.wheels.lock().await.keys().cloned().collect();
    let mut stale = Vec::new();
    for session_id in held {
        let gone = purged.contains(&session_id)
            || state.storage.load_session(&session_id).await?.is_none();
        if gone {
            stale.push(session_id);
        }
    }

    let mut wheels = state.wheels.lock().await;
    for session_id in &stale {
        wheels.remove(session_id);
    }
    if !purged.is_empty() || !stale.is_empty() {
        info!(
            purged = purged.len(),
            wheels_dropped = stale.len(),
            wheels_held = wheels.len(),
            "purged expired sessions"
        );
    }
    Ok(stale.len())
}

fn build_router(state: Arc<AppState>) -> Router {
    let image_routes = Router::new()
        .route("/api/validate-lighting", post(http_validate_lighting))
        .route("/api/undertone", post(http_undertone))
        .route("/api/classify-clothing", post(http_classify_clothing))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_IMAGE_BYTES));

    Router::new()
        .route("/", get(landing))
        .route("/healthz", get(healthz))
        .route("/sign-up", get(sign_up_form).post(sign_up_submit))
        .route("/sign-in", get(sign_in_form).post(sign_in_submit))
        .route("/sign-out", post(sign_out_submit))
        .route("/color-wheel", get(color_wheel_page))
        .route("/color-wheel/select/:sector_id", get(color_wheel_select))
        .route("/color-wheel.svg", get(color_wheel_svg))
        .route("/api/wheel", get(http_wheel_snapshot))
        .route("/api/wheel/select", post(http_wheel_select))
        .route("/api/classify-season", post(http_classify_season))
        .route("/api/classify-color", post(http_classify_color))
        .route("/ws", get(ws_handler))
        .merge(image_routes)
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation | ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_error(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_token_from_cookie_header)
}

async fn session_state(state: &AppState, headers: &HeaderMap) -> SessionState {
    resolve_session(&state.api, session_token(headers)).await
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, HttpError> {
    match session_state(state, headers).await {
        SessionState::Active(session) => Ok(session),
        SessionState::Missing => Err(http_error(ApiError::new(
            ErrorCode::Unauthorized,
            "sign in required",
        ))),
        SessionState::Failed(reason) => Err(http_error(ApiError::internal(reason))),
    }
}

/// Runs `f` against the session's wheel, creating it on first use.
async fn with_wheel<T>(
    state: &AppState,
    session: &Session,
    f: impl FnOnce(&mut ColorWheel) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut wheels = state.wheels.lock().await;
    if !wheels.contains_key(&session.session_id) {
        let events = state.events.clone();
        let user_id = session.user.user_id;
        let wheel = new_wheel(&state.api)?.with_observer(move |sector: &ColorSector| {
            let _ = events.send(ServerEvent::ColorSelected {
                user_id,
                sector: sector.clone(),
                selected_at: Utc::now(),
            });
        });
        wheels.insert(session.session_id.clone(), wheel);
    }
    let wheel = wheels
        .get_mut(&session.session_id)
        .ok_or_else(|| ApiError::internal("wheel state missing"))?;
    f(wheel)
}

async fn landing() -> Html<String> {
    Html(pages::landing_page())
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::internal("storage unavailable")),
        )
    })?;
    Ok("ok")
}

async fn sign_up_form() -> Html<String> {
    Html(pages::sign_up_page(&SignUpForm::default(), None))
}

async fn sign_up_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignUpForm>,
) -> Response {
    match sign_up(&state.api, &form).await {
        Ok(_) => Html(pages::sign_up_page(
            &SignUpForm::default(),
            Some(&Notice::Success(SIGN_UP_SUCCESS.into())),
        ))
        .into_response(),
        Err(err) => (
            status_for(err.code),
            Html(pages::sign_up_page(&form, Some(&Notice::Error(err.message)))),
        )
            .into_response(),
    }
}

async fn sign_in_form() -> Html<String> {
    Html(pages::sign_in_page("", None))
}

async fn sign_in_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignInForm>,
) -> Response {
    match sign_in(&state.api, &form).await {
        Ok(signed_in) => (
            [(header::SET_COOKIE, session_cookie(&signed_in.token))],
            Redirect::to(NavigationTarget::ShowColorWheel.path()),
        )
            .into_response(),
        Err(err) => (
            status_for(err.code),
            Html(pages::sign_in_page(&form.email, Some(&Notice::Error(err.message)))),
        )
            .into_response(),
    }
}

async fn sign_out_submit(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let SessionState::Active(session) = session_state(&state, &headers).await {
            state.wheels.lock().await.remove(&session.session_id);
        }
        if let Err(err) = sign_out(&state.api, token).await {
            warn!(error = %err, "sign-out failed");
        }
    }
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

async fn color_wheel_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = session_state(&state, &headers).await;
    let target = color_wheel_navigation(&resolved);
    let SessionState::Active(session) = resolved else {
        return Ok(Redirect::to(target.path()).into_response());
    };

    let html = with_wheel(&state, &session, |wheel| {
        Ok(pages::color_wheel_page(&session, wheel))
    })
    .await
    .map_err(http_error)?;
    Ok(Html(html).into_response())
}

async fn color_wheel_select(
    State(state): State<Arc<AppState>>,
    Path(sector_id): Path<usize>,
    headers: HeaderMap,
) -> Result<Redirect, HttpError> {
    let resolved = session_state(&state, &headers).await;
    let target = color_wheel_navigation(&resolved);
    let SessionState::Active(session) = resolved else {
        return Ok(Redirect::to(target.path()));
    };

    with_wheel(&state, &session, |wheel| {
        select_sector(wheel, SectorId(sector_id))
    })
    .await
    .map_err(http_error)?;
    Ok(Redirect::to(target.path()))
}

async fn color_wheel_svg(Query(q): Query<WheelSvgQuery>) -> Result<Response, HttpError> {
    let count = q.count.unwrap_or(DEFAULT_SECTOR_COUNT);
    if count > MAX_SVG_SECTORS {
        return Err(http_error(ApiError::invalid_argument(format!(
            "sector count must not exceed {MAX_SVG_SECTORS}"
        ))));
    }
    let mut wheel = ColorWheel::new(count, &BASE_HUES)
        .map_err(wheel_error)
        .map_err(http_error)?;
    if let Some(selected) = q.selected {
        select_sector(&mut wheel, SectorId(selected)).map_err(http_error)?;
    }
    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        wheel.to_svg(&SvgOptions::default()),
    )
        .into_response())
}

async fn http_wheel_snapshot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WheelSnapshot>, HttpError> {
    let session = require_session(&state, &headers).await?;
    let snapshot = with_wheel(&state, &session, |wheel| Ok(wheel.snapshot()))
        .await
        .map_err(http_error)?;
    Ok(Json(snapshot))
}

async fn http_wheel_select(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SelectSectorRequest>,
) -> Result<Json<ColorSector>, HttpError> {
    let session = require_session(&state, &headers).await?;
    let sector = with_wheel(&state, &session, |wheel| select_sector(wheel, req.sector_id))
        .await
        .map_err(http_error)?;
    Ok(Json(sector))
}

async fn http_classify_season(
    Json(req): Json<ClassifySeasonRequest>,
) -> Result<Json<ClassifySeasonResponse>, HttpError> {
    classify_season(&req).map(Json).map_err(http_error)
}

async fn http_classify_color(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassifyColorRequest>,
) -> Result<Json<ClassifyColorResponse>, HttpError> {
    classify_color(&state.api, &req).map(Json).map_err(http_error)
}

async fn http_validate_lighting(body: Bytes) -> Result<Json<LightingReport>, HttpError> {
    validate_lighting(&body).map(Json).map_err(http_error)
}

async fn http_undertone(body: Bytes) -> Result<Json<UndertoneReport>, HttpError> {
    detect_undertone(&body).map(Json).map_err(http_error)
}

async fn http_classify_clothing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClassifyClothingQuery>,
    body: Bytes,
) -> Result<Json<ClassifyClothingResponse>, HttpError> {
    classify_clothing(&state.api, &query.season, &body)
        .map(Json)
        .map_err(http_error)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let session = require_session(&state, &headers).await?;
    let user_id = session.user.user_id;
    Ok(ws.on_upgrade(move |socket| ws_connection(state, socket, user_id)))
}

fn event_visible_to(event: &ServerEvent, user_id: UserId) -> bool {
    match event {
        ServerEvent::ColorSelected { user_id: owner, .. } => *owner == user_id,
    }
}

async fn ws_connection(
    state: Arc<AppState>,
    socket: axum::extract::ws::WebSocket,
    user_id: UserId,
) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id = user_id.0, skipped, "websocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !event_visible_to(&event, user_id) {
                continue;
            }
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
