use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    serve, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::constants::{self, ADMIN_TOKEN_HEADER, WELCOME_MESSAGE};
use crate::key_store::KeyStore;
use crate::llm_interaction::{LlmClient, LlmConfig};
use crate::orchestrator;
use crate::reply::{Action, TurnError, TurnInput, TurnOutput};

/// Everything needed to build and run the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Answer every turn from local rules, even when a key is set.
    pub force_local: bool,
    pub admin_token: Option<String>,
    pub initial_api_key: Option<String>,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub llm: LlmConfig,
}

impl ServerConfig {
    pub fn from_env(host: IpAddr, port: u16, force_local: bool) -> Self {
        Self {
            host,
            port,
            force_local,
            admin_token: constants::QUPAL_ADMIN_TOKEN.clone(),
            initial_api_key: constants::OPENAI_API_KEY.clone(),
            templates_dir: PathBuf::from(constants::QUPAL_TEMPLATES_DIR.as_str()),
            static_dir: PathBuf::from(constants::QUPAL_STATIC_DIR.as_str()),
            llm: LlmConfig::from_env(),
        }
    }
}

/// Body of `POST /api/chat` and of each WebSocket text frame.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub selection: Option<String>,
    #[serde(default, alias = "force_local")]
    pub local: bool,
}

impl ChatRequest {
    fn into_turn_input(self, force_local: bool, has_api_key: bool) -> TurnInput {
        TurnInput {
            action: Action::parse(self.action.as_deref()),
            message: self.message,
            selection: self.selection,
            local_override: self.local || force_local,
            has_api_key,
        }
    }
}

// Shared application state
#[derive(Clone)]
struct AppState {
    templates: Arc<AutoReloader>,
    llm: Arc<LlmClient>,
    keys: KeyStore,
    force_local: bool,
    admin_token: Option<Arc<str>>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl TurnError {
    fn status(&self) -> StatusCode {
        match self {
            TurnError::InvalidInput => StatusCode::BAD_REQUEST,
            TurnError::RemoteCallFailed(_) => StatusCode::BAD_GATEWAY,
            TurnError::NoApiKey => StatusCode::FORBIDDEN,
        }
    }

    fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[derive(Debug, Error)]
enum AdminError {
    #[error("admin access is disabled")]
    Disabled,
    #[error("invalid admin token")]
    Unauthorized,
    #[error("api_key must not be empty")]
    EmptyKey,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AdminError::Disabled => (StatusCode::FORBIDDEN, "admin_disabled"),
            AdminError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            AdminError::EmptyKey => (StatusCode::BAD_REQUEST, "invalid_input"),
        };
        warn!(%status, "Admin request rejected: {}", self);
        let body = ErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    // Use AutoReloader for development convenience
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        // Watch the templates directory for changes
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, Html<String>> {
    // Acquire env, get template, and render within the same block
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "QUPAL",
                    subtitle => "Your Thrift Shopping Assistant",
                    welcome => WELCOME_MESSAGE,
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            Html(format!("Internal Server Error: {}", e))
        })
}

async fn run_turn(state: &AppState, request: ChatRequest) -> TurnOutput {
    let api_key = state.keys.snapshot().await;
    let input = request.into_turn_input(state.force_local, api_key.is_some());
    let model = state.llm.with_key(api_key);
    orchestrator::handle_turn(&input, &model).await
}

async fn chat_handler(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    // Malformed bodies get the same error shape as empty messages.
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            warn!("Invalid chat request: {}", rejection.body_text());
            return TurnError::InvalidInput.into_response();
        }
    };
    match run_turn(&state, request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    }
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Answer one WebSocket text frame with one JSON frame.
async fn answer_frame(state: &AppState, text: &str) -> String {
    let outcome = match serde_json::from_str::<ChatRequest>(text) {
        Ok(request) => run_turn(state, request).await,
        Err(e) => {
            warn!("Invalid chat frame: {}", e);
            Err(TurnError::InvalidInput)
        }
    };
    let value = match outcome {
        Ok(reply) => serde_json::to_value(reply),
        Err(e) => serde_json::to_value(e.body()),
    };
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|e| format!(r#"{{"error":"internal","message":"{}"}}"#, e))
}

// Handle individual WebSocket connections. Turns on one socket are answered in order.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("New WebSocket connection established");

    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => {
                let answer = answer_frame(&state, &text).await;
                if socket.send(Message::Text(answer)).await.is_err() {
                    warn!("WebSocket client disconnected or send error. Closing connection.");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("Received unexpected binary message from client");
            }
            // Axum answers pings automatically
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!("Client requested WebSocket close");
                break;
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }
    info!("WebSocket connection closed");
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
    version: &'static str,
    has_api_key: bool,
    force_local: bool,
    model: String,
}

async fn status_body(state: &AppState) -> StatusBody {
    StatusBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        has_api_key: state.keys.is_set().await,
        force_local: state.force_local,
        model: state.llm.config().model.clone(),
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<StatusBody> {
    Json(status_body(&state).await)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AdminError> {
    let expected = state.admin_token.as_deref().ok_or(AdminError::Disabled)?;
    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AdminError::Unauthorized)?;
    if ct_eq(supplied.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AdminError::Unauthorized)
    }
}

/// Constant-time byte comparison for the admin token.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[derive(Debug, Deserialize)]
struct SetKeyRequest {
    api_key: String,
}

async fn set_key_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetKeyRequest>,
) -> Result<StatusCode, AdminError> {
    authorize(&state, &headers)?;
    let key = request.api_key.trim();
    if key.is_empty() {
        return Err(AdminError::EmptyKey);
    }
    state.keys.set(key.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_key_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AdminError> {
    authorize(&state, &headers)?;
    state.keys.clear().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusBody>, AdminError> {
    authorize(&state, &headers)?;
    Ok(Json(status_body(&state).await))
}

/// Build the full router for `config`. Split out from [`start_web_server`] so
/// tests can drive it without binding a port.
pub fn build_app(config: &ServerConfig) -> Result<Router> {
    let llm = LlmClient::new(config.llm.clone())
        .context("Failed to build HTTP client for model API")?;

    let state = AppState {
        templates: Arc::new(create_minijinja_env(config.templates_dir.clone())),
        llm: Arc::new(llm),
        keys: KeyStore::new(config.initial_api_key.clone()),
        force_local: config.force_local,
        admin_token: config.admin_token.as_deref().map(Arc::from),
    };

    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(&config.static_dir).not_found_service(
        tower::service_fn(|_req: Request| async {
            Ok::<_, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }),
    );

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/ws", get(ws_handler))
        .route(
            "/api/admin/api-key",
            put(set_key_handler).delete(clear_key_handler),
        )
        .route("/api/admin/status", get(admin_status_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()); // Add request logging

    Ok(app)
}

pub async fn start_web_server(config: ServerConfig) -> Result<()> {
    let app = build_app(&config)?;

    let addr = SocketAddr::new(config.host, config.port);
    info!("Web server listening on http://{}", addr);
    if config.force_local {
        info!("Local rules forced; the remote model will not be called");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        let input = request.into_turn_input(false, true);
        assert_eq!(input.message, "hi");
        assert_eq!(input.action, Action::None);
        assert!(input.selection.is_none());
        assert!(!input.local_override);
        assert!(input.has_api_key);
    }

    #[test]
    fn test_server_flag_forces_local() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"laptop"}"#).unwrap();
        assert!(request.into_turn_input(true, true).local_override);

        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"laptop","force_local":true}"#).unwrap();
        assert!(request.into_turn_input(false, true).local_override);
    }

    fn keyless_state() -> AppState {
        let llm = LlmClient::new(LlmConfig {
            api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            max_tokens: 16,
            timeout: std::time::Duration::from_secs(1),
        })
        .unwrap();
        AppState {
            templates: Arc::new(create_minijinja_env(PathBuf::from("templates"))),
            llm: Arc::new(llm),
            keys: KeyStore::new(None),
            force_local: false,
            admin_token: None,
        }
    }

    #[tokio::test]
    async fn test_ws_frames() {
        let state = keyless_state();

        let answer: serde_json::Value =
            serde_json::from_str(&answer_frame(&state, r#"{"message":"hey"}"#).await).unwrap();
        assert_eq!(answer["reply"], crate::catalog::GREETING_REPLY);

        let answer: serde_json::Value =
            serde_json::from_str(&answer_frame(&state, r#"{"message":"laptop"}"#).await).unwrap();
        assert_eq!(answer["choices"][0], "MacBook Air");

        let answer: serde_json::Value =
            serde_json::from_str(&answer_frame(&state, "not json").await).unwrap();
        assert_eq!(answer["error"], "invalid_input");
    }

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(b"admin-secret", b"admin-secret"));
        assert!(!ct_eq(b"admin-secret", b"admin-secreT"));
        assert!(!ct_eq(b"admin-secret", b"admin"));
        assert!(ct_eq(b"", b""));
    }

    #[test]
    fn test_authorize_checks_token() {
        let mut state = keyless_state();
        let mut headers = HeaderMap::new();
        assert!(matches!(authorize(&state, &headers), Err(AdminError::Disabled)));

        state.admin_token = Some(Arc::from("admin-secret"));
        assert!(matches!(authorize(&state, &headers), Err(AdminError::Unauthorized)));

        headers.insert(ADMIN_TOKEN_HEADER, "admin-secreT".parse().unwrap());
        assert!(matches!(authorize(&state, &headers), Err(AdminError::Unauthorized)));

        headers.insert(ADMIN_TOKEN_HEADER, "admin-secret".parse().unwrap());
        assert!(authorize(&state, &headers).is_ok());
    }

    #[test]
    fn test_turn_error_status_codes() {
        assert_eq!(TurnError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TurnError::RemoteCallFailed("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(TurnError::NoApiKey.status(), StatusCode::FORBIDDEN);
    }
}
