use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::command_processor::analyze_handler::AnalysisKind;
use crate::command_processor::{
    Attachment, CommandArgs, CommandError, CommandProcessor, ErrorKind, Reply,
};
use crate::env_manager;

/// Largest accepted upload, matching common chat attachment limits
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// Multipart text fields forwarded to the analyze commands as flags
const WINDOW_FIELDS: &[&str] = &["days", "start_day", "end_day", "sort"];

// API state that will be shared across handlers
pub struct ApiState {
    pub processor: CommandProcessor,
    pub owner_token: Option<SecretString>,
}

impl ApiState {
    pub fn new(processor: CommandProcessor, owner_token: Option<SecretString>) -> Self {
        Self { processor, owner_token }
    }
}

fn respond(reply: Reply) -> Response {
    let status = match &reply {
        Reply::Error { error, .. } => match error {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::OK,
    };
    (status, Json(reply)).into_response()
}

fn usage_error(message: String) -> Response {
    respond(Reply::from_error(&CommandError::Usage(message).into()))
}

async fn health_check() -> &'static str {
    "CallDesk API is running"
}

async fn list_commands_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.processor.commands().to_vec())
}

async fn analyze_etd_handler(State(state): State<Arc<ApiState>>, multipart: Multipart) -> Response {
    analyze(state, AnalysisKind::Etd, multipart).await
}

async fn analyze_special_handler(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Response {
    analyze(state, AnalysisKind::Special, multipart).await
}

async fn analyze(state: Arc<ApiState>, kind: AnalysisKind, mut multipart: Multipart) -> Response {
    let mut flags = HashMap::new();
    let mut attachment = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return usage_error(format!("Invalid upload: {}", e)),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            match field.bytes().await {
                Ok(bytes) => attachment = Some(Attachment { filename, bytes: bytes.to_vec() }),
                Err(e) => return usage_error(format!("Could not read uploaded file: {}", e)),
            }
        } else if WINDOW_FIELDS.contains(&name.as_str()) {
            match field.text().await {
                Ok(value) if value.trim().is_empty() => {}
                Ok(value) => {
                    flags.insert(name.replace('_', "-"), Some(value));
                }
                Err(e) => return usage_error(format!("Could not read field '{}': {}", name, e)),
            }
        } else {
            debug!("Ignoring unknown multipart field '{}'", name);
        }
    }

    let mut args = CommandArgs::new(kind.command().to_string(), vec![], flags);
    if let Some(attachment) = attachment {
        args = args.with_attachment(attachment);
    }
    respond(state.processor.dispatch(args).await)
}

async fn navigate(state: &ApiState, command: &str, id: String) -> Response {
    let args = CommandArgs::new(command.to_string(), vec![id], HashMap::new());
    respond(state.processor.dispatch(args).await)
}

async fn show_page_handler(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    navigate(&state, "page", id).await
}

async fn next_page_handler(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    navigate(&state, "next", id).await
}

async fn previous_page_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Response {
    navigate(&state, "previous", id).await
}

async fn close_session_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Response {
    navigate(&state, "close", id).await
}

async fn sync_handler(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let owner = env_manager::is_owner_token(state.owner_token.as_ref(), presented);
    if !owner {
        warn!("Rejected sync request without a valid owner token");
    }
    let args = CommandArgs::new("sync".to_string(), vec![], HashMap::new()).as_owner(owner);
    respond(state.processor.dispatch(args).await)
}

pub fn router(state: Arc<ApiState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/commands", get(list_commands_handler))
        .route("/analyze/etd", post(analyze_etd_handler))
        .route("/analyze/special", post(analyze_special_handler))
        .route("/sessions/{id}", get(show_page_handler).delete(close_session_handler))
        .route("/sessions/{id}/next", post(next_page_handler))
        .route("/sessions/{id}/previous", post(previous_page_handler))
        .route("/sync", post(sync_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

pub async fn start_api_server(state: Arc<ApiState>) -> Result<()> {
    let addr = state.processor.context().config.server.bind_address.clone();
    let app = router(state);

    info!("API server starting on http://{}", addr);
    let listener =
        TcpListener::bind(&addr).await.map_err(|e| anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("API server successfully bound to {}. Waiting for connections...", addr);
    axum::serve(listener, app).await.map_err(|e| anyhow!("Failed to start API server: {}", e))?;

    Ok(())
}
