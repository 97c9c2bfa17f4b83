//! Servidor web Axum para conversão Concrete ⇄ BP-JSON

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use concrete_core::{
    Communication, ConversionError, ConversionPipeline, Corpus, CorpusEntry, JsonCodec,
    RecordCodec,
};
use serde::Serialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:9000";

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: ConversionPipeline,
    codec: JsonCodec,
}

/// Configuração do servidor (endereço vem de `CONCRETE_WEB_ADDR`)
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    addr: SocketAddr,
}

impl ServerConfig {
    fn from_env() -> Result<Self, std::net::AddrParseError> {
        let raw = std::env::var("CONCRETE_WEB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, std::net::AddrParseError> {
        Ok(Self { addr: raw.parse()? })
    }
}

/// Erros da API, sempre respondidos como `{"error": ...}`
#[derive(Debug)]
enum ApiError {
    /// Entrada inválida ou não conversível → 422
    Conversion(ConversionError),
    /// Falha do próprio servidor (ex.: tarefa de lote abortada) → 500
    Internal(String),
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        ApiError::Conversion(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Conversion(err) => {
                warn!(error = %err, "conversão rejeitada");
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Internal(message) => {
                error!(error = %message, "falha interna");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Serializa a resposta com o codec do servidor
fn encode<T: Serialize>(codec: &JsonCodec, record: &T) -> Result<Response, ApiError> {
    let bytes = codec.serialize(record)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState {
        pipeline: ConversionPipeline::new(),
        codec: JsonCodec::default(),
    });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("🚀 Servidor de conversão iniciado em http://{}", config.addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/about", get(about_handler))
        .route("/alive", get(alive_handler))
        .route("/from-concrete", post(from_concrete_handler))
        .route("/to-concrete", post(to_concrete_handler))
        .route("/corpus/to-concrete", post(corpus_to_concrete_handler))
        .layer(cors)
        .with_state(state)
}

async fn about_handler() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn alive_handler() -> impl IntoResponse {
    Json(true)
}

/// Communication → entrada BP-JSON
async fn from_concrete_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let communication: Communication = state.codec.deserialize(&body)?;
    let entry = state.pipeline.to_bpjson(&communication)?;
    info!(doc_id = %entry.doc_id, "Concrete → BP-JSON");
    encode(&state.codec, &entry)
}

/// Entrada BP-JSON → Communication
async fn to_concrete_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let entry: CorpusEntry = state.codec.deserialize(&body)?;
    let communication = state.pipeline.to_concrete(&entry)?;
    info!(entry_id = %entry.entry_id, "BP-JSON → Concrete");
    encode(&state.codec, &communication)
}

/// Corpus BP-JSON inteiro → lista de Communications
async fn corpus_to_concrete_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let corpus: Corpus = state.codec.deserialize(&body)?;
    // rayon bloqueia a thread; tira o lote do runtime async
    let pipeline = state.pipeline.clone();
    let communications =
        tokio::task::spawn_blocking(move || pipeline.corpus_to_concrete(&corpus)).await??;
    encode(&state.codec, &communications)
}
