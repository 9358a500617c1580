//! AI Tutor Gateway: `POST /ask` with `{"message": "..."}`, answered as `{"reply": "..."}`.
//! Questions outside the configured subjects are refused without touching Gemini.

use aitutor_core::{load_api_key, GeminiClient, Reply, TutorConfig, TutorService};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    tutor: TutorService,
}

#[tokio::main]
async fn main() {
    // .env first so GEMINI_API_KEY and AITUTOR_* are visible to everything below.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[aitutor-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(target: "aitutor::gateway", "startup failed: {}", e);
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let api_key = load_api_key()?;
    let config = TutorConfig::load()?;
    let registry = Arc::new(config.registry()?);
    tracing::info!(
        target: "aitutor::gateway",
        subjects = ?registry.subject_names(),
        model = %config.model,
        "configuration loaded"
    );

    let upstream = Arc::new(GeminiClient::from_config(&config, api_key));
    let state = AppState {
        tutor: TutorService::new(registry, upstream),
    };
    let app = build_app(state);

    let listener = bind_first_free(&config.bind_host, &config.ports).await?;
    let addr = listener.local_addr()?;
    tracing::info!(target: "aitutor::gateway", "AI Tutor backend running at http://{}/", addr);
    tracing::info!(target: "aitutor::gateway", "Point the frontend at http://localhost:{}/ask", addr.port());

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "aitutor::gateway", "Shutdown initiated (Ctrl+C received)");
        }
    }
    Ok(())
}

/// Binds the first port in `ports` that is not already taken.
/// Busy ports are skipped; any other bind error stops the search.
async fn bind_first_free(host: &str, ports: &[u16]) -> io::Result<TcpListener> {
    for &port in ports {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                tracing::warn!(target: "aitutor::gateway", port, "port is busy, trying next");
            }
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("all configured ports are in use: {:?}", ports),
    ))
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route(
            "/ask",
            post(ask).options(preflight).fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(cors)
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    tracing::info!(
        target: "aitutor::gateway",
        method = %request.method(),
        uri = %request.uri(),
        "request received"
    );
    next.run(request).await
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": aitutor_core::version(),
        "subjects": state.tutor.registry().subject_names(),
    }))
}

/// POST /ask. Body is read as raw text; only the `message` field is looked at.
async fn ask(State(state): State<AppState>, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body);
    let reply = state.tutor.answer(&body).await;
    envelope_response(reply)
}

/// Plain OPTIONS on /ask: 200, empty body.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> Response {
    tracing::info!(target: "aitutor::gateway", method = %method, "wrong method on /ask");
    envelope_response(Reply::method_not_allowed())
}

fn envelope_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        reply.envelope.to_json(),
    )
        .into_response()
}
