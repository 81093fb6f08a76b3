use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::alignment::{AlignmentEngine, AlignmentError};
use crate::cli::ServeArgs;
use crate::core::row::AlignmentSummary;
use crate::core::types::StrategyKind;
use crate::oracle::{OracleError, SemanticMatcher, TocCombiner};
use crate::parsing::toc::parse_toc_value;

/// Request body limit (two TOCs at the record limit fit comfortably)
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024; // 8MB

/// Headroom on top of the matcher timeout before the server gives up on a request
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

const MISSING_TOCS: &str = "Missing toc1 or toc2 in request body";

/// Shared application state
pub struct AppState {
    pub engine: AlignmentEngine,
    pub combiner: Option<Arc<dyn TocCombiner>>,
}

impl AppState {
    /// State with local alignment only
    pub fn local_only() -> Self {
        Self {
            engine: AlignmentEngine::new(),
            combiner: None,
        }
    }

    /// State backed by one client serving as matcher and combiner
    pub fn with_oracle<C>(client: Arc<C>) -> Self
    where
        C: SemanticMatcher + TocCombiner + 'static,
    {
        Self {
            engine: AlignmentEngine::with_matcher(client.clone()),
            combiner: Some(client),
        }
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlignRequest {
    pub toc1: Option<Value>,
    pub toc2: Option<Value>,
    #[serde(default)]
    pub strategy: StrategyKind,
}

#[derive(Debug, Deserialize)]
pub struct CombineRequest {
    pub toc1: Option<Value>,
    pub toc2: Option<Value>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_reply(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Routes without middleware; handy for driving the API in-process.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/align-tocs", post(align_handler))
        .route("/api/combine", post(combine_handler))
        .with_state(state)
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is rejected.
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> anyhow::Result<Router> {
    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10) // 10 requests per second per IP
        .burst_size(50) // Allow bursts of 50 requests
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = api_routes(state).layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(cors)
            // IP-based rate limiting to prevent abuse
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ))
            // Limit concurrent requests to prevent DOS
            .layer(ConcurrencyLimitLayer::new(100))
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let state = match args.oracle.build_client()? {
        Some(client) => {
            tracing::info!(model = %client.config().model, "semantic matcher enabled");
            AppState::with_oracle(Arc::new(client))
        }
        None => {
            tracing::warn!("no API key configured; only local alignment is available");
            AppState::local_only()
        }
    };

    let request_timeout = Duration::from_secs(args.oracle.oracle_timeout) + REQUEST_TIMEOUT_MARGIN;
    let app = create_router(Arc::new(state), request_timeout)?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting toc-align server at http://{addr}");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "oracle_alignment": state.engine.has_matcher(),
        "combine": state.combiner.is_some(),
    }))
}

/// Align two TOCs
async fn align_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AlignRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_reply(&rejection),
    };
    let (Some(toc1), Some(toc2)) = (request.toc1, request.toc2) else {
        return error_reply(
            StatusCode::BAD_REQUEST,
            create_safe_error_response("missing_input", MISSING_TOCS, None),
        );
    };

    let (master, candidate) = match (parse_toc_value(toc1), parse_toc_value(toc2)) {
        (Ok(master), Ok(candidate)) => (master, candidate),
        (Err(e), _) | (_, Err(e)) => {
            return error_reply(
                StatusCode::BAD_REQUEST,
                create_safe_error_response("invalid_toc", &e.to_string(), None),
            );
        }
    };

    let start_time = std::time::Instant::now();
    match state
        .engine
        .align_sequences(&master, &candidate, request.strategy)
        .await
    {
        Ok(rows) => {
            #[allow(clippy::cast_possible_truncation)] // Processing time won't exceed u64
            let processing_time = start_time.elapsed().as_millis() as u64;

            Json(serde_json::json!({
                "strategy": request.strategy,
                "summary": AlignmentSummary::from_rows(&rows),
                "rows": rows,
                "processing_info": {
                    "processing_time_ms": processing_time,
                },
            }))
            .into_response()
        }
        Err(e) => alignment_error_reply(&e),
    }
}

/// Merge two TOCs into one
async fn combine_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CombineRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_reply(&rejection),
    };
    let (Some(toc1), Some(toc2)) = (request.toc1, request.toc2) else {
        return error_reply(
            StatusCode::BAD_REQUEST,
            create_safe_error_response("missing_input", MISSING_TOCS, None),
        );
    };

    let Some(combiner) = state.combiner.as_ref() else {
        return error_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            create_safe_error_response(
                "matcher_unavailable",
                "Combining TOCs is not configured on this server",
                None,
            ),
        );
    };

    match combiner.combine(&toc1, &toc2).await {
        Ok(combined) => Json(serde_json::json!({ "combinedToc": combined })).into_response(),
        Err(e) => {
            let status = oracle_status(&e);
            error_reply(
                status,
                create_safe_error_response(
                    "oracle_error",
                    "Failed to combine TOCs",
                    Some(&e.to_string()),
                ),
            )
        }
    }
}

/// Syntax errors are 400, type mismatches 422, oversized bodies 413
fn json_rejection_reply(rejection: &JsonRejection) -> Response {
    error_reply(
        rejection.status(),
        create_safe_error_response("invalid_json", &rejection.body_text(), None),
    )
}

fn alignment_error_reply(e: &AlignmentError) -> Response {
    match e {
        AlignmentError::Validation { .. } | AlignmentError::TooManyRecords { .. } => error_reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            create_safe_error_response(e.kind(), &e.to_string(), None),
        ),
        AlignmentError::MatcherUnavailable { .. } => error_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            create_safe_error_response(
                e.kind(),
                "Semantic alignment is not configured on this server",
                None,
            ),
        ),
        AlignmentError::OracleTransport { source, .. } => error_reply(
            oracle_status(source),
            create_safe_error_response(
                e.kind(),
                "The semantic matcher could not be reached",
                Some(&e.to_string()),
            ),
        ),
        AlignmentError::OracleContract { .. } => error_reply(
            StatusCode::BAD_GATEWAY,
            create_safe_error_response(
                e.kind(),
                "The semantic matcher returned an unusable response",
                Some(&e.to_string()),
            ),
        ),
        AlignmentError::InvariantViolation { .. } => error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            create_safe_error_response(e.kind(), "Internal Server Error", Some(&e.to_string())),
        ),
    }
}

fn oracle_status(e: &OracleError) -> StatusCode {
    match e {
        OracleError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        OracleError::Transport(_)
        | OracleError::Status { .. }
        | OracleError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
    }
}
