//! Stand-in for the suggestions service, serving a generated mapping.
//!
//! `GET /suggestions/v1` returns the whole mapping and
//! `GET /suggestions/v1/{articleID}` the suggested identifiers of one article.
//! Inbound trace context is continued the same way the articles service does.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use clap::Parser;
use serde_json::json;

use articles_service::articles::mock_data;
use articles_service::articles::ArticleId;
use articles_service::config::ObservabilityConfig;
use articles_service::http::middleware::{trace_requests, TracingLayerState};
use articles_service::observability::{logging, LogTracer, Telemetry, TraceContext, W3cPropagator};

#[derive(Parser)]
#[command(name = "suggestions-mock")]
#[command(about = "Mock suggestions service for local runs", long_about = None)]
struct Cli {
    /// Suggestions mapping written by `articles-cli generate`
    #[arg(short, long, env = "DATA_SOURCE_FILENAME", default_value = "mocks/suggestions.json")]
    data: PathBuf,

    #[arg(short, long, env = "SUGGESTIONS_BIND", default_value = "127.0.0.1:8081")]
    bind: SocketAddr,
}

struct MockState {
    suggestions: HashMap<ArticleId, Vec<ArticleId>>,
    telemetry: Telemetry,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig::default())?;

    let suggestions = mock_data::load_suggestions(&cli.data)?;
    tracing::info!(path = %cli.data.display(), articles = suggestions.len(), "Suggestions loaded");

    let telemetry = Telemetry::new(
        Arc::new(LogTracer::new("suggestions-service")),
        Arc::new(W3cPropagator),
    );
    let tracing_state = Arc::new(TracingLayerState::new(telemetry.clone(), None));
    let state = Arc::new(MockState {
        suggestions,
        telemetry,
    });

    let app = Router::new()
        .route("/suggestions/v1", get(get_all))
        .route("/suggestions/v1/{articleID}", get(get_by_article_id))
        .with_state(state)
        .layer(middleware::from_fn_with_state(tracing_state, trace_requests));

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!(addr = %cli.bind, "Suggestions mock listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn get_all(State(state): State<Arc<MockState>>) -> Json<HashMap<ArticleId, Vec<ArticleId>>> {
    Json(state.suggestions.clone())
}

async fn get_by_article_id(
    State(state): State<Arc<MockState>>,
    Extension(ctx): Extension<TraceContext>,
    Path(article_id): Path<ArticleId>,
) -> Response {
    let (_, mut span) = state.telemetry.tracer.start(&ctx, "get suggestions for article");
    span.set_attribute("article.id", article_id.as_str());

    match state.suggestions.get(&article_id) {
        Some(ids) if !ids.is_empty() => Json(ids.clone()).into_response(),
        _ => {
            let message = format!("there are no suggestions for `{}` article", article_id);
            (StatusCode::NOT_FOUND, Json(json!({ "errors": [message] }))).into_response()
        }
    }
}
