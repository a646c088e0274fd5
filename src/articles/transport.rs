//! HTTP transport: decode requests, dispatch to endpoints, encode results.
//!
//! # Responsibilities
//! - Decode route parameters into typed requests (span-wrapped)
//! - Encode success envelopes as JSON (span-wrapped)
//! - Map errors to status codes and `{"error": ...}` bodies
//!
//! # Design Decisions
//! - `with_suggested` follows lenient boolean parsing: anything unparsable is `false`
//! - Only `NotFound` maps to 404. Every other error, including upstream failures,
//!   is answered with 200 and an error body, as the service always has
//! - The request context comes from the tracing middleware; without it, a
//!   background context is used

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use crate::articles::endpoint::{
    Endpoint, GetArticleEndpoint, GetArticleRequest, GetArticlesEndpoint, GetArticlesRequest,
};
use crate::articles::errors::{ArticleError, ArticleResult};
use crate::articles::service::ArticleService;
use crate::observability::{TraceContext, Tracer};

pub const ARTICLES_PATH: &str = "/articles/v1/";
pub const ARTICLE_PATH: &str = "/articles/v1/{articleID}/";

const ARTICLE_ID_PARAM: &str = "articleID";
const WITH_SUGGESTED_PARAM: &str = "with_suggested";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Endpoints and tracer shared by the article routes.
#[derive(Clone)]
pub struct TransportState {
    get_article: Arc<GetArticleEndpoint>,
    get_articles: Arc<GetArticlesEndpoint>,
    tracer: Arc<dyn Tracer>,
}

impl TransportState {
    pub fn new(service: Arc<dyn ArticleService>, tracer: Arc<dyn Tracer>, fanout_concurrency: usize) -> Self {
        Self {
            get_article: Arc::new(GetArticleEndpoint::new(service.clone(), tracer.clone())),
            get_articles: Arc::new(GetArticlesEndpoint::new(
                service,
                tracer.clone(),
                fanout_concurrency,
            )),
            tracer,
        }
    }
}

/// Routes for the article endpoints.
pub fn make_router(state: TransportState) -> Router {
    Router::new()
        .route(ARTICLES_PATH, get(get_articles_handler))
        .route(ARTICLE_PATH, get(get_article_handler))
        .with_state(state)
}

async fn get_article_handler(
    State(state): State<TransportState>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    request: Request<Body>,
) -> Response {
    let ctx = request_context(&request);
    let params = params.map(|Path(params)| params);
    let decoded = decode_get_article_request(&*state.tracer, &ctx, params, request.uri().query());
    serve(&*state.tracer, &ctx, decoded, &*state.get_article).await
}

async fn get_articles_handler(State(state): State<TransportState>, request: Request<Body>) -> Response {
    let ctx = request_context(&request);
    let decoded = decode_get_articles_request(&*state.tracer, &ctx, request.uri().query());
    serve(&*state.tracer, &ctx, decoded, &*state.get_articles).await
}

fn request_context(request: &Request<Body>) -> TraceContext {
    request
        .extensions()
        .get::<TraceContext>()
        .cloned()
        .unwrap_or_default()
}

/// Run one decoded request through its endpoint and encode the outcome.
async fn serve<E: Endpoint>(
    tracer: &dyn Tracer,
    ctx: &TraceContext,
    decoded: ArticleResult<E::Request>,
    endpoint: &E,
) -> Response {
    let request = match decoded {
        Ok(request) => request,
        Err(err) => return encode_error(tracer, ctx, &err),
    };

    match endpoint.call(ctx, request).await {
        Ok(response) => encode_response(tracer, ctx, &response),
        Err(err) => encode_error(tracer, ctx, &err),
    }
}

/// Decode the route parameters as extracted by axum; a rejected path is a
/// request-shape error like a missing parameter.
pub fn decode_get_article_request(
    tracer: &dyn Tracer,
    ctx: &TraceContext,
    params: Result<HashMap<String, String>, PathRejection>,
    query: Option<&str>,
) -> ArticleResult<GetArticleRequest> {
    let (_, _span) = tracer.start(ctx, "decode get article request");

    let params = params.map_err(|rejection| ArticleError::RequestShape(rejection.body_text()))?;
    let id = params
        .get(ARTICLE_ID_PARAM)
        .ok_or_else(|| ArticleError::RequestShape("articleID is missing in parameters".to_string()))?;

    Ok(GetArticleRequest {
        id: id.as_str().into(),
        include_suggested: with_suggested(query),
    })
}

pub fn decode_get_articles_request(
    tracer: &dyn Tracer,
    ctx: &TraceContext,
    query: Option<&str>,
) -> ArticleResult<GetArticlesRequest> {
    let (_, _span) = tracer.start(ctx, "decode get articles request");

    Ok(GetArticlesRequest {
        include_suggested: with_suggested(query),
    })
}

/// First `with_suggested` value in the query, parsed leniently.
fn with_suggested(query: Option<&str>) -> bool {
    query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == WITH_SUGGESTED_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}

/// Boolean literals accepted by the query parser.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

pub fn encode_response<T: Serialize>(tracer: &dyn Tracer, ctx: &TraceContext, response: &T) -> Response {
    let (ctx, _span) = tracer.start(ctx, "encode response");

    match serde_json::to_vec(response) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode response");
            encode_message(tracer, &ctx, StatusCode::OK, &err.to_string())
        }
    }
}

pub fn encode_error(tracer: &dyn Tracer, ctx: &TraceContext, err: &ArticleError) -> Response {
    encode_message(tracer, ctx, error_status(err), &err.to_string())
}

/// Status code for an error: 404 for a missing article, 200 otherwise.
pub fn error_status(err: &ArticleError) -> StatusCode {
    match err {
        ArticleError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    }
}

fn encode_message(tracer: &dyn Tracer, ctx: &TraceContext, status: StatusCode, message: &str) -> Response {
    let (_, mut span) = tracer.start(ctx, "encode error");
    span.set_attribute("http.status_code", status.as_u16().to_string());
    span.set_attribute("error", message);

    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error: &'a str,
    }

    match serde_json::to_vec(&ErrorBody { error: message }) {
        Ok(body) => json_response(status, body),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response(),
    }
}

fn json_response(status: StatusCode, mut body: Vec<u8>) -> Response {
    body.push(b'\n');
    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}
