use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::error::FeedError;
use crate::fetch::FetchGateway;
use crate::scheduler::{refresh_source, FeedCache};
use crate::types::SourceExtractor;

#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<Vec<Box<dyn SourceExtractor>>>,
    pub gateway: Arc<FetchGateway>,
    pub cache: Arc<FeedCache>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(|| async { "ok" }))
        .route("/{feed}", get(serve_feed))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Human-readable index of the registered feed routes.
async fn index(State(state): State<AppState>) -> Html<String> {
    let mut page = String::from("<html><head><title>rssdepot</title></head><body>\n");
    page.push_str("<h1>Available feeds</h1>\n<ul>\n");
    for extractor in state.feeds.iter() {
        let source = extractor.source();
        page.push_str(&format!(
            "<li><a href=\"{path}\">{title}</a> — {description}</li>\n",
            path = source.path,
            title = source.title,
            description = source.description,
        ));
    }
    page.push_str("</ul>\n</body></html>\n");
    Html(page)
}

/// Serve a feed from the cache; on a cold-start miss, rebuild it
/// synchronously (identical to one scheduler tick for this source alone).
/// Concurrent misses may each rebuild — redundant but idempotent.
async fn serve_feed(State(state): State<AppState>, Path(feed): Path<String>) -> Response {
    let path = format!("/{feed}");
    let Some(extractor) = state
        .feeds
        .iter()
        .find(|e| e.source().path == path)
    else {
        return (StatusCode::NOT_FOUND, "no such feed").into_response();
    };

    if let Some(document) = state.cache.get(&path) {
        return xml_response(document);
    }

    tracing::info!(source = %path, "cold start, rebuilding synchronously");
    match refresh_source(&state.gateway, extractor.as_ref(), &state.cache).await {
        Ok(()) => match state.cache.get(&path) {
            Some(document) => xml_response(document),
            None => unavailable_page(&FeedError::SourceUnavailable(
                "rebuild produced no document".to_string(),
            )),
        },
        Err(e) => {
            tracing::warn!(source = %path, error = %e, "on-demand rebuild failed");
            unavailable_page(&e)
        }
    }
}

fn xml_response(document: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        document,
    )
        .into_response()
}

/// Typed 503 page. Relay trouble gets its own message because the fix
/// ("start the relay") is different from an upstream outage.
fn unavailable_page(err: &FeedError) -> Response {
    let explanation = match err {
        FeedError::RelayUnavailable(_) => {
            "The anti-bot relay is not reachable. Start the relay and point \
             FLARESOLVERR_URL at it, then try again."
        }
        FeedError::SourceUnavailable(_) | FeedError::MalformedPayload(_) => {
            "The upstream site could not be reached or returned an unusable \
             page. The feed will recover on a later refresh."
        }
    };
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(format!(
            "<html><body><h1>Feed unavailable</h1><p>{explanation}</p>\
             <p><small>{err}</small></p></body></html>"
        )),
    )
        .into_response()
}
