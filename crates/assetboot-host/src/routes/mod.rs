//! HTTP routes of the asset host.
//!
//! Static directories match the controller's flash filesystem layout so a
//! page bootstrapped against this host requests exactly the paths it would
//! request from the device.

pub mod stats;

use axum::{
    extract::{Request, State},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use crate::AppState;

/// Directories served verbatim from the asset root.
pub const STATIC_DIRS: [&str; 4] = ["css", "js", "img", "webfonts"];

/// Create the main Axum router with all routes.
///
/// Routes are organized as:
/// - `/css/`, `/js/`, `/img/`, `/webfonts/` - static assets
/// - `/manifest.json` - web app manifest
/// - `/hostStats` - request statistics
/// - `/` - pages from `html/`
pub fn create_router(state: AppState) -> Router {
    let root = state.root().to_path_buf();

    let mut router = Router::new().route("/hostStats", get(stats::stats_handler));
    for dir in STATIC_DIRS {
        router = router.nest_service(
            &format!("/{}", dir),
            ServeDir::new(root.join(dir)).not_found_service(not_found.into_service()),
        );
    }

    router
        .route_service("/manifest.json", ServeFile::new(root.join("manifest.json")))
        .fallback_service(
            ServeDir::new(root.join("html"))
                .append_index_html_on_directories(true)
                .not_found_service(not_found.into_service()),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(state)
}

/// Answer for anything the filesystem does not have.
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Record every request in the host statistics.
async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    debug!("{} {} -> {}", method, path, status);
    if path != "/hostStats" {
        state.stats().record(&method, &path, status);
    }
    response
}
