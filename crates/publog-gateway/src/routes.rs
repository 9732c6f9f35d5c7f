//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use publog_store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, cage, classification, health, inc, nsn, search};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## System
/// - `GET /api/v1/health` - Health check
/// - `GET /api/v1/stats` - Row counts per relation
/// - `GET /api/v1/tables` - Relation names
/// - `GET /api/v1/tables/:name/info` - Columns and row count
/// - `POST /api/v1/admin/initialize?force=&priority_only=` - Load and index
///
/// ## Search
/// - `GET /api/v1/search?q=&limit=` - All domains at once
///
/// ## CAGE
/// - `GET /api/v1/cage/search?q=&limit=&offset=`
/// - `GET /api/v1/cage/location?state=&city=&country=&limit=`
/// - `GET /api/v1/cage/stats`
/// - `GET /api/v1/cage/:code`
///
/// ## FSC/FSG
/// - `GET /api/v1/fsg`
/// - `GET /api/v1/fsc`
/// - `GET /api/v1/fsc/search?q=`
/// - `GET /api/v1/fsg/:fsg/fsc`
/// - `GET /api/v1/fsc/:code`
///
/// ## NSN
/// - `GET /api/v1/nsn/search?q=&fsc=&limit=&offset=`
/// - `GET /api/v1/nsn/fsc/:fsc?limit=&offset=`
/// - `GET /api/v1/nsn/:niin`
/// - `GET /api/v1/nsn/:niin/management`
/// - `GET /api/v1/nsn/:niin/characteristics`
///
/// ## Item names
/// - `GET /api/v1/inc?limit=`
/// - `GET /api/v1/inc/search?q=&limit=`
/// - `GET /api/v1/inc/:code`
pub fn create_router<S: Store + 'static>(state: GatewayState<S>) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        // System
        .route("/api/v1/health", get(health::health::<S>))
        .route("/api/v1/stats", get(admin::stats::<S>))
        .route("/api/v1/tables", get(admin::list_tables::<S>))
        .route("/api/v1/tables/:name/info", get(admin::table_info::<S>))
        .route("/api/v1/admin/initialize", post(admin::initialize::<S>))
        // Search
        .route("/api/v1/search", get(search::search_all::<S>))
        // CAGE
        .route("/api/v1/cage/search", get(cage::search::<S>))
        .route("/api/v1/cage/location", get(cage::search_by_location::<S>))
        .route("/api/v1/cage/stats", get(cage::stats::<S>))
        .route("/api/v1/cage/:code", get(cage::get_by_code::<S>))
        // FSC/FSG
        .route("/api/v1/fsg", get(classification::list_groups::<S>))
        .route("/api/v1/fsc", get(classification::list_classes::<S>))
        .route("/api/v1/fsc/search", get(classification::search::<S>))
        .route(
            "/api/v1/fsg/:fsg/fsc",
            get(classification::classes_in_group::<S>),
        )
        .route("/api/v1/fsc/:code", get(classification::get_class::<S>))
        // NSN
        .route("/api/v1/nsn/search", get(nsn::search::<S>))
        .route("/api/v1/nsn/fsc/:fsc", get(nsn::by_classification::<S>))
        .route("/api/v1/nsn/:niin", get(nsn::get_by_key::<S>))
        .route("/api/v1/nsn/:niin/management", get(nsn::management::<S>))
        .route(
            "/api/v1/nsn/:niin/characteristics",
            get(nsn::characteristics::<S>),
        )
        // Item names
        .route("/api/v1/inc", get(inc::list_all::<S>))
        .route("/api/v1/inc/search", get(inc::search::<S>))
        .route("/api/v1/inc/:code", get(inc::get_by_code::<S>))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use publog_core::Catalog;
    use publog_service::{PublogService, ServiceConfig};
    use publog_store::SqliteStore;
    use tower::ServiceExt;

    use crate::config::GatewayConfig;

    fn create_test_router(cors_origins: &[&str]) -> Router {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let catalog = Catalog::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        let service = Arc::new(PublogService::new(
            store,
            Arc::new(catalog),
            ServiceConfig::default(),
        ));
        let config = GatewayConfig {
            cors_origins: cors_origins.iter().map(|o| (*o).to_owned()).collect(),
            ..GatewayConfig::default()
        };
        create_router(GatewayState::new(service, config))
    }

    async fn preflight(app: Router, origin: &str) -> (StatusCode, Option<String>) {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_owned());
        (response.status(), allowed)
    }

    #[tokio::test]
    async fn cors_any_origin() {
        let app = create_test_router(&["*"]);
        let (status, allowed) = preflight(app, "http://elsewhere.test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn cors_specific_origins() {
        let origins = ["http://localhost:3000", "not a header\nvalue"];

        let (status, allowed) =
            preflight(create_test_router(&origins), "http://localhost:3000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(allowed.as_deref(), Some("http://localhost:3000"));

        let (_, allowed) = preflight(create_test_router(&origins), "http://evil.test").await;
        assert_eq!(allowed, None);
    }
}
