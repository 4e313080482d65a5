use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{metrics_middleware, torznab_auth_middleware};
use super::{handlers, qbittorrent, torznab};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Emulated qBittorrent Web API
    let qbt_routes = Router::new()
        // Auth / app
        .route("/auth/login", post(qbittorrent::login))
        .route("/auth/logout", post(qbittorrent::logout))
        .route("/app/version", get(qbittorrent::app_version))
        .route("/app/webapiVersion", get(qbittorrent::web_api_version))
        .route("/app/preferences", get(qbittorrent::preferences))
        // Torrents
        .route("/torrents/info", get(qbittorrent::list_torrents))
        .route("/torrents/add", post(qbittorrent::add_torrents))
        .route("/torrents/delete", post(qbittorrent::delete_torrents))
        .route("/torrents/pause", post(qbittorrent::pause_torrents))
        .route("/torrents/stop", post(qbittorrent::pause_torrents))
        .route("/torrents/resume", post(qbittorrent::resume_torrents))
        .route("/torrents/start", post(qbittorrent::resume_torrents))
        .route("/torrents/properties", get(qbittorrent::torrent_properties))
        .route("/torrents/files", get(qbittorrent::torrent_files))
        // Categories
        .route("/torrents/categories", get(qbittorrent::list_categories))
        .route(
            "/torrents/createCategory",
            post(qbittorrent::acknowledge_category),
        )
        .route(
            "/torrents/setCategory",
            post(qbittorrent::acknowledge_category),
        );

    // Emulated Torznab indexer
    let torznab_routes = Router::new()
        .route("/api", get(torznab::torznab_api))
        .route("/torznab/api", get(torznab::torznab_api))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            torznab_auth_middleware,
        ));

    // Service endpoints
    let service_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/mappings", get(handlers::list_mappings))
        .route("/metrics", get(handlers::metrics));

    Router::new()
        .nest("/api/v2", qbt_routes)
        .merge(torznab_routes)
        .merge(service_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
