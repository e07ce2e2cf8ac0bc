use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{campaigns, health_endpoint, webhooks};

/// Browser dashboards are expected to run on the same machine, so only
/// localhost origins for the configured port are allowed through.
fn build_localhost_cors(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_endpoint))
        .route(
            "/api/campaigns",
            get(campaigns::list_campaigns_endpoint).post(campaigns::create_campaign_endpoint),
        )
        .route(
            "/api/campaigns/{id}",
            get(campaigns::get_campaign_endpoint),
        )
        .route(
            "/api/campaigns/{id}/start",
            post(campaigns::start_campaign_endpoint),
        )
        .route(
            "/api/campaigns/{id}/stop",
            post(campaigns::stop_campaign_endpoint),
        )
        .route(
            "/api/campaigns/{id}/report",
            get(campaigns::get_report_endpoint),
        )
        .route(
            "/api/webhooks/gateway",
            post(webhooks::gateway_webhook_endpoint),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(build_localhost_cors(state.config.server.port))
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}
