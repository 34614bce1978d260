pub mod cookies;
pub mod routes;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::database::RecordStore;
use crate::services::{ActivityScheduler, MemberRegistry};
use routes::{activities, health, home, members, search};

#[derive(Clone)]
pub struct AppState {
    pub registry: MemberRegistry,
    pub scheduler: ActivityScheduler,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, delete_ttl: Duration) -> Self {
        Self {
            registry: MemberRegistry::new(store.clone()).with_delete_ttl(delete_ttl),
            scheduler: ActivityScheduler::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home_handler))
        .route(
            "/members",
            get(members::manage_handler).post(members::create_handler),
        )
        .route("/members/new", get(members::new_member_handler))
        .route("/members/search", get(search::search_handler))
        .route("/members/:member_id", post(members::update_handler))
        .route("/members/:member_id/delete", post(members::delete_handler))
        .route(
            "/activities",
            get(activities::activities_handler).post(activities::create_activity_handler),
        )
        .route("/activities/new", get(activities::new_activity_handler))
        .route("/health", get(health::health_handler))
        .nest_service("/assets", get_service(ServeDir::new("assets")))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

pub fn render(template: &impl Template) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
