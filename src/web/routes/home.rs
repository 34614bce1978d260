use askama::Template;
use axum::{extract::State, response::Response};
use tracing::warn;

use crate::services::stats_service::{self, Overview, MSG_STATS_UNAVAILABLE};
use crate::web::views::Flash;
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub overview: Overview,
    pub flashes: Vec<Flash>,
}

pub async fn home_handler(State(state): State<AppState>) -> Response {
    let mut flashes = Vec::new();
    let overview = match stats_service::load_overview(&state.registry).await {
        Ok(overview) => overview,
        Err(e) => {
            warn!("Statistics load failed: {}", e);
            flashes.push(Flash::warning(MSG_STATS_UNAVAILABLE));
            Overview::default()
        }
    };

    render(&HomeTemplate { overview, flashes })
}
