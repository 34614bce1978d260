use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::database::members_repo;
use crate::web::AppState;

pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = state.registry.store();
    match members_repo::probe(store).await {
        Ok(()) => Ok(Json(json!({ "status": "ok", "backend": store.backend_tag() }))),
        Err(e) => {
            warn!(error = %e, "store_health_failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "backend": store.backend_tag(),
                    "detail": e.to_string()
                })),
            ))
        }
    }
}
