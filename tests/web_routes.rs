use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use gym_admin::database::members_repo::MEMBERS_TABLE;
use gym_admin::database::MemoryStore;
use gym_admin::services::member_service::{MSG_CREATED, MSG_DELETED};
use gym_admin::web::{self, AppState};

const ANA_FORM: &str = "nombre=Ana&apellidos=Ruiz&nip=123456&seccion=GOA&grupo_trabajo=Grupo+3";

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::with_gym_schema());
    let router = web::router(AppState::new(store.clone(), Duration::from_secs(120)));
    (store, router)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn member_id(store: &MemoryStore, nip: &str) -> String {
    store
        .rows(MEMBERS_TABLE)
        .await
        .into_iter()
        .find(|r| r["nip"] == nip)
        .and_then(|r| r["id"].as_str().map(str::to_string))
        .unwrap()
}

#[tokio::test]
async fn pages_render_and_are_not_cached() {
    let (_store, app) = app();
    for uri in [
        "/",
        "/members/new",
        "/members",
        "/members/search",
        "/activities",
        "/activities/new",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}

#[tokio::test]
async fn create_form_reports_success_then_duplicate() {
    let (store, app) = app();

    let response = app
        .clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(MSG_CREATED));

    let response = app
        .clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Ya existe un usuario con el NIP 123456"));
    assert_eq!(store.rows(MEMBERS_TABLE).await.len(), 1);
}

#[tokio::test]
async fn search_page_lists_matches() {
    let (_store, app) = app();
    app.clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/members/search?term=ruiz&field=apellidos"))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Se encontraron 1 resultados"));
    assert!(body.contains("123456"));

    let response = app
        .oneshot(get("/members/search?term=999999&field=nip"))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("No se encontraron resultados"));
}

#[tokio::test]
async fn update_redirects_back_to_the_selected_member() {
    let (store, app) = app();
    app.clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();
    let id = member_id(&store, "123456").await;

    let edited = "nombre=Ana&apellidos=Ruiz+Soto&nip=123456&seccion=GOA&grupo_trabajo=Grupo+4";
    let response = app
        .clone()
        .oneshot(post_form(&format!("/members/{id}"), edited, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/members?selected={id}&notice=updated").as_str()
    );

    let page = app
        .oneshot(get(&format!("/members?selected={id}&notice=updated")))
        .await
        .unwrap();
    let body = body_text(page).await;
    assert!(body.contains("Usuario actualizado correctamente"));
    assert!(body.contains("Ruiz Soto"));
}

#[tokio::test]
async fn delete_needs_the_armed_cookie() {
    let (store, app) = app();
    app.clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();
    let id = member_id(&store, "123456").await;
    let uri = format!("/members/{id}/delete");

    let first = app
        .clone()
        .oneshot(post_form(&uri, "", None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let set_cookie = first.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("pending_delete="));
    assert!(body_text(first).await.contains("Presione nuevamente para confirmar"));
    assert_eq!(store.rows(MEMBERS_TABLE).await.len(), 1);

    let second = app
        .clone()
        .oneshot(post_form(&uri, "", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        second.headers()[header::LOCATION],
        "/members?notice=deleted"
    );
    assert!(store.rows(MEMBERS_TABLE).await.is_empty());

    let page = app.oneshot(get("/members?notice=deleted")).await.unwrap();
    assert!(body_text(page).await.contains(MSG_DELETED));
}

#[tokio::test]
async fn activity_form_accepts_repeated_member_keys() {
    let (store, app) = app();
    app.clone()
        .oneshot(post_form("/members", ANA_FORM, None))
        .await
        .unwrap();
    let id = member_id(&store, "123456").await;

    let form = format!(
        "titulo=Cardio&descripcion=&fecha=2026-10-20&hora_inicio=08%3A00&hora_fin=09%3A00&miembros={id}&miembros=ghost"
    );
    let response = app
        .clone()
        .oneshot(post_form("/activities", &form, None))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Actividad creada correctamente"));
    assert!(body.contains("ghost"));

    let listing = app.oneshot(get("/activities")).await.unwrap();
    assert!(body_text(listing).await.contains("Cardio"));
}

#[tokio::test]
async fn health_reflects_store_reachability() {
    let (store, app) = app();
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("\"backend\":\"memory\""));

    store.set_unreachable(true);
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Pages still render and explain the failure instead of showing nothing.
    let response = app.oneshot(get("/members")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Error al obtener usuarios"));
}
