use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::error::RegistryError;
use crate::models::MemberRow;
use crate::services::member_service::{DeleteOutcome, MemberInput, MSG_DELETED, MSG_UPDATED};
use crate::web::cookies;
use crate::web::views::{Flash, MemberFormView, MemberRowView, OptionView};
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "member_new.html")]
pub struct NewMemberTemplate {
    pub form: MemberFormView,
    pub flashes: Vec<Flash>,
}

pub async fn new_member_handler() -> Response {
    render(&NewMemberTemplate {
        form: MemberFormView::empty(),
        flashes: vec![],
    })
}

pub async fn create_handler(
    State(state): State<AppState>,
    Form(input): Form<MemberInput>,
) -> Response {
    match state.registry.create(&input).await {
        Ok(done) => render(&NewMemberTemplate {
            form: MemberFormView::empty(),
            flashes: vec![Flash::success(done.message)],
        }),
        Err(e) => {
            // Keep what was typed so the operator can fix it.
            render(&NewMemberTemplate {
                form: MemberFormView::from_input("", &input),
                flashes: vec![flash_for_error(&e)],
            })
        }
    }
}

#[derive(Template)]
#[template(path = "members.html")]
pub struct MembersTemplate {
    pub members: Vec<MemberRowView>,
    pub choices: Vec<OptionView>,
    pub selected: Option<MemberFormView>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ManageQuery {
    pub selected: Option<String>,
    pub notice: Option<String>,
}

fn notice_flash(notice: Option<&str>) -> Option<Flash> {
    match notice? {
        "updated" => Some(Flash::success(MSG_UPDATED)),
        "deleted" => Some(Flash::success(MSG_DELETED)),
        _ => None,
    }
}

pub fn flash_for_error(e: &RegistryError) -> Flash {
    match e {
        RegistryError::Validation(_) => Flash::warning(e.to_string()),
        _ => Flash::error(e.to_string()),
    }
}

/// Where to land after a successful edit: the same member stays selected.
fn manage_url(member_id: &str, notice: &str) -> String {
    match serde_urlencoded::to_string([("selected", member_id), ("notice", notice)]) {
        Ok(query) => format!("/members?{}", query),
        Err(e) => {
            warn!("Could not encode redirect for {}: {}", member_id, e);
            format!("/members?notice={}", notice)
        }
    }
}

/// Builds the list/edit page. `typed` replaces the selected member's stored
/// values after a rejected edit.
async fn manage_page(
    state: &AppState,
    selected_id: Option<&str>,
    typed: Option<&MemberInput>,
    mut flashes: Vec<Flash>,
) -> MembersTemplate {
    let members: Vec<MemberRow> = match state.registry.list_all().await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error al obtener usuarios: {}", e)));
            vec![]
        }
    };

    if members.is_empty() && flashes.iter().all(|f| f.kind != "error") {
        flashes.push(Flash::info("No hay usuarios registrados aún"));
    }

    let selected_row = selected_id
        .and_then(|id| members.iter().find(|m| m.id == id))
        .or_else(|| members.first());

    let choices = members
        .iter()
        .map(|m| OptionView {
            value: m.id.clone(),
            label: m.display_label(),
            selected: selected_row.map(|s| s.id == m.id).unwrap_or(false),
        })
        .collect();

    let selected = selected_row.map(|row| match typed {
        Some(input) if selected_id == Some(row.id.as_str()) => {
            MemberFormView::from_input(&row.id, input)
        }
        _ => MemberFormView::from_row(row),
    });

    MembersTemplate {
        members: members.iter().map(MemberRowView::from_row).collect(),
        choices,
        selected,
        flashes,
    }
}

pub async fn manage_handler(
    State(state): State<AppState>,
    Query(query): Query<ManageQuery>,
) -> Response {
    let flashes = notice_flash(query.notice.as_deref()).into_iter().collect();
    let page = manage_page(&state, query.selected.as_deref(), None, flashes).await;
    render(&page)
}

pub async fn update_handler(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Form(input): Form<MemberInput>,
) -> Response {
    match state.registry.update(&member_id, &input).await {
        Ok(_) => Redirect::to(&manage_url(&member_id, "updated")).into_response(),
        Err(e) => {
            warn!("Member update failed for {}: {}", member_id, e);
            let page = manage_page(&state, Some(&member_id), Some(&input), vec![flash_for_error(&e)])
                .await;
            render(&page)
        }
    }
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let pending = cookies::read_pending_delete(&headers);

    match state
        .registry
        .delete(&member_id, pending.as_ref(), Utc::now())
        .await
    {
        Ok(DeleteOutcome::Armed(token)) => {
            let name = match state.registry.get(&member_id).await {
                Ok(row) => row.full_name(),
                Err(_) => member_id.clone(),
            };
            let warning = Flash::warning(format!(
                "¿Está seguro de eliminar a {}? Presione nuevamente para confirmar.",
                name
            ));
            let page = manage_page(&state, Some(&member_id), None, vec![warning]).await;
            cookies::with_cookie(render(&page), &cookies::arm_cookie(&token))
        }
        Ok(DeleteOutcome::Deleted(_)) => cookies::with_cookie(
            Redirect::to("/members?notice=deleted").into_response(),
            &cookies::clear_cookie(),
        ),
        Err(e) => {
            warn!("Member delete failed for {}: {}", member_id, e);
            let page = manage_page(&state, Some(&member_id), None, vec![flash_for_error(&e)]).await;
            cookies::with_cookie(render(&page), &cookies::clear_cookie())
        }
    }
}
