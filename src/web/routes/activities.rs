use std::collections::HashSet;

use askama::Template;
use axum::{extract::State, response::Response, Form};
use tracing::warn;

use crate::services::activity_service::ActivityInput;
use crate::web::routes::members::flash_for_error;
use crate::web::views::{ActivityCardView, ActivityFormView, Flash, MemberChoiceView};
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "activities.html")]
pub struct ActivitiesTemplate {
    pub activities: Vec<ActivityCardView>,
    pub flashes: Vec<Flash>,
}

pub async fn activities_handler(State(state): State<AppState>) -> Response {
    let (activities, flashes) = match state.scheduler.list_activities().await {
        Ok(list) => {
            let cards: Vec<ActivityCardView> =
                list.iter().map(ActivityCardView::from_summary).collect();
            let flashes = if cards.is_empty() {
                vec![Flash::info("No hay actividades programadas")]
            } else {
                vec![]
            };
            (cards, flashes)
        }
        Err(e) => {
            warn!("Activity list failed: {}", e);
            (vec![], vec![Flash::error(format!("Error al obtener actividades: {}", e))])
        }
    };

    render(&ActivitiesTemplate {
        activities,
        flashes,
    })
}

#[derive(Template)]
#[template(path = "activity_new.html")]
pub struct NewActivityTemplate {
    pub form: ActivityFormView,
    pub members: Vec<MemberChoiceView>,
    pub flashes: Vec<Flash>,
}

async fn member_choices(
    state: &AppState,
    checked: &HashSet<String>,
    flashes: &mut Vec<Flash>,
) -> Vec<MemberChoiceView> {
    match state.registry.list_all().await {
        Ok(rows) => rows
            .iter()
            .map(|m| MemberChoiceView {
                id: m.id.clone(),
                label: m.display_label(),
                checked: checked.contains(&m.id),
            })
            .collect(),
        Err(e) => {
            flashes.push(Flash::warning(format!(
                "No se pudieron cargar los usuarios: {}",
                e
            )));
            vec![]
        }
    }
}

pub async fn new_activity_handler(State(state): State<AppState>) -> Response {
    let mut flashes = Vec::new();
    let members = member_choices(&state, &HashSet::new(), &mut flashes).await;
    render(&NewActivityTemplate {
        form: ActivityFormView::default(),
        members,
        flashes,
    })
}

/// The form repeats `miembros` once per checked member, so it is read as raw
/// pairs rather than a struct.
fn parse_activity_form(pairs: Vec<(String, String)>) -> (ActivityInput, Vec<String>) {
    let mut input = ActivityInput::default();
    let mut member_ids = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "titulo" => input.title = value,
            "descripcion" => input.description = value,
            "fecha" => input.date = value,
            "hora_inicio" => input.start_time = value,
            "hora_fin" => input.end_time = value,
            "miembros" => member_ids.push(value),
            _ => {}
        }
    }
    (input, member_ids)
}

pub async fn create_activity_handler(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let (input, member_ids) = parse_activity_form(pairs);

    match state.scheduler.schedule(&input, &member_ids).await {
        Ok(scheduled) => {
            let mut flashes = vec![Flash::success(scheduled.message)];
            if let Some(note) = scheduled.warning {
                flashes.push(Flash::warning(note));
            }
            let members = member_choices(&state, &HashSet::new(), &mut flashes).await;
            render(&NewActivityTemplate {
                form: ActivityFormView::default(),
                members,
                flashes,
            })
        }
        Err(e) => {
            let mut flashes = vec![flash_for_error(&e)];
            let checked: HashSet<String> = member_ids.into_iter().collect();
            let members = member_choices(&state, &checked, &mut flashes).await;
            render(&NewActivityTemplate {
                form: ActivityFormView::from_input(&input),
                members,
                flashes,
            })
        }
    }
}
