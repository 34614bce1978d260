use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::models::SearchField;
use crate::web::routes::members::flash_for_error;
use crate::web::views::{search_field_options, Flash, MemberRowView, OptionView};
use crate::web::{render, AppState};

#[derive(Template)]
#[template(path = "member_search.html")]
pub struct SearchTemplate {
    pub term: String,
    pub fields: Vec<OptionView>,
    pub results: Option<Vec<MemberRowView>>,
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchQuery {
    pub term: Option<String>,
    pub field: Option<String>,
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let field = query
        .field
        .as_deref()
        .and_then(SearchField::parse)
        .unwrap_or(SearchField::Nip);
    let fields = search_field_options(field);

    // First visit: just the form.
    let Some(term) = query.term else {
        return render(&SearchTemplate {
            term: String::new(),
            fields,
            results: None,
            flashes: vec![],
        });
    };

    let (results, flashes) = match state.registry.search(&term, field).await {
        Ok(rows) if rows.is_empty() => (
            Some(vec![]),
            vec![Flash::info("No se encontraron resultados")],
        ),
        Ok(rows) => {
            let flash = Flash::success(format!("Se encontraron {} resultados", rows.len()));
            (
                Some(rows.iter().map(MemberRowView::from_row).collect()),
                vec![flash],
            )
        }
        Err(e) => (None, vec![flash_for_error(&e)]),
    };

    render(&SearchTemplate {
        term,
        fields,
        results,
        flashes,
    })
}
