use crate::models::{ActivityRow, MemberRow, SearchField, Section, WorkGroup};
use crate::services::activity_service::{ActivityInput, ActivitySummary};
use crate::services::member_service::MemberInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: &'static str, // success|info|warning|error
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: "success", message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: "info", message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: "warning", message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: "error", message: message.into() }
    }
}

#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn section_options(current: &str) -> Vec<OptionView> {
    Section::ALL
        .into_iter()
        .map(|s| OptionView {
            value: s.as_str().to_string(),
            label: s.as_str().to_string(),
            selected: s.as_str() == current,
        })
        .collect()
}

pub fn workgroup_options(current: &str) -> Vec<OptionView> {
    WorkGroup::all()
        .map(|g| {
            let label = g.label();
            OptionView {
                selected: label == current,
                value: label.clone(),
                label,
            }
        })
        .collect()
}

pub fn search_field_options(current: SearchField) -> Vec<OptionView> {
    SearchField::ALL
        .into_iter()
        .map(|f| OptionView {
            value: f.column().to_string(),
            label: f.label().to_string(),
            selected: f == current,
        })
        .collect()
}

/// Values shown in a member form. Stored values outside the known option
/// sets fall back to the first option, like a fresh form.
#[derive(Debug, Clone)]
pub struct MemberFormView {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub nip: String,
    pub sections: Vec<OptionView>,
    pub workgroups: Vec<OptionView>,
}

impl MemberFormView {
    pub fn empty() -> Self {
        Self::from_input("", &MemberInput::default())
    }

    pub fn from_input(id: &str, input: &MemberInput) -> Self {
        Self {
            id: id.to_string(),
            name: input.name.clone(),
            surname: input.surname.clone(),
            nip: input.nip.clone(),
            sections: section_options(input.section.trim()),
            workgroups: workgroup_options(input.workgroup.trim()),
        }
    }

    pub fn from_row(row: &MemberRow) -> Self {
        Self::from_input(
            &row.id,
            &MemberInput {
                name: row.name.clone(),
                surname: row.surname.clone(),
                nip: row.nip.clone(),
                section: row.section.clone(),
                workgroup: row.workgroup.clone(),
            },
        )
    }
}

#[derive(Debug, Clone)]
pub struct MemberRowView {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub nip: String,
    pub section: String,
    pub workgroup: String,
    pub created_label: String,
    pub updated_label: String,
}

impl MemberRowView {
    pub fn from_row(row: &MemberRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.name.clone(),
            surname: row.surname.clone(),
            nip: row.nip.clone(),
            section: row.section.clone(),
            workgroup: row.workgroup.clone(),
            created_label: row.created_at.as_deref().map(timestamp_label).unwrap_or_default(),
            updated_label: row.updated_at.as_deref().map(timestamp_label).unwrap_or_default(),
        }
    }
}

/// "2026-10-19T08:06:12.920925+00:00" -> "2026-10-19 08:06"
pub fn timestamp_label(raw: &str) -> String {
    let raw = raw.trim();
    let mut s = raw.to_string();
    if let Some(t_pos) = s.find('T') {
        s.replace_range(t_pos..=t_pos, " ");
    }
    s.chars().take(16).collect()
}

/// "09:00:00" -> "09:00"
pub fn time_label(raw: &str) -> String {
    raw.trim().chars().take(5).collect()
}

#[derive(Debug, Clone)]
pub struct MemberChoiceView {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFormView {
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl ActivityFormView {
    pub fn from_input(input: &ActivityInput) -> Self {
        Self {
            title: input.title.clone(),
            description: input.description.clone(),
            date: input.date.clone(),
            start_time: input.start_time.clone(),
            end_time: input.end_time.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityCardView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_label: String,
    pub end_label: String,
    pub assigned_count: usize,
}

impl ActivityCardView {
    pub fn from_row(row: &ActivityRow, assigned_count: usize) -> Self {
        Self {
            id: row.id.clone(),
            title: row.title.clone(),
            description: row.description.clone().unwrap_or_default(),
            date: row.date.clone(),
            start_label: time_label(&row.start_time),
            end_label: time_label(&row.end_time),
            assigned_count,
        }
    }

    pub fn from_summary(summary: &ActivitySummary) -> Self {
        Self::from_row(&summary.activity, summary.assigned_count)
    }
}
