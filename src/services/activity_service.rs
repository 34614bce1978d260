use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{activities_repo, activity_members_repo, members_repo, RecordStore};
use crate::error::RegistryError;
use crate::models::{ActivityMemberRow, ActivityRow};

pub const MSG_ACTIVITY_CREATED: &str = "Actividad creada correctamente";
pub const MSG_ACTIVITY_MISSING_FIELDS: &str =
    "Por favor indique título, fecha, hora de inicio y hora de fin";
pub const MSG_ACTIVITY_TIME_ORDER: &str = "La hora de inicio debe ser anterior a la hora de fin";

const STORE_DATE: &str = "%Y-%m-%d";
const STORE_TIME: &str = "%H:%M:%S";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityInput {
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "fecha", default)]
    pub date: String,
    #[serde(rename = "hora_inicio", default)]
    pub start_time: String,
    #[serde(rename = "hora_fin", default)]
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidActivity {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, STORE_TIME))
        .ok()
}

pub fn validate_activity(input: &ActivityInput) -> Result<ValidActivity, RegistryError> {
    let title = input.title.trim();
    let required = [title, input.date.trim(), input.start_time.trim(), input.end_time.trim()];
    if required.iter().any(|f| f.is_empty()) {
        return Err(RegistryError::validation(MSG_ACTIVITY_MISSING_FIELDS));
    }

    let date = NaiveDate::parse_from_str(input.date.trim(), STORE_DATE).map_err(|_| {
        RegistryError::validation(format!("Fecha no válida: {}", input.date.trim()))
    })?;
    let start_time = parse_time(&input.start_time).ok_or_else(|| {
        RegistryError::validation(format!("Hora de inicio no válida: {}", input.start_time.trim()))
    })?;
    let end_time = parse_time(&input.end_time).ok_or_else(|| {
        RegistryError::validation(format!("Hora de fin no válida: {}", input.end_time.trim()))
    })?;
    if start_time >= end_time {
        return Err(RegistryError::validation(MSG_ACTIVITY_TIME_ORDER));
    }

    let description = Some(input.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(ValidActivity {
        title: title.to_string(),
        description,
        date,
        start_time,
        end_time,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAssignment {
    pub member_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    pub assigned: Vec<String>,
    pub failed: Vec<FailedAssignment>,
}

impl AssignmentReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.member_id.as_str()).collect()
    }

    /// Secondary note shown next to the creation message, if anything failed.
    pub fn warning(&self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        Some(format!(
            "La actividad se creó, pero no se pudieron asignar {} usuario(s): {}",
            self.failed.len(),
            self.failed_ids().join(", ")
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledActivity {
    pub activity: ActivityRow,
    pub report: AssignmentReport,
    pub message: String,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivitySummary {
    pub activity: ActivityRow,
    pub assigned_count: usize,
}

/// Trimmed, non-blank ids in first-seen order, each once.
fn distinct_ids(member_ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    member_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .collect()
}

#[derive(Clone)]
pub struct ActivityScheduler {
    store: Arc<dyn RecordStore>,
}

impl ActivityScheduler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub async fn create_activity(&self, input: &ActivityInput) -> Result<ActivityRow, RegistryError> {
        let valid = validate_activity(input)?;
        let row = ActivityRow {
            id: Uuid::new_v4().to_string(),
            title: valid.title,
            description: valid.description,
            date: valid.date.format(STORE_DATE).to_string(),
            start_time: valid.start_time.format(STORE_TIME).to_string(),
            end_time: valid.end_time.format(STORE_TIME).to_string(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        let stored = activities_repo::insert_activity(self.store(), &row).await?;
        info!(activity_id = %stored.id, date = %stored.date, "activity_created");
        Ok(stored)
    }

    /// Assigns each member independently. Failures are collected, never
    /// rolled back; only a missing activity aborts the whole call.
    pub async fn assign_members(
        &self,
        activity_id: &str,
        member_ids: &[String],
    ) -> Result<AssignmentReport, RegistryError> {
        if activities_repo::find_activity_by_id(self.store(), activity_id)
            .await?
            .is_none()
        {
            return Err(RegistryError::NotFound {
                id: activity_id.to_string(),
            });
        }

        let mut report = AssignmentReport::default();
        for member_id in distinct_ids(member_ids) {
            match self.assign_one(activity_id, member_id).await {
                Ok(()) => report.assigned.push(member_id.to_string()),
                Err(reason) => {
                    warn!(%activity_id, %member_id, %reason, "assignment_failed");
                    report.failed.push(FailedAssignment {
                        member_id: member_id.to_string(),
                        reason,
                    });
                }
            }
        }
        Ok(report)
    }

    async fn assign_one(&self, activity_id: &str, member_id: &str) -> Result<(), String> {
        match members_repo::find_member_by_id(self.store(), member_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err("el usuario no existe".to_string()),
            Err(e) => return Err(e.to_string()),
        }
        let row = ActivityMemberRow {
            activity_id: activity_id.to_string(),
            member_id: member_id.to_string(),
            assigned_at: Some(Utc::now().to_rfc3339()),
        };
        activity_members_repo::insert_assignment(self.store(), &row)
            .await
            .map_err(|e| e.to_string())
    }

    /// Creates the activity, then assigns members. Assignment trouble never
    /// undoes the creation; it shows up as `warning`.
    pub async fn schedule(
        &self,
        input: &ActivityInput,
        member_ids: &[String],
    ) -> Result<ScheduledActivity, RegistryError> {
        let activity = self.create_activity(input).await?;

        let report = match self.assign_members(&activity.id, member_ids).await {
            Ok(report) => report,
            Err(e) => AssignmentReport {
                assigned: Vec::new(),
                failed: distinct_ids(member_ids)
                    .into_iter()
                    .map(|id| FailedAssignment {
                        member_id: id.to_string(),
                        reason: e.to_string(),
                    })
                    .collect(),
            },
        };

        let warning = report.warning();
        Ok(ScheduledActivity {
            activity,
            report,
            message: MSG_ACTIVITY_CREATED.to_string(),
            warning,
        })
    }

    pub async fn list_activities(&self) -> Result<Vec<ActivitySummary>, RegistryError> {
        let activities = activities_repo::list_activities_by_schedule(self.store()).await?;
        let assignments = activity_members_repo::list_assignments(self.store()).await?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for a in &assignments {
            *counts.entry(a.activity_id.as_str()).or_default() += 1;
        }

        Ok(activities
            .into_iter()
            .map(|activity| {
                let assigned_count = counts.get(activity.id.as_str()).copied().unwrap_or(0);
                ActivitySummary {
                    activity,
                    assigned_count,
                }
            })
            .collect())
    }

    pub async fn assigned_member_ids(&self, activity_id: &str) -> Result<Vec<String>, RegistryError> {
        let rows =
            activity_members_repo::list_assignments_for_activity(self.store(), activity_id).await?;
        Ok(rows.into_iter().map(|r| r.member_id).collect())
    }
}
