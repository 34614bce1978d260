use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{activity_members_repo, members_repo, RecordStore};
use crate::error::{RegistryError, StoreError};
use crate::models::{MemberChanges, MemberRow, Nip, SearchField, Section, WorkGroup};
use crate::services::delete_confirmation::{self, Decision, PendingDelete};
use crate::services::Confirmation;

pub const DEFAULT_DELETE_TTL: Duration = Duration::from_secs(120);

pub const MSG_CREATED: &str = "Usuario registrado con éxito";
pub const MSG_UPDATED: &str = "Usuario actualizado correctamente";
pub const MSG_DELETED: &str = "Usuario eliminado correctamente";
pub const MSG_MISSING_FIELDS: &str = "Por favor complete todos los campos";
pub const MSG_MISSING_TERM: &str = "Ingrese un término de búsqueda";

/// Raw member fields as typed into a form. Field names match the store columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberInput {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "apellidos", default)]
    pub surname: String,
    #[serde(default)]
    pub nip: String,
    #[serde(rename = "seccion", default)]
    pub section: String,
    #[serde(rename = "grupo_trabajo", default)]
    pub workgroup: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMember {
    pub name: String,
    pub surname: String,
    pub nip: Nip,
    pub section: Section,
    pub workgroup: WorkGroup,
}

pub fn validate_member(input: &MemberInput) -> Result<ValidMember, RegistryError> {
    let fields = [
        &input.name,
        &input.surname,
        &input.nip,
        &input.section,
        &input.workgroup,
    ];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(RegistryError::validation(MSG_MISSING_FIELDS));
    }

    Ok(ValidMember {
        name: input.name.trim().to_string(),
        surname: input.surname.trim().to_string(),
        nip: Nip::parse(&input.nip)?,
        section: Section::parse(&input.section)?,
        workgroup: WorkGroup::parse(&input.workgroup)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Armed(PendingDelete),
    Deleted(Confirmation<String>),
}

#[derive(Clone)]
pub struct MemberRegistry {
    store: Arc<dyn RecordStore>,
    delete_ttl: Duration,
}

impl MemberRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            delete_ttl: DEFAULT_DELETE_TTL,
        }
    }

    pub fn with_delete_ttl(mut self, ttl: Duration) -> Self {
        self.delete_ttl = ttl;
        self
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub async fn create(
        &self,
        input: &MemberInput,
    ) -> Result<Confirmation<MemberRow>, RegistryError> {
        let valid = validate_member(input)?;
        self.ensure_nip_free(&valid.nip).await?;

        let row = MemberRow {
            id: Uuid::new_v4().to_string(),
            name: valid.name,
            surname: valid.surname,
            nip: valid.nip.as_str().to_string(),
            section: valid.section.as_str().to_string(),
            workgroup: valid.workgroup.label(),
            created_at: Some(Utc::now().to_rfc3339()),
            updated_at: None,
        };

        let stored = members_repo::insert_member(self.store(), &row)
            .await
            .map_err(|e| duplicate_or_store(e, &valid.nip))?;
        info!(member_id = %stored.id, nip = %stored.nip, "member_created");
        Ok(Confirmation::new(stored, MSG_CREATED))
    }

    pub async fn list_all(&self) -> Result<Vec<MemberRow>, RegistryError> {
        members_repo::list_members_by_surname(self.store())
            .await
            .map_err(|e| {
                warn!(error = %e, "member_list_failed");
                RegistryError::from(e)
            })
    }

    pub async fn get(&self, id: &str) -> Result<MemberRow, RegistryError> {
        members_repo::find_member_by_id(self.store(), id)
            .await?
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
    }

    pub async fn search(
        &self,
        term: &str,
        field: SearchField,
    ) -> Result<Vec<MemberRow>, RegistryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(RegistryError::validation(MSG_MISSING_TERM));
        }
        members_repo::search_members(self.store(), field, term)
            .await
            .map_err(|e| {
                warn!(error = %e, field = field.column(), "member_search_failed");
                RegistryError::from(e)
            })
    }

    pub async fn update(
        &self,
        id: &str,
        input: &MemberInput,
    ) -> Result<Confirmation<MemberRow>, RegistryError> {
        let valid = validate_member(input)?;
        let current = self.get(id).await?;

        // Only a changed NIP is re-checked; existing collisions are left alone.
        if current.nip != valid.nip.as_str() {
            self.ensure_nip_free(&valid.nip).await?;
        }

        let now = Utc::now().to_rfc3339();
        let section = valid.section.as_str();
        let workgroup = valid.workgroup.label();
        let changes = MemberChanges {
            name: &valid.name,
            surname: &valid.surname,
            nip: valid.nip.as_str(),
            section,
            workgroup: &workgroup,
            updated_at: &now,
        };

        let updated = members_repo::update_member(self.store(), id, &changes)
            .await
            .map_err(|e| duplicate_or_store(e, &valid.nip))?
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        info!(member_id = %updated.id, "member_updated");
        Ok(Confirmation::new(updated, MSG_UPDATED))
    }

    /// Two-step delete. Without a live `pending` token for this same id the
    /// call only arms a new token and touches nothing.
    pub async fn delete(
        &self,
        id: &str,
        pending: Option<&PendingDelete>,
        now: DateTime<Utc>,
    ) -> Result<DeleteOutcome, RegistryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RegistryError::validation("Seleccione un usuario"));
        }

        match delete_confirmation::decide(pending, id, now, self.delete_ttl) {
            Decision::Arm(token) => {
                info!(member_id = %id, "member_delete_armed");
                Ok(DeleteOutcome::Armed(token))
            }
            Decision::Confirm => {
                // Assignments reference the member; they go first.
                let unassigned =
                    activity_members_repo::delete_assignments_for_member(self.store(), id).await?;
                let removed = members_repo::delete_member(self.store(), id).await?;
                if removed == 0 {
                    return Err(RegistryError::NotFound { id: id.to_string() });
                }
                info!(member_id = %id, unassigned, "member_deleted");
                Ok(DeleteOutcome::Deleted(Confirmation::new(
                    id.to_string(),
                    MSG_DELETED,
                )))
            }
        }
    }

    async fn ensure_nip_free(&self, nip: &Nip) -> Result<(), RegistryError> {
        let existing = members_repo::find_members_by_nip(self.store(), nip.as_str()).await?;
        if !existing.is_empty() {
            warn!(%nip, "duplicate_nip_rejected");
            return Err(RegistryError::Duplicate {
                nip: nip.as_str().to_string(),
            });
        }
        Ok(())
    }
}

// A unique index on `nip` catches what the read-before-write check races past.
fn duplicate_or_store(err: StoreError, nip: &Nip) -> RegistryError {
    match err {
        StoreError::UniqueViolation(_) => RegistryError::Duplicate {
            nip: nip.as_str().to_string(),
        },
        other => RegistryError::Store(other),
    }
}
