use crate::database::store::{Filter, RecordStore, Select};
use crate::error::StoreError;
use crate::models::ActivityMemberRow;

pub const ASSIGNMENTS_TABLE: &str = "actividades_usuarios";

pub async fn insert_assignment(
    store: &dyn RecordStore,
    row: &ActivityMemberRow,
) -> Result<(), StoreError> {
    store
        .insert(ASSIGNMENTS_TABLE, serde_json::to_value(row)?)
        .await?;
    Ok(())
}

pub async fn list_assignments(store: &dyn RecordStore) -> Result<Vec<ActivityMemberRow>, StoreError> {
    let rows = store.select(ASSIGNMENTS_TABLE, &Select::all()).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value::<ActivityMemberRow>(row).map_err(StoreError::from))
        .collect()
}

pub async fn list_assignments_for_activity(
    store: &dyn RecordStore,
    activity_id: &str,
) -> Result<Vec<ActivityMemberRow>, StoreError> {
    let rows = store
        .select(
            ASSIGNMENTS_TABLE,
            &Select::all().filter(Filter::eq("actividad_id", activity_id)),
        )
        .await?;
    rows.into_iter()
        .map(|row| serde_json::from_value::<ActivityMemberRow>(row).map_err(StoreError::from))
        .collect()
}

/// Drops every assignment of one member. Must run before the member row
/// itself is deleted, since assignments reference it.
pub async fn delete_assignments_for_member(
    store: &dyn RecordStore,
    member_id: &str,
) -> Result<u64, StoreError> {
    store
        .delete(ASSIGNMENTS_TABLE, &Filter::eq("usuario_id", member_id))
        .await
}
