use crate::database::store::{Filter, RecordStore, Select};
use crate::error::StoreError;
use crate::models::ActivityRow;

pub const ACTIVITIES_TABLE: &str = "actividades_gimnasio";

pub async fn insert_activity(
    store: &dyn RecordStore,
    row: &ActivityRow,
) -> Result<ActivityRow, StoreError> {
    let stored = store
        .insert(ACTIVITIES_TABLE, serde_json::to_value(row)?)
        .await?;
    Ok(serde_json::from_value(stored)?)
}

pub async fn find_activity_by_id(
    store: &dyn RecordStore,
    id: &str,
) -> Result<Option<ActivityRow>, StoreError> {
    let rows = store
        .select(
            ACTIVITIES_TABLE,
            &Select::all().filter(Filter::eq("id", id)).limit(1),
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn list_activities_by_schedule(
    store: &dyn RecordStore,
) -> Result<Vec<ActivityRow>, StoreError> {
    let rows = store
        .select(
            ACTIVITIES_TABLE,
            &Select::all().order_asc("fecha").order_asc("hora_inicio"),
        )
        .await?;
    rows.into_iter()
        .map(|row| serde_json::from_value::<ActivityRow>(row).map_err(StoreError::from))
        .collect()
}
