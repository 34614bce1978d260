use serde_json::Value;

use crate::database::store::{Filter, RecordStore, Select};
use crate::error::StoreError;
use crate::models::{MemberChanges, MemberRow, SearchField};

pub const MEMBERS_TABLE: &str = "usuarios_gimnasio";

fn decode_rows(rows: Vec<Value>) -> Result<Vec<MemberRow>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value::<MemberRow>(row).map_err(StoreError::from))
        .collect()
}

pub async fn insert_member(store: &dyn RecordStore, row: &MemberRow) -> Result<MemberRow, StoreError> {
    let stored = store.insert(MEMBERS_TABLE, serde_json::to_value(row)?).await?;
    Ok(serde_json::from_value(stored)?)
}

pub async fn list_members_by_surname(store: &dyn RecordStore) -> Result<Vec<MemberRow>, StoreError> {
    let rows = store
        .select(MEMBERS_TABLE, &Select::all().order_asc("apellidos"))
        .await?;
    decode_rows(rows)
}

pub async fn find_member_by_id(
    store: &dyn RecordStore,
    id: &str,
) -> Result<Option<MemberRow>, StoreError> {
    let rows = store
        .select(MEMBERS_TABLE, &Select::all().filter(Filter::eq("id", id)).limit(1))
        .await?;
    Ok(decode_rows(rows)?.into_iter().next())
}

pub async fn find_members_by_nip(
    store: &dyn RecordStore,
    nip: &str,
) -> Result<Vec<MemberRow>, StoreError> {
    let rows = store
        .select(MEMBERS_TABLE, &Select::all().filter(Filter::eq("nip", nip)))
        .await?;
    decode_rows(rows)
}

pub async fn search_members(
    store: &dyn RecordStore,
    field: SearchField,
    term: &str,
) -> Result<Vec<MemberRow>, StoreError> {
    let filter = if field.is_exact() {
        Filter::eq(field.column(), term)
    } else {
        Filter::ilike(field.column(), term)
    };
    let rows = store
        .select(MEMBERS_TABLE, &Select::all().filter(filter))
        .await?;
    decode_rows(rows)
}

pub async fn update_member(
    store: &dyn RecordStore,
    id: &str,
    changes: &MemberChanges<'_>,
) -> Result<Option<MemberRow>, StoreError> {
    let rows = store
        .update(
            MEMBERS_TABLE,
            serde_json::to_value(changes)?,
            &Filter::eq("id", id),
        )
        .await?;
    Ok(decode_rows(rows)?.into_iter().next())
}

pub async fn delete_member(store: &dyn RecordStore, id: &str) -> Result<u64, StoreError> {
    store.delete(MEMBERS_TABLE, &Filter::eq("id", id)).await
}

/// Cheapest possible round trip; used to check connectivity.
pub async fn probe(store: &dyn RecordStore) -> Result<(), StoreError> {
    store
        .select(MEMBERS_TABLE, &Select::all().limit(1))
        .await
        .map(|_| ())
}
