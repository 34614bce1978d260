use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use gym_admin::database::members_repo::MEMBERS_TABLE;
use gym_admin::database::{Filter, MemoryStore, RecordStore, Select};
use gym_admin::models::SearchField;
use gym_admin::services::delete_confirmation::PendingDelete;
use gym_admin::services::member_service::{DeleteOutcome, MemberInput, MSG_CREATED};
use gym_admin::services::MemberRegistry;
use gym_admin::{RegistryError, StoreError};

fn input(name: &str, surname: &str, nip: &str, section: &str, group: &str) -> MemberInput {
    MemberInput {
        name: name.to_string(),
        surname: surname.to_string(),
        nip: nip.to_string(),
        section: section.to_string(),
        workgroup: group.to_string(),
    }
}

fn ana() -> MemberInput {
    input("Ana", "Ruiz", "123456", "GOA", "Grupo 3")
}

fn setup() -> (Arc<MemoryStore>, MemberRegistry) {
    let store = Arc::new(MemoryStore::with_gym_schema());
    let registry = MemberRegistry::new(store.clone());
    (store, registry)
}

fn seeded_row(id: &str, surname: &str, nip: &str) -> serde_json::Value {
    json!({
        "id": id,
        "nombre": "N",
        "apellidos": surname,
        "nip": nip,
        "seccion": "Patrullas",
        "grupo_trabajo": "Grupo 1",
        "fecha_registro": "2026-01-01T00:00:00+00:00"
    })
}

#[tokio::test]
async fn create_then_duplicate_nip_is_rejected_without_a_second_write() {
    let (store, registry) = setup();

    let created = registry.create(&ana()).await.unwrap();
    assert_eq!(created.message, MSG_CREATED);
    assert_eq!(created.record.nip, "123456");
    assert_eq!(created.record.section, "GOA");
    assert_eq!(created.record.workgroup, "Grupo 3");
    assert!(created.record.created_at.is_some());
    assert!(created.record.updated_at.is_none());
    assert_eq!(store.write_count(), 1);

    let err = registry
        .create(&input("Luis", "Gil", "123456", "Motorista", "Grupo 1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Duplicate {
            nip: "123456".to_string()
        }
    );
    assert_eq!(store.write_count(), 1);
    assert_eq!(store.rows(MEMBERS_TABLE).await.len(), 1);
}

#[tokio::test]
async fn invalid_input_never_reaches_the_store() {
    let (store, registry) = setup();

    for bad in [
        input("", "Ruiz", "123456", "GOA", "Grupo 3"),
        input("Ana", "Ruiz", "12345", "GOA", "Grupo 3"),
        input("Ana", "Ruiz", "1234567", "GOA", "Grupo 3"),
        input("Ana", "Ruiz", "12a456", "GOA", "Grupo 3"),
        input("Ana", "Ruiz", "123456", "Caballería", "Grupo 3"),
    ] {
        let err = registry.create(&bad).await.unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)), "{err:?}");
    }
    assert_eq!(store.read_count(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn invalid_update_never_reaches_the_store() {
    let (store, registry) = setup();
    let created = registry.create(&ana()).await.unwrap().record;
    let (reads, writes) = (store.read_count(), store.write_count());

    for bad_nip in ["12345", "1234567", "12a456", "12 456", "١٢٣٤٥٦"] {
        let err = registry
            .update(&created.id, &input("Ana", "Ruiz", bad_nip, "GOA", "Grupo 3"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)), "{bad_nip}: {err:?}");
    }
    let err = registry
        .update(&created.id, &input("Ana", "Ruiz", "123456", "GOA", "Grupo 10"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    assert_eq!(store.read_count(), reads);
    assert_eq!(store.write_count(), writes);
}

/// Hides every row from reads so the registry's own NIP check passes and the
/// store's unique index is what rejects the insert.
struct BlindReads(MemoryStore);

#[async_trait]
impl RecordStore for BlindReads {
    fn backend_tag(&self) -> &'static str {
        "blind"
    }

    async fn select(&self, _table: &str, _query: &Select) -> Result<Vec<Value>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        self.0.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        changes: Value,
        filter: &Filter,
    ) -> Result<Vec<Value>, StoreError> {
        self.0.update(table, changes, filter).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.0.delete(table, filter).await
    }
}

#[tokio::test]
async fn store_level_unique_index_is_reported_as_duplicate() {
    let inner = MemoryStore::with_gym_schema();
    inner.seed(MEMBERS_TABLE, seeded_row("other", "Gil", "123456")).await;
    let registry = MemberRegistry::new(Arc::new(BlindReads(inner)));

    let err = registry.create(&ana()).await.unwrap_err();
    assert_eq!(
        err,
        RegistryError::Duplicate {
            nip: "123456".to_string()
        }
    );
}

#[tokio::test]
async fn list_all_is_ordered_by_surname_for_any_insertion_order() {
    let (_store, registry) = setup();
    for (surname, nip) in [("Zamora", "000003"), ("Abad", "000001"), ("Mora", "000002")] {
        registry
            .create(&input("X", surname, nip, "GOA", "Grupo 1"))
            .await
            .unwrap();
    }

    let surnames: Vec<String> = registry
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.surname)
        .collect();
    assert_eq!(surnames, vec!["Abad", "Mora", "Zamora"]);
}

#[tokio::test]
async fn read_failures_are_distinguishable_from_empty_results() {
    let (store, registry) = setup();
    assert!(registry.list_all().await.unwrap().is_empty());
    assert!(registry
        .search("999999", SearchField::Nip)
        .await
        .unwrap()
        .is_empty());

    store.set_unreachable(true);
    let err = registry.list_all().await.unwrap_err();
    assert!(err.is_connectivity());
    let err = registry.search("999999", SearchField::Nip).await.unwrap_err();
    assert!(matches!(err, RegistryError::Store(StoreError::Unreachable(_))));
}

#[tokio::test]
async fn search_is_exact_on_nip_and_substring_elsewhere() {
    let (_store, registry) = setup();
    registry.create(&ana()).await.unwrap();
    registry
        .create(&input("Motoko", "Kusanagi", "654321", "Patrullas", "Grupo 9"))
        .await
        .unwrap();
    registry
        .create(&input("Luis", "Gil", "123457", "Motorista", "Grupo 1"))
        .await
        .unwrap();

    let by_nip = registry.search("12345", SearchField::Nip).await.unwrap();
    assert!(by_nip.is_empty());
    let by_nip = registry.search("123456", SearchField::Nip).await.unwrap();
    assert_eq!(by_nip.len(), 1);
    assert_eq!(by_nip[0].name, "Ana");

    let by_section = registry.search("mot", SearchField::Section).await.unwrap();
    assert_eq!(by_section.len(), 1);
    assert_eq!(by_section[0].section, "Motorista");

    let by_name = registry.search("MOT", SearchField::Name).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].surname, "Kusanagi");

    // LIKE metacharacters in the term are plain text.
    assert!(registry
        .search("R_iz", SearchField::Surname)
        .await
        .unwrap()
        .is_empty());
    assert!(registry
        .search("%", SearchField::Surname)
        .await
        .unwrap()
        .is_empty());

    let err = registry.search("   ", SearchField::Surname).await.unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));
}

#[tokio::test]
async fn update_refreshes_fields_and_timestamp() {
    let (_store, registry) = setup();
    let created = registry.create(&ana()).await.unwrap().record;

    let updated = registry
        .update(
            &created.id,
            &input("Ana María", "Ruiz Soto", "123456", "Patrullas", "Grupo 7"),
        )
        .await
        .unwrap()
        .record;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Ana María");
    assert_eq!(updated.section, "Patrullas");
    assert_eq!(updated.workgroup, "Grupo 7");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn update_to_a_taken_nip_is_rejected() {
    let (_store, registry) = setup();
    let first = registry.create(&ana()).await.unwrap().record;
    registry
        .create(&input("Luis", "Gil", "222222", "GOA", "Grupo 1"))
        .await
        .unwrap();

    let err = registry
        .update(&first.id, &input("Ana", "Ruiz", "222222", "GOA", "Grupo 3"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Duplicate {
            nip: "222222".to_string()
        }
    );
    assert_eq!(registry.get(&first.id).await.unwrap().nip, "123456");
}

#[tokio::test]
async fn unchanged_nip_skips_the_duplicate_check() {
    // Legacy data: two rows already share a NIP and there is no unique index.
    let store = Arc::new(MemoryStore::new());
    store.seed(MEMBERS_TABLE, seeded_row("a", "Abad", "111111")).await;
    store.seed(MEMBERS_TABLE, seeded_row("b", "Bello", "111111")).await;
    let registry = MemberRegistry::new(store.clone());

    let updated = registry
        .update("a", &input("Nuevo", "Abad", "111111", "GOA", "Grupo 2"))
        .await
        .unwrap();
    assert_eq!(updated.record.name, "Nuevo");
}

#[tokio::test]
async fn update_of_a_missing_record_is_not_found() {
    let (_store, registry) = setup();
    let err = registry.update("ghost", &ana()).await.unwrap_err();
    assert_eq!(
        err,
        RegistryError::NotFound {
            id: "ghost".to_string()
        }
    );
}

#[tokio::test]
async fn delete_needs_two_consecutive_calls_for_the_same_id() {
    let (store, registry) = setup();
    let x = registry.create(&ana()).await.unwrap().record;
    let y = registry
        .create(&input("Luis", "Gil", "222222", "GOA", "Grupo 1"))
        .await
        .unwrap()
        .record;
    let writes_before = store.write_count();
    let t0 = Utc.timestamp_opt(1_760_000_000, 0).unwrap();

    // Arm X.
    let DeleteOutcome::Armed(token_x) = registry.delete(&x.id, None, t0).await.unwrap() else {
        panic!("first call must only arm");
    };
    // Y in between re-arms for Y.
    let DeleteOutcome::Armed(token_y) = registry.delete(&y.id, Some(&token_x), t0).await.unwrap()
    else {
        panic!("other id must re-arm");
    };
    // X again with Y's token: only arms.
    let DeleteOutcome::Armed(token_x2) = registry.delete(&x.id, Some(&token_y), t0).await.unwrap()
    else {
        panic!("stale marker must not delete");
    };
    assert_eq!(store.write_count(), writes_before);
    assert_eq!(registry.list_all().await.unwrap().len(), 2);

    // Second consecutive call for X deletes it.
    let outcome = registry.delete(&x.id, Some(&token_x2), t0).await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted(_)));
    let remaining = registry.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, y.id);
}

#[tokio::test]
async fn expired_token_and_vanished_record() {
    let (_store, registry) = setup();
    let registry = registry.with_delete_ttl(Duration::from_secs(10));
    let x = registry.create(&ana()).await.unwrap().record;
    let t0 = Utc.timestamp_opt(1_760_000_000, 0).unwrap();

    let stale = PendingDelete::arm(&x.id, t0);
    let later = t0 + chrono::Duration::seconds(11);
    assert!(matches!(
        registry.delete(&x.id, Some(&stale), later).await.unwrap(),
        DeleteOutcome::Armed(_)
    ));

    let ghost = PendingDelete::arm("ghost", t0);
    let err = registry.delete("ghost", Some(&ghost), t0).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}
