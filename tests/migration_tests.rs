mod common;

use caja_core::{
    errors::CajaError,
    ledger::{load_ledger, BusinessState, ValidationState, CURRENT_SCHEMA_VERSION},
    storage::{StateStore, StorageKey},
};
use serde_json::json;

fn legacy_array() -> String {
    json!([
        {
            "id": "0b5d7c1e-2f7a-4d59-8a43-7f3f0c2a9e11",
            "number": "00007",
            "date": "2024-12-20T14:00:00Z",
            "businessUnit": "peluqueria",
            "client": { "name": "Marta" },
            "staffMember": { "name": "Bruno" },
            "lineItems": [
                { "kind": "servicio", "name": "Color", "quantity": 1, "unitPrice": 60.0, "discountPct": 0.0 }
            ],
            "estado": "completo",
            "tipo": "ingreso"
        },
        {
            "id": "0b5d7c1e-2f7a-4d59-8a43-7f3f0c2a9e11",
            "number": "00007",
            "date": "2024-12-20T14:00:00Z",
            "estado": "completo"
        },
        {
            "id": "9c1a2b3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d",
            "number": "00008",
            "date": "2024-12-21T10:00:00Z",
            "estado": "pendiente",
            "tipo": "egreso"
        }
    ])
    .to_string()
}

#[test]
fn bare_legacy_array_is_upgraded_and_deduplicated() {
    let storage = common::memory_storage();
    storage
        .write_raw(StorageKey::Ledger, &legacy_array())
        .unwrap();

    let report = load_ledger(storage.as_ref()).unwrap();
    assert_eq!(report.from_schema, 1);
    assert_eq!(report.migrated, 3);
    assert_eq!(report.duplicates_removed, 1);

    let ledger = report.ledger;
    assert_eq!(ledger.comandas.len(), 2);
    let color = ledger.find_by_number("7").unwrap();
    assert_eq!(color.business_state, BusinessState::Completed);
    assert_eq!(color.validation, ValidationState::Unvalidated);
    assert_eq!(color.final_total, 60.0);
}

#[test]
fn service_rewrites_migrated_ledger_once() {
    let (storage, _base) = common::json_storage();
    storage
        .write_raw(StorageKey::Ledger, &legacy_array())
        .unwrap();

    let svc = common::service(storage.clone(), common::cashier());
    assert_eq!(svc.ledger().comandas.len(), 2);
    let backups = storage.list_backups(StorageKey::Ledger).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].ends_with("_migracion.json"), "{backups:?}");

    let second = load_ledger(storage.as_ref()).unwrap();
    assert_eq!(second.from_schema, CURRENT_SCHEMA_VERSION);
    assert_eq!(second.migrated, 0);
    assert_eq!(second.duplicates_removed, 0);
    assert_eq!(second.ledger.comandas, svc.ledger().comandas);

    let next = common::service(storage.clone(), common::cashier());
    drop(next);
    assert_eq!(storage.list_backups(StorageKey::Ledger).unwrap().len(), 1);
}

#[test]
fn newer_schema_is_refused() {
    let storage = common::memory_storage();
    storage
        .write_raw(
            StorageKey::Ledger,
            &json!({ "schemaVersion": CURRENT_SCHEMA_VERSION + 1, "comandas": [] }).to_string(),
        )
        .unwrap();
    let err = load_ledger(storage.as_ref()).unwrap_err();
    assert!(matches!(err, CajaError::Storage(_)));
}

#[test]
fn numbering_continues_after_legacy_records() {
    let storage = common::memory_storage();
    storage
        .write_raw(StorageKey::Ledger, &legacy_array())
        .unwrap();
    let mut ledger = load_ledger(storage.as_ref()).unwrap().ledger;
    let template = ledger.comandas[0].clone();
    let mut fresh = template;
    fresh.id = uuid::Uuid::new_v4();
    fresh.number.clear();
    let id = ledger.add(fresh).unwrap();
    assert_eq!(ledger.comanda(id).unwrap().number, "00009");
}

#[test]
fn exhausted_numbering_is_refused() {
    let storage = common::memory_storage();
    let legacy = json!([{
        "id": "5d0c7a1e-9b2f-4c3d-8e4f-1a2b3c4d5e6f",
        "number": u64::MAX.to_string(),
        "date": "2024-12-22T09:00:00Z",
        "estado": "pendiente"
    }]);
    storage
        .write_raw(StorageKey::Ledger, &legacy.to_string())
        .unwrap();
    let mut ledger = load_ledger(storage.as_ref()).unwrap().ledger;
    let mut fresh = ledger.comandas[0].clone();
    fresh.id = uuid::Uuid::new_v4();
    fresh.number.clear();

    let err = ledger.add(fresh).unwrap_err();
    assert!(matches!(err, CajaError::InvalidInput(_)));
    assert_eq!(ledger.comandas.len(), 1);
}
