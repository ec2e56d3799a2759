mod common;

use caja_core::{
    currency::Currency,
    directory::{CatalogItem, Client, Directory, PageRequest, StaffMember},
    ledger::ItemKind,
};

fn clients_named(names: &[&str]) -> Directory<Client> {
    let mut clients = Directory::<Client>::load(common::memory_storage()).unwrap();
    for name in names {
        clients
            .insert(Client::new(*name, common::fixed_clock().0))
            .unwrap();
    }
    clients
}

#[test]
fn listing_is_sorted_and_paginated() {
    let names = [
        "Zoe", "Ábril", "Carla", "beatriz", "Dora", "Elena", "Fede", "Gala",
    ];
    let clients = clients_named(&names);
    let first = clients.list(PageRequest::new(1, 3), false);
    assert_eq!(first.total, 8);
    assert_eq!(first.total_pages, 3);
    let listed: Vec<_> = first.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(listed, vec!["Ábril", "beatriz", "Carla"]);

    let last = clients.list(PageRequest::new(3, 3), false);
    assert_eq!(last.items.len(), 2);
    assert_eq!(last.items[1].name, "Zoe");
    assert!(clients.list(PageRequest::new(9, 3), false).items.is_empty());
}

#[test]
fn contact_validation_blocks_insert() {
    let mut clients = clients_named(&[]);
    let bad = Client::new("Lola", common::fixed_clock().0).with_contact("", "lola-at-mail");
    assert_eq!(clients.insert(bad).unwrap_err().to_string(), "Email inválido");
    assert!(clients.is_empty());

    let good = Client::new("Lola", common::fixed_clock().0)
        .with_contact("11 5555 0101", "lola@example.com");
    clients.insert(good).unwrap();
    assert_eq!(clients.search("lola").len(), 1);
}

#[test]
fn find_by_name_prefers_active_entries() {
    let mut staff = Directory::<StaffMember>::load(common::memory_storage()).unwrap();
    let old = staff.insert(StaffMember::new("Julián", "Corte")).unwrap();
    staff.soft_delete(old).unwrap();
    assert_eq!(staff.find_by_name("julian").unwrap().id, old);

    let new = staff.insert(StaffMember::new("Julian", "Color")).unwrap();
    assert_eq!(staff.find_by_name("JULIÁN").unwrap().id, new);
    assert!(staff.search("juli").iter().all(|m| m.active));
    assert!(staff.find_by_name("Pedro").is_none());
}

#[test]
fn deposits_persist_with_the_client() {
    let (storage, _base) = common::json_storage();
    let id = {
        let mut clients = Directory::<Client>::load(storage.clone()).unwrap();
        let id = clients
            .insert(Client::new("Marta", common::fixed_clock().0))
            .unwrap();
        let balance = clients
            .try_update(id, |c| c.add_deposit(Currency::Ars, 15_000.0))
            .unwrap();
        assert_eq!(balance, 15_000.0);
        assert!(clients
            .try_update(id, |c| c.add_deposit(Currency::Ars, -1.0))
            .is_err());
        id
    };
    let clients = Directory::<Client>::load(storage).unwrap();
    let marta = clients.get(id).unwrap();
    assert_eq!(marta.deposits.get(Currency::Ars), 15_000.0);
    assert_eq!(marta.deposits.get(Currency::Usd), 0.0);
}

#[test]
fn catalog_items_become_line_items() {
    let mut catalog = Directory::<CatalogItem>::load(common::memory_storage()).unwrap();
    let id = catalog
        .insert(CatalogItem::new("Keratina", ItemKind::Service, "tratamientos", 120.0))
        .unwrap();
    assert!(catalog
        .insert(CatalogItem::new("Gratis", ItemKind::Product, "reventa", -1.0))
        .is_err());

    let item = catalog.get(id).unwrap().to_line_item(2, 10.0);
    assert_eq!(item.item_id, Some(id));
    assert_eq!(item.subtotal, 216.0);

    assert!(!catalog.toggle_active(id).unwrap());
    assert!(catalog.search("kera").is_empty());
    assert_eq!(catalog.list(PageRequest::default(), true).total, 1);
}
