use chrono::NaiveDate;
use finance_tracker::core::{Database, Party};
use finance_tracker::storage::{JsonFileStore, MemoryStore, Store, StoreError};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[test]
fn saves_and_loads_database() {
    let path = std::env::temp_dir()
        .join(format!("finance_{}", Uuid::new_v4()))
        .join("database.json");
    let party = Party {
        id: Uuid::new_v4(),
        name: "Acme Supplies".into(),
        contact: Some("0300-1234567".into()),
        opening_balance: dec!(1000.50),
        notes: String::new(),
    };
    {
        let mut store = JsonFileStore::<Database>::new(&path);
        let mut db = Database::default();
        db.parties.push(party.clone());
        store.save(&db).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.path().exists());
    }
    let store = JsonFileStore::<Database>::new(&path);
    let db = store.load().unwrap();
    assert_eq!(db.parties, vec![party]);
    assert!(db.expenses.is_empty());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn loading_missing_file_is_empty() {
    let path = std::env::temp_dir().join(format!("missing_{}.json", Uuid::new_v4()));
    let store = JsonFileStore::<Database>::new(&path);
    assert_eq!(store.load().unwrap(), Database::default());
}

#[test]
fn missing_collections_default_to_empty() {
    let path = std::env::temp_dir().join(format!("partial_{}.json", Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"{"expenses":[{"id":"6f1c2a1e-8a0e-4c55-9d43-3f7f3c1b2a10","date":"2024-05-02","category":"food","amount":12.5}]}"#,
    )
    .unwrap();
    let db = JsonFileStore::<Database>::new(&path).load().unwrap();
    assert_eq!(db.expenses.len(), 1);
    assert_eq!(
        db.expenses[0].date,
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    );
    assert!(db.ledger_entries.is_empty());
    let _ = std::fs::remove_file(path);
}

#[test]
fn corrupt_file_is_reported() {
    let path = std::env::temp_dir().join(format!("corrupt_{}.json", Uuid::new_v4()));
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::<Database>::new(&path);
    assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    let _ = std::fs::remove_file(path);
}

#[test]
fn memory_store_counts_saves() {
    let mut store = MemoryStore::new(Vec::<u32>::new());
    assert_eq!(store.saves(), 0);
    store.save(&vec![1]).unwrap();
    store.save(&vec![1, 2]).unwrap();
    assert_eq!(store.saves(), 2);
    assert_eq!(store.load().unwrap(), vec![1, 2]);
}
