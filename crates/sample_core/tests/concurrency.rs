use rust_decimal::Decimal;
use sample_core::{
    Database, SampleError, SampleRequest, SampleService, SqliteSampleRepository, Translation,
};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn request(name: &str) -> SampleRequest {
    SampleRequest {
        name: name.to_string(),
        description: None,
        amount: Decimal::new(1000, 2),
        translations: vec![Translation {
            language: "en".to_string(),
            name: name.to_string(),
            description: None,
            ordinal: 1,
        }],
    }
}

#[test]
fn concurrent_updates_with_same_version_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_file(dir.path().join("race.db"), 4, Duration::from_secs(5)).unwrap();
    let created = SampleService::new(SqliteSampleRepository::new(db.clone()))
        .create(&request("Widget"), "seed")
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|actor| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let service = SampleService::new(SqliteSampleRepository::new(db));
                barrier.wait();
                service.update(created.id, 0, &request(&format!("Widget {actor}")), actor)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(SampleError::VersionConflict {
            attempted_version: 0,
            ..
        })
    )));

    let stored = SampleService::new(SqliteSampleRepository::new(db))
        .get(created.id)
        .unwrap();
    assert_eq!(stored.version, 1);
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reopen.db");
    let id = {
        let db = Database::open_file(&path, 2, Duration::from_secs(1)).unwrap();
        SampleService::new(SqliteSampleRepository::new(db))
            .create(&request("Widget"), "seed")
            .unwrap()
            .id
    };

    let db = Database::open_file(&path, 2, Duration::from_secs(1)).unwrap();
    let loaded = SampleService::new(SqliteSampleRepository::new(db))
        .get(id)
        .unwrap();
    assert_eq!(loaded.name, "Widget");
    assert_eq!(loaded.translations.len(), 1);
}
