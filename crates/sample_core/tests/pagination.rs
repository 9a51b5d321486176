use rust_decimal::Decimal;
use sample_core::{
    Database, PageRequest, SampleRequest, SampleService, SeekRequest, SqliteSampleRepository,
    Translation,
};

fn seeded(names: &[&str]) -> (SampleService<SqliteSampleRepository>, Vec<i64>) {
    let db = Database::open_in_memory().unwrap();
    let service = SampleService::new(SqliteSampleRepository::new(db));
    let ids = names
        .iter()
        .map(|name| {
            let request = SampleRequest {
                name: (*name).to_string(),
                description: None,
                amount: Decimal::new(500, 2),
                translations: vec![Translation {
                    language: "en".to_string(),
                    name: (*name).to_string(),
                    description: None,
                    ordinal: 1,
                }],
            };
            service.create(&request, "seed").unwrap().id
        })
        .collect();
    (service, ids)
}

#[test]
fn list_pages_newest_first_with_total() {
    let (service, ids) = seeded(&["Alpha 1", "Alpha 2", "Beta", "alpha 3", "Alpha 4"]);

    let first = service
        .list(Some("ALPHA"), &PageRequest::new(Some(1), Some(3)))
        .unwrap();
    assert_eq!(first.total, 4);
    assert_eq!(first.page, 1);
    assert_eq!(first.size, 3);
    let first_ids: Vec<i64> = first.data.iter().map(|sample| sample.id).collect();
    assert_eq!(first_ids, vec![ids[4], ids[3], ids[1]]);
    assert!(first.data.iter().all(|sample| sample.translations.is_empty()));

    let second = service
        .list(Some("alpha"), &PageRequest::new(Some(2), Some(3)))
        .unwrap();
    let second_ids: Vec<i64> = second.data.iter().map(|sample| sample.id).collect();
    assert_eq!(second_ids, vec![ids[0]]);
    assert_eq!(second.total, 4);
}

#[test]
fn list_without_query_excludes_deleted_rows() {
    let (service, ids) = seeded(&["One", "Two", "Three"]);
    service.delete("seed", ids[1], 0).unwrap();

    let page = service.list(Some("   "), &PageRequest::default()).unwrap();
    assert_eq!(page.total, 2);
    assert!(page.data.iter().all(|sample| sample.id != ids[1]));
}

#[test]
fn seek_walks_every_row_once() {
    let (service, mut ids) = seeded(&["A", "B", "C", "D", "E"]);
    ids.reverse();

    let mut seen = Vec::new();
    let mut request = SeekRequest::new(Some(2), None, None);
    loop {
        let page = service.seek(None, &request).unwrap();
        assert!(page.data.len() <= 2);
        seen.extend(page.data.iter().map(|sample| sample.id));
        match (page.created_at, page.id) {
            (Some(created_at), Some(id)) => {
                request = SeekRequest::new(Some(2), Some(created_at), Some(id));
            }
            _ => break,
        }
    }

    assert_eq!(seen, ids);
}

#[test]
fn seek_last_page_has_no_cursor() {
    let (service, _ids) = seeded(&["Only"]);
    let page = service
        .seek(Some("only"), &SeekRequest::new(Some(5), None, None))
        .unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.created_at, None);
    assert_eq!(page.id, None);
}
