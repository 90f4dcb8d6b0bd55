use lyceed::collections::NOTES;
use lyceed::store::next_id;
use lyceed::{AppConfig, DataService, Record, WriteAccess};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

static SEQ: AtomicUsize = AtomicUsize::new(0);

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn service_at(root: &PathBuf, write_access: WriteAccess) -> DataService {
    let config = AppConfig {
        write_access,
        ..AppConfig::default()
    }
    .rooted_at(root);
    DataService::from_config(&config)
}

fn record(v: serde_json::Value) -> Record {
    v.as_object().cloned().expect("object")
}

#[test]
fn serialized_writes_never_collide_on_ids() {
    let root = temp_dir("lycee-access-serialized");
    let svc = Arc::new(service_at(&root, WriteAccess::Serialized));
    assert_eq!(svc.store().access(), WriteAccess::Serialized);

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let svc = svc.clone();
            std::thread::spawn(move || {
                let spec = svc.collection(NOTES).expect("notes").clone();
                for i in 0..5 {
                    svc.create(&spec, record(json!({ "thread": t, "i": i })))
                        .expect("create");
                }
            })
        })
        .collect();
    for t in threads {
        t.join().expect("join writer");
    }

    let spec = svc.collection(NOTES).expect("notes").clone();
    let all = svc.list(&spec).expect("list");
    assert_eq!(all.len(), 40);
    let ids: BTreeSet<i64> = all.iter().filter_map(|r| r["id"].as_i64()).collect();
    assert_eq!(ids, (1..=40).collect::<BTreeSet<i64>>());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unsynchronized_sequential_writes_still_allocate_in_order() {
    let root = temp_dir("lycee-access-legacy");
    let svc = service_at(&root, WriteAccess::Unsynchronized);
    assert_eq!(svc.store().access(), WriteAccess::Unsynchronized);
    let spec = svc.collection(NOTES).expect("notes").clone();

    for i in 0..5 {
        let created = svc.create(&spec, record(json!({ "i": i }))).expect("create");
        assert_eq!(created.record["id"], json!(i + 1));
    }

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn interleaved_snapshots_lose_the_first_write() {
    // Two writers read the same snapshot; the later save wins.
    let root = temp_dir("lycee-access-lost-update");
    let svc = service_at(&root, WriteAccess::Unsynchronized);
    let store = svc.store();

    let mut first = store.load(NOTES).expect("load first");
    let mut second = store.load(NOTES).expect("load second");
    let id_a = next_id(&first).expect("id");
    let id_b = next_id(&second).expect("id");
    assert_eq!(id_a, id_b, "both writers allocate from the same snapshot");

    first.push(record(json!({ "id": id_a, "by": "a" })));
    second.push(record(json!({ "id": id_b, "by": "b" })));
    store.save(NOTES, &first).expect("save first");
    store.save(NOTES, &second).expect("save second");

    let stored = store.load(NOTES).expect("reload");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["by"], json!("b"));

    let _ = std::fs::remove_dir_all(root);
}
