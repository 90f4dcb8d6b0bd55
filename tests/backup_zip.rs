use lyceed::backup::{self, BUNDLE_FORMAT_V1};
use lyceed::{AppConfig, DataService, Record};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
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

fn service_at(root: &PathBuf) -> DataService {
    DataService::from_config(&AppConfig::default().rooted_at(root))
}

fn record(v: serde_json::Value) -> Record {
    v.as_object().cloned().expect("object")
}

fn seeded_workspace(prefix: &str) -> (PathBuf, DataService) {
    let root = temp_dir(prefix);
    let svc = service_at(&root);
    let eleves = svc.collection("eleves").expect("eleves").clone();
    let profs = svc.collection("professeurs").expect("professeurs").clone();
    svc.create(&eleves, record(json!({ "nom": "Aïcha" }))).expect("create eleve");
    svc.create(&eleves, record(json!({ "nom": "Boris" }))).expect("create eleve");
    svc.create(&profs, record(json!({ "nom": "Ngo", "statut": "actif" })))
        .expect("create prof");
    (root, svc)
}

#[test]
fn zip_export_and_import_roundtrip() {
    let (src_root, src) = seeded_workspace("lycee-backup-src");
    let dst_root = temp_dir("lycee-backup-dst");
    let dst = service_at(&dst_root);
    let out_dir = temp_dir("lycee-backup-out");

    let bundle_path = out_dir.join("lycee.backup.zip");
    let export = backup::export_bundle(&src, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 8);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"], json!(BUNDLE_FORMAT_V1));
    let eleves_entry = manifest["collections"]
        .as_array()
        .expect("collections")
        .iter()
        .find(|c| c["name"] == json!("eleves"))
        .expect("eleves entry")
        .clone();
    assert_eq!(eleves_entry["root"], json!("public"));
    assert_eq!(eleves_entry["records"], json!(2));
    archive
        .by_name("collections/professeurs.json")
        .expect("professeurs entry in bundle");

    let import = backup::import_bundle(&bundle_path, &dst).expect("import bundle");
    assert_eq!(import.bundle_format_detected, BUNDLE_FORMAT_V1);
    assert_eq!(import.collections_restored.len(), 7);

    assert_eq!(
        std::fs::read(dst_root.join("public/eleves.json")).expect("restored eleves"),
        std::fs::read(src_root.join("public/eleves.json")).expect("source eleves")
    );
    let spec = dst.collection("professeurs").expect("professeurs").clone();
    let profs = dst.list(&spec).expect("list restored");
    assert_eq!(profs.len(), 1);
    assert_eq!(profs[0]["nom"], json!("Ngo"));

    let _ = std::fs::remove_dir_all(src_root);
    let _ = std::fs::remove_dir_all(dst_root);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_bundle_is_rejected_without_touching_files() {
    let (src_root, src) = seeded_workspace("lycee-backup-tamper-src");
    let (dst_root, dst) = seeded_workspace("lycee-backup-tamper-dst");
    let out_dir = temp_dir("lycee-backup-tamper-out");

    let bundle_path = out_dir.join("lycee.backup.zip");
    backup::export_bundle(&src, &bundle_path).expect("export bundle");

    // Rebuild the archive with one collection altered but the original manifest.
    let tampered_path = out_dir.join("tampered.zip");
    {
        let mut archive =
            zip::ZipArchive::new(File::open(&bundle_path).expect("open")).expect("zip");
        let mut writer = zip::ZipWriter::new(File::create(&tampered_path).expect("create"));
        let opts = zip::write::FileOptions::default();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).expect("entry");
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).expect("read entry");
            if name == "collections/professeurs.json" {
                bytes = b"[{\"id\":1,\"nom\":\"Intrus\"}]".to_vec();
            }
            writer.start_file(name, opts).expect("start");
            writer.write_all(&bytes).expect("write");
        }
        writer.finish().expect("finish");
    }

    let before = std::fs::read(dst_root.join("public/eleves.json")).expect("read");
    let e = backup::import_bundle(&tampered_path, &dst).expect_err("checksum must fail");
    assert!(format!("{e:#}").contains("checksum mismatch"), "{e:#}");
    assert_eq!(
        std::fs::read(dst_root.join("public/eleves.json")).expect("read"),
        before
    );

    let _ = std::fs::remove_dir_all(src_root);
    let _ = std::fs::remove_dir_all(dst_root);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn foreign_archive_format_is_refused() {
    let root = temp_dir("lycee-backup-foreign");
    let svc = service_at(&root);
    let path = root.join("foreign.zip");
    {
        let mut writer = zip::ZipWriter::new(File::create(&path).expect("create"));
        writer
            .start_file("manifest.json", zip::write::FileOptions::default())
            .expect("start");
        writer
            .write_all(br#"{"format":"autre-format-v2","version":2,"appVersion":"0","exportedAt":"0","collections":[]}"#)
            .expect("write");
        writer.finish().expect("finish");
    }
    let e = backup::import_bundle(&path, &svc).expect_err("format must be refused");
    assert!(format!("{e:#}").contains("unsupported bundle format"));

    let _ = std::fs::remove_dir_all(root);
}
