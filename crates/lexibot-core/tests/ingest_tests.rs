use lexibot_core::ingest::{load_chunks, write_chunks, DocumentProcessor};
use lexibot_core::types::Chunk;
use tempfile::TempDir;

#[test]
fn empty_raw_directory_yields_zero_chunks() {
    let tmp = TempDir::new().unwrap();
    let processor = DocumentProcessor::new();
    let chunks = processor.process_directory(tmp.path()).expect("process");
    assert!(chunks.is_empty());
}

#[test]
fn non_pdf_files_are_ignored() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "not a statute").unwrap();
    let chunks = DocumentProcessor::new().process_directory(tmp.path()).expect("process");
    assert!(chunks.is_empty());
}

#[test]
fn chunk_collection_round_trips_through_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("processed/legal_chunks.json");
    let chunks = vec![
        Chunk::new("Employees are entitled to annual leave.", "employment_act_1955"),
        Chunk::new("Overtime pay is regulated by Part XII.", "employment_act_1955"),
    ];

    write_chunks(&chunks, &path).expect("write");
    let loaded = load_chunks(&path).expect("load");
    assert_eq!(loaded, chunks);

    // No temp file left behind after the atomic rename.
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn zero_chunk_collection_is_still_a_valid_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("legal_chunks.json");
    write_chunks(&[], &path).expect("write");
    let loaded = load_chunks(&path).expect("load");
    assert!(loaded.is_empty());
}

#[test]
fn chunk_serialization_uses_content_and_source_keys() {
    let chunk = Chunk::new("some text", "act");
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json, serde_json::json!({ "content": "some text", "source": "act" }));
}
