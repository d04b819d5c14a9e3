use super::*;

#[test]
fn memory_store_round_trips_and_misses() {
    let mut s = MemoryHistoryStore::new();
    assert_eq!(s.get("k").unwrap(), None);
    s.put("k", b"blob".to_vec()).unwrap();
    assert_eq!(s.get("k").unwrap().as_deref(), Some(&b"blob"[..]));
}

#[test]
fn file_store_persists_under_dir() {
    let dir = PathBuf::from("target").join("history_store_unit");
    let _ = std::fs::remove_dir_all(&dir);
    let mut s = FileHistoryStore::new(&dir);

    assert_eq!(s.get("recent").unwrap(), None);
    s.put("recent", b"[]".to_vec()).unwrap();
    assert!(dir.join("recent.json").is_file());

    let reopened = FileHistoryStore::new(&dir);
    assert_eq!(reopened.get("recent").unwrap().as_deref(), Some(&b"[]"[..]));
}

#[test]
fn file_store_rejects_path_like_keys() {
    let mut s = FileHistoryStore::new(PathBuf::from("target").join("history_store_keys"));
    for key in ["", "../escape", "a/b", ".hidden"] {
        assert!(s.put(key, vec![]).is_err(), "{key}");
    }
}
