use std::fs;

use tempfile::tempdir;
use typur::config::{Preferences, HISTORY_KEY, SETTINGS_KEY};
use typur::store::{FileKvStore, KvStore};

// Settings and history written by one run are what the next run starts with.
#[test]
fn preferences_survive_a_restart() {
    let dir = tempdir().unwrap();

    let mut prefs = Preferences::load(Box::new(FileKvStore::with_dir(dir.path())));
    prefs.update_settings(|s| s.hard_mode = true).unwrap();
    for cpm in [100.0, 110.0, 120.0, 130.0, 140.0, 150.0] {
        prefs.record(cpm).unwrap();
    }

    let reloaded = Preferences::load(Box::new(FileKvStore::with_dir(dir.path())));
    assert!(reloaded.settings().hard_mode);
    assert!(reloaded.settings().show_time);
    assert_eq!(
        reloaded.history().values().collect::<Vec<_>>(),
        vec![110.0, 120.0, 130.0, 140.0, 150.0]
    );
}

#[test]
fn files_are_plain_json_per_key() {
    let dir = tempdir().unwrap();
    let mut prefs = Preferences::load(Box::new(FileKvStore::with_dir(dir.path())));
    prefs.record(98.5).unwrap();
    prefs.update_settings(|s| s.show_time = false).unwrap();

    let history = fs::read_to_string(dir.path().join(format!("{HISTORY_KEY}.json"))).unwrap();
    assert_eq!(history, "[98.5]");

    let settings = fs::read_to_string(dir.path().join(format!("{SETTINGS_KEY}.json"))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&settings).unwrap();
    assert_eq!(value["showTime"], serde_json::json!(false));
    assert_eq!(value["hardMode"], serde_json::json!(false));

    // no temp files left behind
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn corrupt_files_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let store = FileKvStore::with_dir(dir.path());
    store.set(SETTINGS_KEY, "{not json").unwrap();
    store.set(HISTORY_KEY, "\"nope\"").unwrap();

    let prefs = Preferences::load(Box::new(store));
    assert!(!prefs.settings().hard_mode);
    assert!(prefs.settings().show_time);
    assert!(prefs.history().is_empty());
}

#[test]
fn missing_directory_is_created_on_first_write() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("state").join("typur");
    let mut prefs = Preferences::load(Box::new(FileKvStore::with_dir(&nested)));
    assert!(prefs.history().is_empty());

    prefs.record(200.0).unwrap();
    assert!(nested.join(format!("{HISTORY_KEY}.json")).exists());
}
