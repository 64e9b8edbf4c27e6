use std::path::PathBuf;

use rust_slideshow::config::{
    DEFAULT_INTERVAL_MS, FileSettingsStore, MAX_INTERVAL_MS, MIN_INTERVAL_MS, SettingsRecord,
    SettingsStore, SortDirection, SortMode,
};
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let store = FileSettingsStore::new(dir.path().join("nope.json"));
    let settings = store.load();
    assert_eq!(settings, SettingsRecord::default());
    assert_eq!(settings.interval, DEFAULT_INTERVAL_MS);
    assert!(settings.confirm_delete);
    assert!(!settings.skip_non_matching);
    assert_eq!(settings.sort_order, SortMode::Random);
}

#[test]
fn parses_json_settings_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slideshow_config.json");
    std::fs::write(
        &path,
        r#"{
            "source": "/photos/in",
            "favorites": "/photos/fav",
            "sort_order": "alpha",
            "sort_direction": "desc",
            "interval": 2500,
            "skip_non_matching": true
        }"#,
    )
    .unwrap();

    let settings = FileSettingsStore::new(&path).load();
    assert_eq!(settings.source, Some(PathBuf::from("/photos/in")));
    assert_eq!(settings.favorites, Some(PathBuf::from("/photos/fav")));
    assert_eq!(settings.likes, None);
    assert_eq!(settings.sort_order, SortMode::Alphabetical);
    assert_eq!(settings.sort_direction, SortDirection::Descending);
    assert_eq!(settings.interval, 2500);
    assert!(settings.skip_non_matching);
    assert!(settings.confirm_delete, "unset fields keep their defaults");
}

#[test]
fn parses_yaml_settings_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.yaml");
    let yaml = r#"
source: /photos/in
likes: /photos/likes
sort_order: time
confirm_delete: false
info_panel_visible: true
"#;
    std::fs::write(&path, yaml).unwrap();

    let settings = FileSettingsStore::new(&path).load();
    assert_eq!(settings.likes, Some(PathBuf::from("/photos/likes")));
    assert_eq!(settings.sort_order, SortMode::Time);
    assert_eq!(settings.sort_direction, SortDirection::Ascending);
    assert!(!settings.confirm_delete);
    assert!(settings.info_panel_visible);
}

#[test]
fn out_of_range_interval_is_clamped_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");

    std::fs::write(&path, r#"{"interval": 50}"#).unwrap();
    assert_eq!(FileSettingsStore::new(&path).load().interval, MIN_INTERVAL_MS);

    std::fs::write(&path, r#"{"interval": 3600000}"#).unwrap();
    assert_eq!(FileSettingsStore::new(&path).load().interval, MAX_INTERVAL_MS);
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(FileSettingsStore::new(&path).load(), SettingsRecord::default());

    std::fs::write(&path, r#"{"sort_order": "by-size"}"#).unwrap();
    assert_eq!(FileSettingsStore::new(&path).load(), SettingsRecord::default());
}

#[test]
fn save_then_load_preserves_settings() {
    let dir = tempdir().unwrap();
    let settings = SettingsRecord {
        source: Some(PathBuf::from("/photos/in")),
        favorites: Some(PathBuf::from("/photos/fav")),
        likes: None,
        sort_order: SortMode::Alphabetical,
        sort_direction: SortDirection::Descending,
        interval: 12_000,
        confirm_delete: false,
        skip_non_matching: true,
        info_panel_visible: true,
    };

    for name in ["nested/dir/settings.json", "settings.yml"] {
        let store = FileSettingsStore::new(dir.path().join(name));
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings, "{name}");
    }

    let json = std::fs::read_to_string(dir.path().join("nested/dir/settings.json")).unwrap();
    assert!(json.contains("\"sort_order\": \"alpha\""), "{json}");
}
