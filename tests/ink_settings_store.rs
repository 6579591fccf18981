use tablet_ink::draw::settings::InkSettings;
use tablet_ink::draw::settings_store::{load_from_path, load_or_default, save_to_path, SETTINGS_FILE_NAME};
use tablet_ink::draw::{AnnotationCanvas, Color};
use tempfile::tempdir;

#[test]
fn saved_settings_drive_a_new_canvas() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE_NAME);
    let mut settings = InkSettings {
        stroke_width: 8.0,
        smoothing_level: 5,
        ..InkSettings::default()
    };
    assert!(settings.set_preset_color(3, Color::YELLOW));
    save_to_path(&path, &settings).unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded, settings);
    let mut canvas = AnnotationCanvas::new(loaded);
    assert_eq!(canvas.router().smoothing_level(), 5);
    assert!(canvas.select_preset(3));
    assert_eq!(canvas.router().tool().color, Color::YELLOW);
}

#[test]
fn out_of_range_values_on_disk_are_sanitized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE_NAME);
    std::fs::write(&path, r#"{"stroke_width": 5000.0, "smoothing_level": 40}"#).unwrap();
    let loaded = load_or_default(&path);
    assert_eq!(loaded.stroke_width, 100.0);
    assert_eq!(loaded.smoothing_level, 10);
}
