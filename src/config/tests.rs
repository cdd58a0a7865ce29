use std::path::{Path, PathBuf};

use super::load::parse_str;
use super::save::save_to_path;
use super::*;
use crate::ml::ModelKind;
use crate::sensor::LineLayout;
use tempfile::tempdir;

#[test]
fn defaults_match_documented_values() {
    let cfg = EnoseConfig::default();
    assert_eq!(cfg.serial.baud_rate, 115_200);
    assert_eq!(cfg.trainer.cv_folds, 5);
    assert_eq!(cfg.trainer.decision_tree.max_depth, 5);
    assert_eq!(cfg.trainer.random_forest.n_estimators, 5);
    assert_eq!(cfg.trainer.random_forest.max_depth, 4);
    assert_eq!(cfg.trainer.random_forest.seed, 42);
    assert_eq!(cfg.trainer.svm.c, 1.0);
    assert_eq!(cfg.trainer.classes.len(), 2);
    assert_eq!(cfg.trainer.classes[1].name, "AR_NEUTRO");
    assert_eq!(cfg.dashboard.line_layout, LineLayout::Indexed);
    assert_eq!(cfg.dashboard.window, 100);
}

#[test]
fn round_trips_through_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
    let mut cfg = EnoseConfig::default();
    cfg.serial.port = "/dev/ttyACM1".to_string();
    cfg.trainer.random_forest.n_estimators = 9;
    cfg.trainer.single_file = Some(PathBuf::from("all.csv"));
    cfg.dashboard.line_layout = LineLayout::Plain;
    save_to_path(&cfg, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed = parse_str(&text, &path).unwrap();
    assert_eq!(parsed, cfg);
}

#[test]
fn partial_file_fills_in_defaults_and_resolves_paths() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("enose.toml");
    std::fs::write(
        &path,
        r#"
[serial]
port = "COM7"

[trainer]
cv_folds = 3

[[trainer.classes]]
id = 1
name = "COFFEE"
patterns = ["data/coffee_*.csv"]

[[trainer.classes]]
id = 0
name = "TEA"
files = ["data/tea.csv", "/abs/tea2.csv"]

[trainer.svm]
c = 0.5
"#,
    )
    .unwrap();
    let cfg = load_or_default(Some(&path)).unwrap();
    assert_eq!(cfg.serial.port, "COM7");
    assert_eq!(cfg.serial.baud_rate, 115_200);
    assert_eq!(cfg.trainer.cv_folds, 3);
    assert_eq!(cfg.trainer.svm.c, 0.5);
    assert_eq!(cfg.trainer.svm.seed, 42);
    assert_eq!(cfg.trainer.classes[0].name, "TEA");
    assert_eq!(cfg.trainer.classes[0].files[0], dir.path().join("data/tea.csv"));
    assert_eq!(cfg.trainer.classes[0].files[1], Path::new("/abs/tea2.csv"));
    assert_eq!(
        Path::new(&cfg.trainer.classes[1].patterns[0]),
        dir.path().join("data/coffee_*.csv")
    );
    assert_eq!(cfg.collector.data_dir, dir.path().join("data"));
    assert_eq!(cfg.trainer.model_options().svm.c, 0.5);
    assert!(ModelKind::LinearSvm.supports_classes(cfg.trainer.classes.len()));
}

#[test]
fn duplicate_class_ids_are_rejected() {
    let text = r#"
[[trainer.classes]]
id = 0
name = "A"

[[trainer.classes]]
id = 0
name = "B"
"#;
    let err = parse_str(text, Path::new("dup.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateClass { id: 0, .. }));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_or_default(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn missing_default_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let _guard = crate::app_dirs::ConfigBaseGuard::set(dir.path().to_path_buf());
    let cfg = load_or_default(None).unwrap();
    assert_eq!(cfg, EnoseConfig::default());
    assert_eq!(
        config_path().unwrap(),
        dir.path().join(crate::app_dirs::APP_DIR_NAME).join(CONFIG_FILE_NAME)
    );
}

#[test]
fn window_and_fraction_are_clamped() {
    let text = "[trainer]\ntest_fraction = 3.0\n[dashboard]\nwindow = 0\n";
    let cfg = parse_str(text, Path::new("c.toml")).unwrap();
    assert_eq!(cfg.trainer.test_fraction, 0.9);
    assert_eq!(cfg.dashboard.window, 1);
}
