use std::path::PathBuf;

use super::types::ClassSource;

pub(super) const MAX_WINDOW_LEN: usize = 10_000;

pub(super) fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

pub(super) fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

pub(super) fn default_cv_folds() -> usize {
    5
}

pub(super) fn default_test_fraction() -> f32 {
    0.2
}

pub(super) fn default_split_seed() -> u64 {
    42
}

pub(super) fn default_classes() -> Vec<ClassSource> {
    vec![
        ClassSource {
            id: 0,
            name: "PLANTA".to_string(),
            files: vec![
                PathBuf::from("data/planta.csv"),
                PathBuf::from("data/planta2.csv"),
            ],
            patterns: Vec::new(),
        },
        ClassSource {
            id: 1,
            name: "AR_NEUTRO".to_string(),
            files: vec![
                PathBuf::from("data/ar_neutro.csv"),
                PathBuf::from("data/ar_neutro2.csv"),
            ],
            patterns: Vec::new(),
        },
    ]
}

pub(super) fn default_window() -> usize {
    100
}

pub(super) fn default_poll_interval_ms() -> u64 {
    50
}

pub(super) fn default_read_timeout_ms() -> u64 {
    100
}

pub(super) fn default_table_rows() -> usize {
    5
}

pub(super) fn clamp_window(window: usize) -> usize {
    window.clamp(1, MAX_WINDOW_LEN)
}

pub(super) fn clamp_test_fraction(fraction: f32) -> f32 {
    if fraction.is_finite() {
        fraction.clamp(0.0, 0.9)
    } else {
        default_test_fraction()
    }
}
