//! Where training CSVs come from and how file-name wildcards expand.

use std::path::{Path, PathBuf};

use regex::Regex;

use super::DatasetError;
use crate::config::{ClassSource, TrainerSettings};

/// Configured input layout.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Files and wildcard patterns per class label.
    PerClass(Vec<ClassSource>),
    /// One CSV whose `classe` column holds the label text.
    SingleFile(PathBuf),
}

impl DataSource {
    pub fn from_settings(settings: &TrainerSettings) -> Self {
        match &settings.single_file {
            Some(path) => DataSource::SingleFile(path.clone()),
            None => DataSource::PerClass(settings.classes.clone()),
        }
    }
}

/// Expand a pattern whose file-name component may contain `*` and `?`.
///
/// Directories are taken literally. Matches are returned sorted; a missing directory
/// matches nothing.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let path = Path::new(pattern);
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Ok(Vec::new());
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !name.contains(['*', '?']) {
        return Ok(if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    let matcher = wildcard_regex(name).map_err(|source| DatasetError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(DatasetError::Io { path: dir, source }),
    };
    let mut matches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|file_name| matcher.is_match(file_name))
        })
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    Ok(matches)
}

fn wildcard_regex(name: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(name.len() + 8);
    pattern.push('^');
    for ch in name.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}
