//! Writing generated C and JSON model snapshots.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::TrainerError;
use crate::codegen::{CodegenContext, INTEGRATION_FILE_NAME, integration_source, model_source};
use crate::ml::{ModelKind, ModelOptions, TrainDataset, TrainedModel, fit};

/// `--export` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// Print the selected model's code.
    #[default]
    Console,
    /// Write the selected model and the integration file.
    File,
    /// Write every applicable model and the integration file.
    All,
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(ExportTarget::Console),
            "file" => Ok(ExportTarget::File),
            "all" => Ok(ExportTarget::All),
            other => Err(format!(
                "unknown export target '{other}', expected console, file or all"
            )),
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportTarget::Console => "console",
            ExportTarget::File => "file",
            ExportTarget::All => "all",
        })
    }
}

impl ExportTarget {
    /// Kinds to retrain on the full dataset and emit.
    pub fn kinds(self, chosen: ModelKind, applicable: &[ModelKind]) -> Vec<ModelKind> {
        match self {
            ExportTarget::All => applicable.to_vec(),
            ExportTarget::Console | ExportTarget::File => vec![chosen],
        }
    }

    pub fn writes_files(self) -> bool {
        !matches!(self, ExportTarget::Console)
    }
}

/// One model refit on the full dataset together with its generated source.
#[derive(Debug, Clone)]
pub struct ExportedModel {
    pub kind: ModelKind,
    pub model: TrainedModel,
    pub source: String,
}

/// `model_<code>.c`.
pub fn model_file_name(kind: ModelKind) -> String {
    format!("model_{}.c", kind.code())
}

/// Refit each kind on all samples and generate its C source.
pub fn build_exports(
    kinds: &[ModelKind],
    dataset: &TrainDataset,
    options: &ModelOptions,
    ctx: &CodegenContext,
) -> Result<Vec<ExportedModel>, TrainerError> {
    let mut exports = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let model = fit(kind, dataset, options)?;
        let source = model_source(&model, ctx)?;
        exports.push(ExportedModel {
            kind,
            model,
            source,
        });
    }
    Ok(exports)
}

/// Write every model file plus `integration.c` (with `active` enabled) into `dir`.
pub fn write_sources(
    exports: &[ExportedModel],
    active: ModelKind,
    ctx: &CodegenContext,
    dir: &Path,
) -> Result<Vec<PathBuf>, TrainerError> {
    std::fs::create_dir_all(dir).map_err(|source| TrainerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(exports.len() + 1);
    for export in exports {
        let path = dir.join(model_file_name(export.kind));
        write_text(&path, &export.source)?;
        written.push(path);
    }
    let path = dir.join(INTEGRATION_FILE_NAME);
    write_text(&path, &integration_source(active, ctx))?;
    written.push(path);
    Ok(written)
}

#[derive(Serialize)]
struct ModelSnapshot<'a> {
    generated_at: &'a str,
    feature_names: &'a [String],
    class_names: Vec<String>,
    models: Vec<&'a TrainedModel>,
}

/// Pretty JSON with the fitted parameters of every exported model.
pub fn write_model_json(
    exports: &[ExportedModel],
    ctx: &CodegenContext,
    path: &Path,
) -> Result<(), TrainerError> {
    let snapshot = ModelSnapshot {
        generated_at: &ctx.generated_at,
        feature_names: &ctx.feature_names,
        class_names: ctx.classes.dense_names(ctx.n_classes),
        models: exports.iter().map(|export| &export.model).collect(),
    };
    let json = serde_json::to_string_pretty(&snapshot).map_err(|source| TrainerError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| TrainerError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_text(path, &json)
}

fn write_text(path: &Path, text: &str) -> Result<(), TrainerError> {
    std::fs::write(path, text).map_err(|source| TrainerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ClassRegistry;
    use tempfile::tempdir;

    fn dataset() -> TrainDataset {
        TrainDataset {
            n_classes: 2,
            x: (0..20)
                .map(|i| (0..9).map(|f| (i * (f + 1)) as f32 * 0.1).collect())
                .collect(),
            y: (0..20).map(|i| usize::from(i >= 10)).collect(),
        }
    }

    fn ctx() -> CodegenContext {
        let classes: ClassRegistry = [(0, "PLANTA"), (1, "AR_NEUTRO")].into_iter().collect();
        CodegenContext::new(classes, 2, "2024-05-01 10:00:00")
    }

    #[test]
    fn export_target_selects_kinds() {
        let applicable = ModelKind::ALL.to_vec();
        assert_eq!(
            ExportTarget::File.kinds(ModelKind::RandomForest, &applicable),
            vec![ModelKind::RandomForest]
        );
        assert_eq!(
            ExportTarget::All.kinds(ModelKind::RandomForest, &applicable),
            applicable
        );
        assert!(!ExportTarget::Console.writes_files());
        assert_eq!("ALL".parse::<ExportTarget>().unwrap(), ExportTarget::All);
        assert!("disk".parse::<ExportTarget>().is_err());
    }

    #[test]
    fn writes_model_files_integration_and_json() {
        let dir = tempdir().unwrap();
        let ctx = ctx();
        let exports =
            build_exports(&ModelKind::ALL, &dataset(), &ModelOptions::default(), &ctx).unwrap();
        let written = write_sources(&exports, ModelKind::LinearSvm, &ctx, dir.path()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["model_dt.c", "model_rf.c", "model_svm.c", "integration.c"]
        );
        let integration = std::fs::read_to_string(dir.path().join("integration.c")).unwrap();
        assert!(integration.contains("\n#define USE_SVM_LINEAR\n"));

        let json_path = dir.path().join("snap").join("models.json");
        write_model_json(&exports, &ctx, &json_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["models"].as_array().unwrap().len(), 3);
        assert_eq!(value["models"][0]["kind"], "decision_tree");
        assert_eq!(value["class_names"][1], "AR_NEUTRO");
    }
}
