//! End-to-end training run: load, cross-validate, select, export, report.

pub mod export;
pub mod report;
pub mod selection;

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

pub use export::{
    ExportTarget, ExportedModel, build_exports, model_file_name, write_model_json, write_sources,
};
pub use report::{classification_report, cv_table, detailed_report};
pub use selection::{CvResult, ModelChoice, applicable_models, evaluate_models, select_model};

use crate::codegen::{CodegenContext, CodegenError};
use crate::config::TrainerSettings;
use crate::dataset::{self, DataSource, DatasetError, GasDataset};
use crate::ml::{ModelKind, TrainError};

/// Errors that end a training run.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error("{} is unavailable: {reason}", kind.display_name())]
    ModelUnavailable { kind: ModelKind, reason: String },
    #[error("No model could be evaluated")]
    NoModels,
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize models to {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write console output: {0}")]
    Console(std::io::Error),
}

/// Command-line choices for one run.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub model: ModelChoice,
    pub export: ExportTarget,
    pub report: bool,
    pub model_json: Option<PathBuf>,
    /// Banner timestamp for generated files.
    pub generated_at: String,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub chosen: ModelKind,
    pub results: Vec<CvResult>,
    pub exports: Vec<ExportedModel>,
    pub written: Vec<PathBuf>,
}

/// Load the configured data and run the pipeline.
pub fn run(
    settings: &TrainerSettings,
    request: &TrainRequest,
    out: &mut dyn Write,
) -> Result<TrainOutcome, TrainerError> {
    let dataset = dataset::load(&DataSource::from_settings(settings))?;
    run_on_dataset(&dataset, settings, request, out)
}

/// The pipeline on an already loaded dataset; progress text goes to `out`.
pub fn run_on_dataset(
    data: &GasDataset,
    settings: &TrainerSettings,
    request: &TrainRequest,
    out: &mut dyn Write,
) -> Result<TrainOutcome, TrainerError> {
    let summary = data.summary();
    say(out, &format!("\nDATA SUMMARY\n{summary}\n"))?;
    if let Some(ratio) = summary.imbalance_advisory() {
        say(
            out,
            &format!(
                "\nWARNING: classes are imbalanced ({ratio:.1}:1); consider collecting more samples of the minority class\n"
            ),
        )?;
    }

    let train = data.to_train_dataset();
    let options = settings.model_options();
    say(
        out,
        &format!(
            "\nMODEL EVALUATION ({}-fold cross-validation)\n",
            settings.cv_folds
        ),
    )?;
    let results = evaluate_models(&train, settings.cv_folds, &options)?;
    say(out, &cv_table(&results))?;
    let applicable: Vec<ModelKind> = results.iter().map(|result| result.kind).collect();
    if !applicable.contains(&ModelKind::LinearSvm) {
        say(
            out,
            "SVM Linear skipped: it needs exactly two classes in the data\n",
        )?;
    }

    let chosen = select_model(request.model, &results)?;
    say(out, &format!("\nSelected model: {}\n", chosen.display_name()))?;

    let ctx = CodegenContext::new(
        data.classes.clone(),
        data.n_classes(),
        request.generated_at.clone(),
    );
    let exports = build_exports(
        &request.export.kinds(chosen, &applicable),
        &train,
        &options,
        &ctx,
    )?;
    let written = if request.export.writes_files() {
        write_sources(&exports, chosen, &ctx, &settings.output_dir)?
    } else {
        for export in &exports {
            say(out, &export.source)?;
        }
        Vec::new()
    };
    for path in &written {
        say(out, &format!("Saved {}\n", path.display()))?;
    }
    if let Some(path) = &request.model_json {
        write_model_json(&exports, &ctx, path)?;
        say(out, &format!("Saved {}\n", path.display()))?;
    }

    if request.report {
        let report = detailed_report(
            &train,
            &applicable,
            &options,
            &data.classes,
            settings.test_fraction,
            settings.split_seed,
        )?;
        say(out, &format!("\nDETAILED REPORT\n{report}"))?;
    }

    Ok(TrainOutcome {
        chosen,
        results,
        exports,
        written,
    })
}

fn say(out: &mut dyn Write, text: &str) -> Result<(), TrainerError> {
    out.write_all(text.as_bytes()).map_err(TrainerError::Console)
}
