//! Text reports printed by the trainer.

use std::fmt::Write as _;

use super::TrainerError;
use super::selection::CvResult;
use crate::dataset::ClassRegistry;
use crate::ml::{
    ConfusionMatrix, ModelKind, ModelOptions, PerClassStats, TrainDataset, accuracy, evaluate,
    fit, precision_recall_by_class, stratified_split,
};

/// One line per model: mean and standard deviation of fold accuracy.
pub fn cv_table(results: &[CvResult]) -> String {
    let mut out = String::new();
    for result in results {
        let label = format!("{}:", result.kind.display_name());
        let _ = writeln!(
            out,
            "{label:<16}{:>6.2}% ± {:.2}%",
            result.score.mean() * 100.0,
            result.score.std() * 100.0
        );
    }
    out
}

/// Per-class precision, recall, F1 and support with accuracy and averages.
///
/// Classes that neither occur nor get predicted are left out.
pub fn classification_report(cm: &ConfusionMatrix, classes: &ClassRegistry) -> String {
    let stats = precision_recall_by_class(cm);
    let shown: Vec<usize> = (0..cm.n_classes)
        .filter(|&c| stats[c].support > 0 || (0..cm.n_classes).any(|t| cm.get(t, c) > 0))
        .collect();
    let names: Vec<String> = shown.iter().map(|&c| classes.name(c).into_owned()).collect();
    let width = names
        .iter()
        .map(String::len)
        .chain(std::iter::once("weighted avg".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
        "", "precision", "recall", "f1-score", "support"
    );
    for (&class, name) in shown.iter().zip(names.iter()) {
        let s = &stats[class];
        let _ = writeln!(
            out,
            "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            s.precision, s.recall, s.f1, s.support
        );
    }
    let total: u32 = shown.iter().map(|&c| stats[c].support).sum();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
        "accuracy",
        "",
        "",
        accuracy(cm),
        total
    );
    for (label, avg) in averages(&stats, &shown, total) {
        let _ = writeln!(
            out,
            "{label:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            avg[0], avg[1], avg[2], total
        );
    }
    out
}

/// Macro and support-weighted averages of `[precision, recall, f1]`.
fn averages(stats: &[PerClassStats], shown: &[usize], total: u32) -> [(&'static str, [f32; 3]); 2] {
    let mut macro_avg = [0f32; 3];
    let mut weighted = [0f32; 3];
    for &class in shown {
        let s = &stats[class];
        let values = [s.precision, s.recall, s.f1];
        for i in 0..3 {
            macro_avg[i] += values[i];
            weighted[i] += values[i] * s.support as f32;
        }
    }
    let n = shown.len().max(1) as f32;
    let support = total.max(1) as f32;
    [
        ("macro avg", macro_avg.map(|v| v / n)),
        ("weighted avg", weighted.map(|v| v / support)),
    ]
}

/// Fit each kind on a stratified train split and report on the held-out part.
pub fn detailed_report(
    dataset: &TrainDataset,
    kinds: &[ModelKind],
    options: &ModelOptions,
    classes: &ClassRegistry,
    test_fraction: f32,
    seed: u64,
) -> Result<String, TrainerError> {
    let (train_idx, test_idx) = stratified_split(&dataset.y, test_fraction, seed);
    let train = dataset.subset(&train_idx);
    let test = dataset.subset(&test_idx);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Train/test split: {} / {} samples",
        train.len(),
        test.len()
    );
    for &kind in kinds {
        let _ = writeln!(out, "\n--- {} ---", kind.display_name());
        if test.is_empty() {
            let _ = writeln!(out, "(no held-out samples)");
            continue;
        }
        let model = fit(kind, &train, options)?;
        let cm = evaluate(&model, &test);
        out.push_str(&classification_report(&cm, classes));
    }
    Ok(out)
}
