//! Transpiles fitted models into C for the sensor firmware.
//!
//! Trees become nested `if`/`else` blocks over a `float ratios[]` array, forests become one
//! `static` function per tree plus a vote, and the linear SVM becomes constant arrays with a
//! weighted-sum loop. Every float is printed so that it parses back to the identical `f32`.

mod integration;
mod svm;
mod tree;

use std::borrow::Cow;
use std::fmt::Write as _;

use thiserror::Error;

pub use integration::{INTEGRATION_FILE_NAME, integration_source, model_macro};
pub use svm::linear_svm_source;
pub use tree::{decision_tree_source, random_forest_source, tree_body};

use crate::dataset::ClassRegistry;
use crate::ml::TrainedModel;
use crate::sensor::RATIO_FEATURES;

/// Errors raised while emitting C source.
#[derive(Debug, Error, PartialEq)]
pub enum CodegenError {
    /// A split refers to a feature with no name in the supplied list.
    #[error("Node {node} splits on feature {feature}, but only {available} feature names exist")]
    UnknownFeature {
        node: usize,
        feature: usize,
        available: usize,
    },
    #[error("Cannot emit non-finite {what}: {value}")]
    NonFiniteValue { what: String, value: f32 },
    #[error("Malformed tree: {0}")]
    MalformedTree(String),
    #[error("Malformed model: {0}")]
    MalformedModel(String),
}

/// Naming and banner inputs shared by every generated file.
#[derive(Debug, Clone)]
pub struct CodegenContext {
    /// Names of the `ratios[]` slots, in index order.
    pub feature_names: Vec<String>,
    pub classes: ClassRegistry,
    /// Label space size; classes without a registered name print as `CLASS_<id>`.
    pub n_classes: usize,
    pub generated_at: String,
    pub generator: String,
}

impl CodegenContext {
    /// Context over the nine gas-ratio features.
    pub fn new(classes: ClassRegistry, n_classes: usize, generated_at: impl Into<String>) -> Self {
        Self {
            feature_names: RATIO_FEATURES.iter().map(|name| name.to_string()).collect(),
            n_classes: n_classes.max(classes.label_space()),
            classes,
            generated_at: generated_at.into(),
            generator: "enose-train".to_string(),
        }
    }

    pub fn class_name(&self, id: usize) -> Cow<'_, str> {
        self.classes.name(id)
    }

    /// Comment banner placed at the top of every model file.
    pub fn header(&self) -> String {
        let rule = "=".repeat(77);
        let mut out = String::new();
        let _ = writeln!(out, "\n/*");
        let _ = writeln!(out, " * {rule}");
        let _ = writeln!(out, " * AUTO-GENERATED CODE - DO NOT EDIT BY HAND");
        let _ = writeln!(out, " * {rule}");
        let _ = writeln!(out, " * Generated: {}", self.generated_at);
        let _ = writeln!(out, " * Generator: {}", self.generator);
        let _ = writeln!(out, " *");
        let _ = writeln!(out, " * Classes:");
        for id in 0..self.n_classes {
            let _ = writeln!(out, " *   {id} = {}", self.class_name(id));
        }
        let _ = writeln!(out, " * {rule}");
        let _ = writeln!(out, " */");
        out
    }
}

/// Full model file for any supported model family.
pub fn model_source(model: &TrainedModel, ctx: &CodegenContext) -> Result<String, CodegenError> {
    match model {
        TrainedModel::DecisionTree(tree) => decision_tree_source(tree, ctx),
        TrainedModel::RandomForest(forest) => random_forest_source(forest, ctx),
        TrainedModel::LinearSvm(svm) => linear_svm_source(svm, ctx),
    }
}

/// Section divider used between generated blocks.
pub(crate) fn section_banner(title: &str) -> String {
    let rule = format!("// {}", "=".repeat(76));
    format!("\n{rule}\n// {title}\n{rule}\n\n")
}

/// Shortest decimal that parses back to `value`, as a C `float` literal.
pub fn c_float_literal(value: f32, what: &str) -> Result<String, CodegenError> {
    if !value.is_finite() {
        return Err(CodegenError::NonFiniteValue {
            what: what.to_string(),
            value,
        });
    }
    let mut text = value.to_string();
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text.push('f');
    Ok(text)
}

/// Double-quoted C string with `\` and `"` escaped.
pub(crate) fn c_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
