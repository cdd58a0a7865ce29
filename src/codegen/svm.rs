use std::fmt::Write as _;

use super::{CodegenContext, CodegenError, c_float_literal, section_banner};
use crate::ml::LinearSvm;

/// Model file with the weight, bias and scaler constants plus `classify_svm` and
/// `svm_confidence`.
///
/// The sum starts at the bias and adds `w[i] * ((x[i] - mean[i]) / std[i])` in index order,
/// matching [`LinearSvm::decision_function`].
pub fn linear_svm_source(svm: &LinearSvm, ctx: &CodegenContext) -> Result<String, CodegenError> {
    svm.validate().map_err(CodegenError::MalformedModel)?;
    let n = svm.n_features();
    if n == 0 {
        return Err(CodegenError::MalformedModel(
            "SVM has no weights".to_string(),
        ));
    }
    if n > ctx.feature_names.len() {
        return Err(CodegenError::UnknownFeature {
            node: 0,
            feature: n - 1,
            available: ctx.feature_names.len(),
        });
    }
    let weights = float_list(&svm.weights, "weight")?;
    let mean = float_list(&svm.scaler.mean, "scaler mean")?;
    let scale = float_list(&svm.scaler.scale, "scaler scale")?;
    let bias = c_float_literal(svm.bias, "bias")?;
    let positive = svm.positive_class;
    let negative = svm.negative_class;

    let mut code = ctx.header();
    code.push_str(&section_banner("SVM LINEAR"));
    let _ = write!(
        code,
        "// classify_svm returns {positive} ({}) when the sum is positive, else {negative} ({}).

static const float svm_weights[{n}] = {{
    {weights}
}};

static const float svm_bias = {bias};

static const float scaler_mean[{n}] = {{
    {mean}
}};

static const float scaler_std[{n}] = {{
    {scale}
}};

int classify_svm(float ratios[]) {{
    float sum = svm_bias;

    for (int i = 0; i < {n}; i++) {{
        float x_norm = (ratios[i] - scaler_mean[i]) / scaler_std[i];
        sum += svm_weights[i] * x_norm;
    }}

    return (sum > 0.0f) ? {positive} : {negative};
}}

float svm_confidence(float ratios[]) {{
    float sum = svm_bias;
    for (int i = 0; i < {n}; i++) {{
        float x_norm = (ratios[i] - scaler_mean[i]) / scaler_std[i];
        sum += svm_weights[i] * x_norm;
    }}
    return sum;
}}
",
        ctx.class_name(positive),
        ctx.class_name(negative),
    );
    Ok(code)
}

fn float_list(values: &[f32], what: &str) -> Result<String, CodegenError> {
    let literals = values
        .iter()
        .map(|&v| c_float_literal(v, what))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(literals.join(", "))
}
