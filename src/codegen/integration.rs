use std::fmt::Write as _;

use super::{CodegenContext, c_string_literal, section_banner};
use crate::ml::ModelKind;
use crate::sensor::{RATIO_FEATURE_COUNT, REFERENCE_CHANNEL};

/// File name of the firmware glue written next to the model files.
pub const INTEGRATION_FILE_NAME: &str = "integration.c";

/// Preprocessor switch selecting a model in the integration file.
pub fn model_macro(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::DecisionTree => "USE_DECISION_TREE",
        ModelKind::RandomForest => "USE_RANDOM_FOREST",
        ModelKind::LinearSvm => "USE_SVM_LINEAR",
    }
}

/// `int classify(float gases[])` wrapper plus `CLASS_NAMES[]`.
///
/// Returns `-1` on a non-positive reference channel. `active` is the only uncommented
/// `#define`.
pub fn integration_source(active: ModelKind, ctx: &CodegenContext) -> String {
    let mut code = ctx.header();
    code.push_str(&section_banner("INTEGRATION CODE FOR MAIN.C"));
    code.push_str("// Pick the model to use (enable ONE):\n");
    for kind in ModelKind::ALL {
        let prefix = if kind == active { "" } else { "// " };
        let _ = writeln!(code, "{prefix}#define {}", model_macro(kind));
    }
    let _ = write!(
        code,
        "
int classify(float gases[]) {{
    float ratios[{RATIO_FEATURE_COUNT}];
    float g100 = gases[{REFERENCE_CHANNEL}];

    if (g100 <= 0) {{
        return -1;
    }}

    for (int i = 0; i < {RATIO_FEATURE_COUNT}; i++) {{
        ratios[i] = gases[i] / g100;
    }}

#ifdef {dt}
    return classify_dt(ratios);
#elif defined({rf})
    return classify_rf(ratios);
#elif defined({svm})
    return classify_svm(ratios);
#else
    #error \"No model selected!\"
#endif
}}

const char* CLASS_NAMES[] = {{
",
        dt = model_macro(ModelKind::DecisionTree),
        rf = model_macro(ModelKind::RandomForest),
        svm = model_macro(ModelKind::LinearSvm),
    );
    for id in 0..ctx.n_classes {
        let _ = writeln!(code, "    {},", c_string_literal(&ctx.class_name(id)));
    }
    code.push_str("};\n");
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ClassRegistry;

    #[test]
    fn only_the_active_model_is_enabled() {
        let classes: ClassRegistry = [(0, "PLANTA"), (1, "AR_NEUTRO")].into_iter().collect();
        let ctx = CodegenContext::new(classes, 2, "2024-05-01 10:00:00");
        let code = integration_source(ModelKind::RandomForest, &ctx);
        assert!(code.contains("\n// #define USE_DECISION_TREE\n"));
        assert!(code.contains("\n#define USE_RANDOM_FOREST\n"));
        assert!(code.contains("\n// #define USE_SVM_LINEAR\n"));
        assert!(code.contains("    float ratios[9];\n    float g100 = gases[9];"));
        assert!(code.contains("        return -1;"));
        assert!(code.contains("#elif defined(USE_RANDOM_FOREST)\n    return classify_rf(ratios);"));
        assert!(code.ends_with("const char* CLASS_NAMES[] = {\n    \"PLANTA\",\n    \"AR_NEUTRO\",\n};\n"));
    }
}
