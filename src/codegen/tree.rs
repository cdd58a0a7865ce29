use std::fmt::Write as _;

use super::{CodegenContext, CodegenError, c_float_literal, section_banner};
use crate::ml::{DecisionTree, RandomForest};

const INDENT: &str = "    ";

/// Nested `if`/`else` body reproducing `tree`, starting at `depth` levels of indentation.
///
/// Internal nodes test `ratios[i] <= threshold` and descend left on true. Leaves return
/// their majority class, followed by the class name as a comment when `label_leaves` is set.
pub fn tree_body(
    tree: &DecisionTree,
    ctx: &CodegenContext,
    depth: usize,
    label_leaves: bool,
) -> Result<String, CodegenError> {
    tree.validate().map_err(CodegenError::MalformedTree)?;
    let mut lines = Vec::with_capacity(tree.nodes.len() * 2);
    emit_node(tree, ctx, 0, depth, label_leaves, &mut lines)?;
    Ok(lines.join("\n"))
}

fn emit_node(
    tree: &DecisionTree,
    ctx: &CodegenContext,
    node_idx: usize,
    depth: usize,
    label_leaves: bool,
    lines: &mut Vec<String>,
) -> Result<(), CodegenError> {
    let indent = INDENT.repeat(depth);
    let node = &tree.nodes[node_idx];
    match node.split {
        Some(split) => {
            if split.feature >= ctx.feature_names.len() {
                return Err(CodegenError::UnknownFeature {
                    node: node_idx,
                    feature: split.feature,
                    available: ctx.feature_names.len(),
                });
            }
            let threshold = c_float_literal(split.threshold, "threshold")?;
            lines.push(format!(
                "{indent}if (ratios[{}] <= {threshold}) {{",
                split.feature
            ));
            emit_node(tree, ctx, split.left, depth + 1, label_leaves, lines)?;
            lines.push(format!("{indent}}} else {{"));
            emit_node(tree, ctx, split.right, depth + 1, label_leaves, lines)?;
            lines.push(format!("{indent}}}"));
        }
        None => {
            let class = node.majority_class();
            if label_leaves {
                lines.push(format!(
                    "{indent}return {class};  // {}",
                    ctx.class_name(class)
                ));
            } else {
                lines.push(format!("{indent}return {class};"));
            }
        }
    }
    Ok(())
}

/// Model file exposing `int classify_dt(float ratios[])`.
pub fn decision_tree_source(
    tree: &DecisionTree,
    ctx: &CodegenContext,
) -> Result<String, CodegenError> {
    let body = tree_body(tree, ctx, 1, true)?;
    let mut code = ctx.header();
    code.push_str(&section_banner("DECISION TREE"));
    code.push_str("int classify_dt(float ratios[]) {\n");
    code.push_str(&body);
    code.push_str("\n}\n");
    Ok(code)
}

/// Model file with one `static int tree_N` per tree and `int classify_rf(float ratios[])`.
///
/// The vote loop only moves the winner on a strictly greater count, so ties go to the
/// lowest class index.
pub fn random_forest_source(
    forest: &RandomForest,
    ctx: &CodegenContext,
) -> Result<String, CodegenError> {
    if forest.trees.is_empty() {
        return Err(CodegenError::MalformedModel(
            "forest has no trees".to_string(),
        ));
    }
    let n_classes = forest.n_classes.max(1);
    let mut code = ctx.header();
    code.push_str(&section_banner(&format!(
        "RANDOM FOREST ({} trees)",
        forest.trees.len()
    )));
    for (idx, tree) in forest.trees.iter().enumerate() {
        let body = tree_body(tree, ctx, 1, false)?;
        let _ = write!(code, "static int tree_{idx}(float ratios[]) {{\n{body}\n}}\n\n");
    }
    let _ = write!(
        code,
        "\nint classify_rf(float ratios[]) {{\n    int votes[{n_classes}] = {{0}};\n\n"
    );
    for idx in 0..forest.trees.len() {
        let _ = writeln!(code, "    votes[tree_{idx}(ratios)]++;");
    }
    let _ = write!(
        code,
        "
    int winner = 0;
    int max_votes = votes[0];
    for (int i = 1; i < {n_classes}; i++) {{
        if (votes[i] > max_votes) {{
            max_votes = votes[i];
            winner = i;
        }}
    }}

    return winner;
}}
"
    );
    Ok(code)
}
