//! Tiny evaluator for the C subset the code generator emits.

/// Parsed body of a generated tree function.
#[derive(Debug)]
pub enum TreeExpr {
    Branch {
        feature: usize,
        threshold: f32,
        left: Box<TreeExpr>,
        right: Box<TreeExpr>,
    },
    Return(usize),
}

impl TreeExpr {
    pub fn eval(&self, ratios: &[f32]) -> usize {
        match self {
            TreeExpr::Branch {
                feature,
                threshold,
                left,
                right,
            } => {
                if ratios[*feature] <= *threshold {
                    left.eval(ratios)
                } else {
                    right.eval(ratios)
                }
            }
            TreeExpr::Return(class) => *class,
        }
    }
}

/// Parse a C float literal such as `0.25f` or `-1.5e-7f`.
pub fn parse_float(literal: &str) -> f32 {
    let trimmed = literal.trim().trim_end_matches(';');
    trimmed
        .strip_suffix('f')
        .unwrap_or(trimmed)
        .parse()
        .unwrap_or_else(|err| panic!("bad float literal {literal:?}: {err}"))
}

/// Lines of the function whose signature line starts with `signature`, up to its closing brace.
pub fn function_body<'a>(source: &'a str, signature: &str) -> Vec<&'a str> {
    let mut lines = source.lines();
    lines
        .by_ref()
        .find(|line| line.starts_with(signature))
        .unwrap_or_else(|| panic!("function {signature:?} not found"));
    lines.take_while(|line| *line != "}").collect()
}

/// Parse the nested `if`/`else` body of a tree function.
pub fn parse_tree(body: &[&str]) -> TreeExpr {
    let lines: Vec<&str> = body
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    let (expr, consumed) = parse_node(&lines, 0);
    assert_eq!(consumed, lines.len(), "trailing lines after tree body");
    expr
}

fn parse_node(lines: &[&str], pos: usize) -> (TreeExpr, usize) {
    let line = lines[pos];
    if let Some(rest) = line.strip_prefix("return ") {
        let value = rest.split(';').next().unwrap_or_default();
        return (TreeExpr::Return(value.trim().parse().unwrap()), pos + 1);
    }
    let rest = line
        .strip_prefix("if (ratios[")
        .unwrap_or_else(|| panic!("unexpected line {line:?}"));
    let (feature, rest) = rest.split_once("] <= ").unwrap();
    let threshold = rest.strip_suffix(") {").unwrap();
    let (left, pos) = parse_node(lines, pos + 1);
    assert_eq!(lines[pos], "} else {");
    let (right, pos) = parse_node(lines, pos + 1);
    assert_eq!(lines[pos], "}");
    (
        TreeExpr::Branch {
            feature: feature.parse().unwrap(),
            threshold: parse_float(threshold),
            left: Box::new(left),
            right: Box::new(right),
        },
        pos + 1,
    )
}

/// `classify_dt` from a decision tree model file.
pub fn decision_tree(source: &str) -> TreeExpr {
    parse_tree(&function_body(source, "int classify_dt(float ratios[]) {"))
}

/// Per-tree functions plus the vote array size from a random forest model file.
pub struct ForestProgram {
    pub trees: Vec<TreeExpr>,
    pub n_classes: usize,
}

impl ForestProgram {
    pub fn parse(source: &str) -> Self {
        let mut trees = Vec::new();
        while source.contains(&format!("static int tree_{}(", trees.len())) {
            let signature = format!("static int tree_{}(float ratios[]) {{", trees.len());
            trees.push(parse_tree(&function_body(source, &signature)));
        }
        let votes = source
            .split("int votes[")
            .nth(1)
            .and_then(|rest| rest.split(']').next())
            .expect("votes array");
        Self {
            trees,
            n_classes: votes.parse().unwrap(),
        }
    }

    /// Same vote loop as `classify_rf`: ties keep the lowest class.
    pub fn eval(&self, ratios: &[f32]) -> usize {
        let mut votes = vec![0u32; self.n_classes];
        for tree in &self.trees {
            votes[tree.eval(ratios)] += 1;
        }
        let mut winner = 0;
        let mut max_votes = votes[0];
        for (i, &count) in votes.iter().enumerate().skip(1) {
            if count > max_votes {
                max_votes = count;
                winner = i;
            }
        }
        winner
    }
}

/// Constants and branch labels from a linear SVM model file.
pub struct SvmProgram {
    pub weights: Vec<f32>,
    pub bias: f32,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub positive: usize,
    pub negative: usize,
}

impl SvmProgram {
    pub fn parse(source: &str) -> Self {
        let ternary = source
            .split("return (sum > 0.0f) ? ")
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .expect("classify_svm ternary");
        let (positive, negative) = ternary.split_once(" : ").unwrap();
        let bias = source
            .split("static const float svm_bias = ")
            .nth(1)
            .and_then(|rest| rest.split(';').next())
            .expect("svm_bias");
        Self {
            weights: float_array(source, "svm_weights"),
            bias: parse_float(bias),
            mean: float_array(source, "scaler_mean"),
            std: float_array(source, "scaler_std"),
            positive: positive.trim().parse().unwrap(),
            negative: negative.trim().parse().unwrap(),
        }
    }

    /// `svm_confidence`, accumulated in `f32` in index order.
    pub fn confidence(&self, ratios: &[f32]) -> f32 {
        let mut sum = self.bias;
        for i in 0..self.weights.len() {
            let x_norm = (ratios[i] - self.mean[i]) / self.std[i];
            sum += self.weights[i] * x_norm;
        }
        sum
    }

    pub fn classify(&self, ratios: &[f32]) -> usize {
        if self.confidence(ratios) > 0.0 {
            self.positive
        } else {
            self.negative
        }
    }
}

fn float_array(source: &str, name: &str) -> Vec<f32> {
    let start = format!("static const float {name}[");
    let rest = source
        .split(start.as_str())
        .nth(1)
        .unwrap_or_else(|| panic!("array {name} not found"));
    let open = rest.find('{').unwrap();
    let close = rest.find("};").unwrap();
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_float)
        .collect()
}

/// The `classify(float gases[])` prologue: `None` where the C code returns `-1`, otherwise
/// the ratios it passes on to the model.
pub fn integration_ratios(source: &str, gases: &[f32]) -> Option<Vec<f32>> {
    let body = function_body(source, "int classify(float gases[]) {");
    let decl = |prefix: &str| -> usize {
        body.iter()
            .find_map(|line| line.trim().strip_prefix(prefix))
            .and_then(|rest| rest.split(']').next())
            .unwrap_or_else(|| panic!("{prefix:?} not found"))
            .parse()
            .unwrap()
    };
    let n_ratios = decl("float ratios[");
    let reference = decl("float g100 = gases[");
    assert!(body.iter().any(|line| line.trim() == "if (g100 <= 0) {"));
    let g100 = gases[reference];
    if g100 <= 0.0 {
        return None;
    }
    Some(gases[..n_ratios].iter().map(|gas| gas / g100).collect())
}
